//! AI event suggestions.
//!
//! The engine itself lives outside this crate. Here are the request and
//! response shapes, the engine trait, and the parsing and validation applied to
//! whatever text a model returns.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// An upcoming event as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    /// Event name
    pub event_name: String,
    /// Event description
    pub event_description: String,
    /// Category name
    pub event_category: String,
    /// ISO-8601 date
    pub event_date: String,
    /// Location
    pub event_location: String,
    /// Skills the event needs
    #[serde(default)]
    pub required_skills: Vec<String>,
}

impl From<&Event> for UpcomingEvent {
    fn from(event: &Event) -> Self {
        Self {
            event_name: event.name.clone(),
            event_description: event.description.clone(),
            event_category: event.category.to_string(),
            event_date: event.date.to_rfc3339(),
            event_location: event.location.clone(),
            required_skills: event.required_skills.clone(),
        }
    }
}

/// What the engine knows about the volunteer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// Volunteer skills
    pub volunteer_skills: Vec<String>,
    /// Volunteer interests
    pub volunteer_interests: Vec<String>,
    /// Candidate events
    pub upcoming_events: Vec<UpcomingEvent>,
}

/// One suggested event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// The suggested event
    #[serde(flatten)]
    pub event: UpcomingEvent,
    /// How well the event fits, in `[0, 1]`
    pub relevance_score: f64,
    /// Why the score was given
    pub reasoning: String,
}

/// Errors produced while getting suggestions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SuggestionError {
    /// No engine is configured.
    #[error("AI suggestions are not configured")]
    Unavailable,

    /// The upstream provider failed.
    #[error("Suggestion provider error: {0}")]
    Provider(String),

    /// The provider answered with something that does not fit the schema.
    #[error("Invalid suggestion response: {0}")]
    InvalidResponse(String),
}

/// Produces suggestions for a volunteer.
///
/// Returns a boxed future so the engine can be held as `Arc<dyn SuggestionEngine>`.
pub trait SuggestionEngine: Send + Sync {
    /// Rank the upcoming events for this volunteer.
    ///
    /// # Errors
    ///
    /// See [`SuggestionError`].
    fn suggest(
        &self,
        request: SuggestionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Suggestion>, SuggestionError>> + Send + '_>>;
}

/// Extracts the JSON array from a model reply, checks every score and sorts by
/// relevance, highest first.
///
/// Replies often wrap the array in prose or a fenced code block. The array
/// starts at the first `[` followed by `{` or `]`, so bracketed prose such as
/// `[1]` is skipped, and anything after the matching closing bracket is
/// ignored.
///
/// # Errors
///
/// [`SuggestionError::InvalidResponse`] when no array is present, it does not
/// deserialize, or a score is outside `[0, 1]`.
pub fn parse_suggestions(text: &str) -> Result<Vec<Suggestion>, SuggestionError> {
    let start = text
        .match_indices('[')
        .map(|(i, _)| i)
        .find(|&i| matches!(text[i + 1..].trim_start().chars().next(), Some('{' | ']')))
        .ok_or_else(|| SuggestionError::InvalidResponse("no JSON array in reply".to_string()))?;

    let suggestions = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Vec<Suggestion>>()
        .next()
        .ok_or_else(|| SuggestionError::InvalidResponse("no JSON array in reply".to_string()))?
        .map_err(|e| SuggestionError::InvalidResponse(e.to_string()))?;

    validate_suggestions(suggestions)
}

/// Checks scores and sorts by relevance, highest first.
///
/// # Errors
///
/// [`SuggestionError::InvalidResponse`] when a score is not a number in `[0, 1]`.
pub fn validate_suggestions(
    mut suggestions: Vec<Suggestion>,
) -> Result<Vec<Suggestion>, SuggestionError> {
    if let Some(bad) = suggestions
        .iter()
        .find(|s| !(0.0..=1.0).contains(&s.relevance_score))
    {
        return Err(SuggestionError::InvalidResponse(format!(
            "relevance score {} for '{}' is outside [0, 1]",
            bad.relevance_score, bad.event.event_name
        )));
    }

    suggestions.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, score: f64) -> String {
        format!(
            r#"{{"eventName":"{name}","eventDescription":"d","eventCategory":"Community",
               "eventDate":"2025-03-01T09:00:00Z","eventLocation":"Hall",
               "requiredSkills":[],"relevanceScore":{score},"reasoning":"fits"}}"#
        )
    }

    #[test]
    fn parses_fenced_reply_and_sorts_descending() {
        let reply = format!(
            "Here you go:\n```json\n[{}, {}, {}]\n```",
            item("Low", 0.2),
            item("High", 0.9),
            item("Mid", 0.5)
        );

        let suggestions = parse_suggestions(&reply).unwrap();
        let names: Vec<_> = suggestions.iter().map(|s| s.event.event_name.as_str()).collect();
        assert_eq!(names, ["High", "Mid", "Low"]);
    }

    #[test]
    fn ignores_bracketed_prose_around_the_array() {
        let reply = format!(
            "As noted [1], these fit best:\n[{}, {}]\nSee note [2] for details.",
            item("Clinic", 0.8),
            item("Library", 0.3)
        );

        let suggestions = parse_suggestions(&reply).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].event.event_name, "Clinic");
    }

    #[test]
    fn rejects_scores_out_of_range() {
        let reply = format!("[{}]", item("Too Good", 1.5));
        assert!(matches!(
            parse_suggestions(&reply),
            Err(SuggestionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn rejects_non_json_replies() {
        assert!(matches!(
            parse_suggestions("I cannot help with that."),
            Err(SuggestionError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_suggestions("[{not json}]"),
            Err(SuggestionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_array_is_fine() {
        assert!(parse_suggestions("[]").unwrap().is_empty());
    }
}
