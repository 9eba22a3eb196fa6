//! Anthropic-backed [`SuggestionEngine`].
//!
//! Renders the volunteer profile and the candidate events into a prompt, asks
//! Claude for a JSON array and runs the reply through
//! [`parse_suggestions`](volunteer_hub_core::suggestion::parse_suggestions).

use crate::config::SuggestionsConfig;
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use volunteer_hub_anthropic::types::Message;
use volunteer_hub_anthropic::{AnthropicClient, ClaudeError, MessagesRequest};
use volunteer_hub_core::suggestion::{
    Suggestion, SuggestionEngine, SuggestionError, SuggestionRequest, parse_suggestions,
};

const SYSTEM_PROMPT: &str = "You are an AI assistant that suggests relevant volunteer events \
to users based on their skills and interests. Reply with JSON only.";

/// Suggestion engine that calls the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicSuggestionEngine {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicSuggestionEngine {
    /// Create an engine around an existing client.
    #[must_use]
    pub fn new(client: AnthropicClient, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }

    /// Build the engine from configuration, or `None` when no API key is set.
    #[must_use]
    pub fn from_config(config: &SuggestionsConfig) -> Option<Self> {
        let key = config.api_key.clone()?;
        Some(Self::new(
            AnthropicClient::new(key),
            config.model.clone(),
            config.max_tokens,
        ))
    }

    async fn run(&self, request: SuggestionRequest) -> Result<Vec<Suggestion>, SuggestionError> {
        let messages = MessagesRequest::new(vec![Message::user(render_prompt(&request))])
            .with_model(self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_system(SYSTEM_PROMPT);

        let text = self.client.complete(messages).await.map_err(provider_error)?;
        parse_suggestions(&text)
    }
}

impl SuggestionEngine for AnthropicSuggestionEngine {
    fn suggest(
        &self,
        request: SuggestionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Suggestion>, SuggestionError>> + Send + '_>> {
        Box::pin(self.run(request))
    }
}

fn provider_error(err: ClaudeError) -> SuggestionError {
    match err {
        ClaudeError::EmptyResponse | ClaudeError::ResponseParseFailed(_) => {
            SuggestionError::InvalidResponse(err.to_string())
        }
        other => SuggestionError::Provider(other.to_string()),
    }
}

/// Renders the user prompt for one request.
#[must_use]
pub fn render_prompt(request: &SuggestionRequest) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Here are the volunteer's skills: {}",
        list(&request.volunteer_skills)
    );
    let _ = writeln!(
        prompt,
        "Here are the volunteer's interests: {}",
        list(&request.volunteer_interests)
    );
    prompt.push_str("\nHere are the upcoming events:\n");

    for event in &request.upcoming_events {
        let _ = writeln!(prompt, "  Event Name: {}", event.event_name);
        let _ = writeln!(prompt, "  Description: {}", event.event_description);
        let _ = writeln!(prompt, "  Category: {}", event.event_category);
        let _ = writeln!(prompt, "  Date: {}", event.event_date);
        let _ = writeln!(prompt, "  Location: {}", event.event_location);
        let _ = writeln!(prompt, "  Required Skills: {}", list(&event.required_skills));
        prompt.push('\n');
    }

    prompt.push_str(
        "Suggest events that match the volunteer's skills and interests. For each suggested \
event, provide a relevance score (0-1) and reasoning for the score.\n\n\
Return a JSON array of objects with the fields eventName, eventDescription, eventCategory, \
eventDate, eventLocation, requiredSkills, relevanceScore and reasoning, copying the event \
fields exactly as given, sorted by relevanceScore in descending order.",
    );
    prompt
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
