//! Volunteer events and the public catalog filter.

use crate::types::{EventId, UserId, ValidationError, require};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image hint used when the creator does not supply one.
pub const DEFAULT_IMAGE_HINT: &str = "event photo";

/// Event category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Clean-ups, planting, conservation
    Environment,
    /// Tutoring and workshops
    Education,
    /// Blood drives, clinics, wellbeing
    Health,
    /// Everything else
    #[default]
    Community,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [
        Self::Environment,
        Self::Education,
        Self::Health,
        Self::Community,
    ];

    /// Canonical name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "Environment",
            Self::Education => "Education",
            Self::Health => "Health",
            Self::Community => "Community",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::Invalid(format!("Unknown category: {s}")))
    }
}

/// Who can see an event in the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed in the public catalog
    #[default]
    Public,
    /// Reachable by id only
    Private,
}

/// A stored volunteer event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id
    pub id: EventId,
    /// Title
    pub name: String,
    /// Long description
    pub description: String,
    /// Category
    pub category: Category,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Skills volunteers should bring
    pub required_skills: Vec<String>,
    /// Cover image
    pub image_url: String,
    /// Short description of the cover image
    pub image_hint: String,
    /// Registered (not waitlisted) volunteers
    pub participants: u32,
    /// Capacity
    pub max_participants: u32,
    /// Catalog visibility
    pub visibility: Visibility,
    /// Optional organizing group
    pub group_id: Option<String>,
    /// Admin who created the event
    pub created_by: Option<UserId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Reminder text sent before the event
    pub custom_reminder_message: Option<String>,
    /// Follow-up text sent after the event
    pub post_event_message: Option<String>,
}

impl Event {
    /// Builds a stored event from validated input. Participants start at zero.
    #[must_use]
    pub fn from_new(
        id: EventId,
        new: NewEvent,
        created_by: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            description: new.description.trim().to_string(),
            category: new.category.unwrap_or_default(),
            date: new.date,
            location: new.location.trim().to_string(),
            required_skills: new.required_skills,
            image_url: new.image_url.unwrap_or_default(),
            image_hint: new
                .image_hint
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_HINT.to_string()),
            participants: 0,
            max_participants: new.max_participants,
            visibility: new.visibility.unwrap_or_default(),
            group_id: new.group_id,
            created_by,
            created_at,
            custom_reminder_message: new.custom_reminder_message,
            post_event_message: new.post_event_message,
        }
    }

    /// `true` once every seat is taken.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.participants >= self.max_participants
    }

    /// Seats still available.
    #[must_use]
    pub const fn remaining_capacity(&self) -> u32 {
        self.max_participants.saturating_sub(self.participants)
    }

    /// Whether the event shows up in the public catalog.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Title
    pub name: String,
    /// Long description
    pub description: String,
    /// Category, `Community` when absent
    #[serde(default)]
    pub category: Option<Category>,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Skills volunteers should bring
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Cover image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Short description of the cover image
    #[serde(default)]
    pub image_hint: Option<String>,
    /// Capacity, at least one
    pub max_participants: u32,
    /// Catalog visibility, public when absent
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Optional organizing group
    #[serde(default)]
    pub group_id: Option<String>,
    /// Reminder text sent before the event
    #[serde(default)]
    pub custom_reminder_message: Option<String>,
    /// Follow-up text sent after the event
    #[serde(default)]
    pub post_event_message: Option<String>,
}

impl NewEvent {
    /// Smallest valid input: name, location, date and capacity. The description
    /// repeats the name.
    #[must_use]
    pub fn minimal(
        name: impl Into<String>,
        location: impl Into<String>,
        date: DateTime<Utc>,
        max_participants: u32,
    ) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            category: None,
            date,
            location: location.into(),
            required_skills: Vec::new(),
            image_url: None,
            image_hint: None,
            max_participants,
            visibility: None,
            group_id: None,
            custom_reminder_message: None,
            post_event_message: None,
        }
    }

    /// Checks required fields and capacity, returning the input unchanged when
    /// it is acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when name, description or location is blank,
    /// or when `max_participants` is zero.
    pub fn validate(self) -> Result<Self, ValidationError> {
        require(&self.name, "name")?;
        require(&self.description, "description")?;
        require(&self.location, "location")?;
        if self.max_participants < 1 {
            return Err(ValidationError::Invalid(
                "Max participants must be at least 1.".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Public catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventFilter {
    /// Category name, or `all`
    pub category: Option<String>,
    /// Case-insensitive substring of name or location
    pub search: Option<String>,
}

impl EventFilter {
    /// Whether `event` belongs in the public catalog for this query.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !event.is_public() {
            return false;
        }

        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(c) if c.eq_ignore_ascii_case("all") => true,
            Some(c) => event.category.as_str().eq_ignore_ascii_case(c),
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                event.name.to_lowercase().contains(&term)
                    || event.location.to_lowercase().contains(&term)
            }
        };

        category_ok && search_ok
    }

    /// Filters `events` and orders the result by date, soonest first.
    #[must_use]
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let mut out: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        out.sort_by_key(|e| e.date);
        out
    }
}
