//! HTTP API handlers, organized by audience:
//! - Events: the public catalog and event creation
//! - Registrations: the registration transaction
//! - Users: profile provisioning and the profile page
//! - Admin: attendee lists, certificates and role management
//! - Suggestions: AI event suggestions
//! - Metrics: Prometheus scrape endpoint
//!
//! Handlers that mirror a form action answer with a `{ success, ... }`
//! envelope; plain reads return the resource itself.

pub mod admin;
pub mod events;
pub mod metrics;
pub mod registrations;
pub mod suggestions;
pub mod users;

use crate::app::ServiceError;
use axum::http::StatusCode;
use serde::Serialize;
use volunteer_hub_core::suggestion::SuggestionError;
use volunteer_hub_web::AppError;

pub use admin::{issue_certificate, list_all_events, list_attendees, list_users, update_role};
pub use events::{create_event, get_event, list_events};
pub use metrics::render_metrics;
pub use registrations::register_for_event;
pub use suggestions::suggest_events;
pub use users::{create_profile, get_profile};

/// Envelope for action-style responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse<T> {
    /// Whether the action succeeded
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Resource produced by the action
    #[serde(flatten)]
    pub data: T,
}

impl<T> ActionResponse<T> {
    /// Successful outcome carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => Self::from(e),
            ServiceError::Forbidden(message) => Self::forbidden(message),
            ServiceError::NotFound(message) => Self::missing(message),
            ServiceError::Conflict(message) => Self::conflict(message),
            ServiceError::SuggestionsUnavailable => {
                Self::unavailable(ServiceError::SuggestionsUnavailable.to_string())
            }
            ServiceError::Suggestion(e) => suggestion_failure(e),
            ServiceError::Store(e) => Self::from(e),
        }
    }
}

fn suggestion_failure(err: SuggestionError) -> AppError {
    AppError::new(
        StatusCode::BAD_GATEWAY,
        "Failed to get AI suggestions.".to_string(),
        "SUGGESTION_FAILED".to_string(),
    )
    .with_source(err.into())
}
