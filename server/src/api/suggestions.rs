//! POST /api/suggestions - AI event suggestions for the caller.

use crate::app::ServiceError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use volunteer_hub_core::suggestion::Suggestion;
use volunteer_hub_web::CallerId;

const FAILURE_MESSAGE: &str = "Failed to get AI suggestions.";

/// Suggestion envelope.
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    /// Whether suggestions were produced
    pub success: bool,
    /// Suggestions, best match first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Suggestion>>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Suggest upcoming public events that fit the caller's skills and
/// interests.
///
/// Answers 503 when no AI provider is configured. Any other failure is
/// logged and reported with a generic message.
pub async fn suggest_events(State(state): State<AppState>, CallerId(caller): CallerId) -> Response {
    match state.suggestions.suggest_for(caller).await {
        Ok(suggestions) => Json(SuggestionsResponse {
            success: true,
            data: Some(suggestions),
            error: None,
        })
        .into_response(),
        Err(err) => {
            let status = match &err {
                ServiceError::SuggestionsUnavailable | ServiceError::Store(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            tracing::warn!(user_id = %caller, error = %err, "AI suggestions failed");
            (
                status,
                Json(SuggestionsResponse {
                    success: false,
                    data: None,
                    error: Some(FAILURE_MESSAGE.to_string()),
                }),
            )
                .into_response()
        }
    }
}
