//! POST /api/events/:id/register - the registration transaction.
//!
//! Every outcome is answered with a `{ success, ... }` envelope, failures
//! included, so the client can show the message as-is.

use crate::server::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use volunteer_hub_core::registration::{
    CustomFields, RegistrationError, RegistrationRequest, RegistrationStatus,
};
use volunteer_hub_core::types::{EventId, RegistrationId};
use volunteer_hub_web::{AppError, CallerId};

/// Registration form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name copied onto the registration
    pub user_name: String,
    /// Form answers, e.g. `{"tShirtSize": "M"}`
    #[serde(default)]
    pub custom_fields: CustomFields,
}

/// Outcome of a registration attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Whether a registration was written
    pub success: bool,
    /// Success message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `registered` or `waitlisted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
    /// Id of the new registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<RegistrationId>,
}

impl RegisterResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            status: None,
            registration_id: None,
        }
    }
}

/// Register the caller for an event.
///
/// The volunteer is `registered` while seats remain and `waitlisted`
/// afterwards.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/<event id>/register \
///   -H "X-User-Id: <user id>" \
///   -H "Content-Type: application/json" \
///   -d '{"userName": "Asha", "customFields": {"tShirtSize": "M"}}'
/// ```
///
/// Malformed ids, a missing caller and unreadable bodies are answered with
/// the same envelope as transaction failures.
pub async fn register_for_event(
    State(state): State<AppState>,
    event_id: Result<Path<EventId>, PathRejection>,
    caller: Result<CallerId, AppError>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Path(event_id) = match event_id {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    let CallerId(user_id) = match caller {
        Ok(caller) => caller,
        Err(err) => return rejected(err.status(), err.message()),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };

    let request = RegistrationRequest {
        event_id,
        user_id,
        user_name: body.user_name,
        custom_fields: body.custom_fields,
    };

    match state.registrations.register(request).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                success: true,
                message: Some(outcome.status.success_message().to_string()),
                error: None,
                status: Some(outcome.status),
                registration_id: Some(outcome.registration_id),
            }),
        )
            .into_response(),
        Err(err) => {
            let status = failure_status(&err);
            if status.is_server_error() {
                tracing::error!(%event_id, %user_id, error = %err, "Registration failed");
            }
            (status, Json(RegisterResponse::failure(err.to_string()))).into_response()
        }
    }
}

fn rejected(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(RegisterResponse::failure(error))).into_response()
}

const fn failure_status(err: &RegistrationError) -> StatusCode {
    match err {
        RegistrationError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistrationError::AlreadyRegistered { .. } | RegistrationError::TransactionConflict => {
            StatusCode::CONFLICT
        }
        RegistrationError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volunteer_hub_core::registration::MissingRecord;
    use volunteer_hub_core::types::UserId;

    #[test]
    fn failures_carry_only_the_error_message() {
        let err = RegistrationError::NotFound(MissingRecord::Event(EventId::new()));
        let body = serde_json::to_value(RegisterResponse::failure(err.to_string())).unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": "Event not found." })
        );
        assert_eq!(failure_status(&err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicates_and_lost_races_are_conflicts() {
        let duplicate = RegistrationError::AlreadyRegistered {
            user_id: UserId::new(),
            event_id: EventId::new(),
        };
        assert_eq!(failure_status(&duplicate), StatusCode::CONFLICT);
        assert_eq!(
            failure_status(&RegistrationError::TransactionConflict),
            StatusCode::CONFLICT
        );
        assert_eq!(
            failure_status(&RegistrationError::Unknown("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
