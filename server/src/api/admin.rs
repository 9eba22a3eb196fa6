//! Admin endpoints. Every handler requires a caller id; the services check
//! the caller's role.

use super::ActionResponse;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use volunteer_hub_core::certificate::{Certificate, NewCertificate};
use volunteer_hub_core::event::Event;
use volunteer_hub_core::registration::Registration;
use volunteer_hub_core::types::{EventId, UserId};
use volunteer_hub_core::user::User;
use volunteer_hub_web::{AppError, CallerId};

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    /// `volunteer`, `event_admin` or `super_admin`
    pub role: String,
}

/// Body of a successful role change.
#[derive(Debug, Serialize)]
pub struct UpdatedUser {
    /// The user after the change
    pub user: User,
}

/// Body of a successful certificate upload.
#[derive(Debug, Serialize)]
pub struct IssuedCertificate {
    /// The stored certificate
    pub certificate: Certificate,
}

/// GET /api/admin/events - every event, latest first.
///
/// # Errors
///
/// 403 for callers without an admin role.
pub async fn list_all_events(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.events.list_all_events(caller).await?))
}

/// GET /api/admin/events/:id/attendees - registrations for one event.
///
/// # Errors
///
/// 403 for non-admins, 404 for an unknown event.
pub async fn list_attendees(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(event_id): Path<EventId>,
) -> Result<Json<Vec<Registration>>, AppError> {
    Ok(Json(state.attendance.list_attendees(caller, event_id).await?))
}

/// POST /api/admin/events/:id/certificates - record an uploaded certificate.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/admin/events/<event id>/certificates \
///   -H "X-User-Id: <admin id>" \
///   -H "Content-Type: application/json" \
///   -d '{"userId": "<volunteer id>", "fileUrl": "https://files.example.org/cert.pdf"}'
/// ```
///
/// # Errors
///
/// - 403 for non-admins
/// - 404 for an unknown event or a volunteer without a registration
/// - 409 when the volunteer already has a certificate for the event
/// - 422 when the file url is blank
pub async fn issue_certificate(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(event_id): Path<EventId>,
    Json(new): Json<NewCertificate>,
) -> Result<(StatusCode, Json<ActionResponse<IssuedCertificate>>), AppError> {
    let certificate = state
        .attendance
        .issue_certificate(caller, event_id, new)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(
            "Certificate uploaded successfully!",
            IssuedCertificate { certificate },
        )),
    ))
}

/// GET /api/admin/users - every user ordered by name.
///
/// # Errors
///
/// 403 unless the caller is a super admin.
pub async fn list_users(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.profiles.list_users(caller).await?))
}

/// PUT /api/admin/users/:id/role - change a user's role.
///
/// # Errors
///
/// 403 unless the caller is a super admin, 422 for an unknown role, 404
/// for an unknown user.
pub async fn update_role(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(user_id): Path<UserId>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<ActionResponse<UpdatedUser>>, AppError> {
    let user = state
        .profiles
        .update_role(caller, user_id, &update.role)
        .await?;
    Ok(Json(ActionResponse::ok(
        format!("User role updated to {}.", user.role),
        UpdatedUser { user },
    )))
}
