//! Profile endpoints.

use crate::app::ProfileView;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use volunteer_hub_core::types::UserId;
use volunteer_hub_core::user::{NewUser, User};
use volunteer_hub_web::{AppError, CallerId};

/// POST /api/users - provision the caller's profile on first login.
///
/// The profile id is the caller id issued by the identity provider.
///
/// # Errors
///
/// 401 without a caller id, 409 if the profile exists, 422 for a blank name
/// or email.
pub async fn create_profile(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.profiles.create_profile(caller, new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/:id - profile with registrations and certificates.
///
/// # Errors
///
/// 404 if the profile does not exist.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(state.profiles.get_profile(id).await?))
}
