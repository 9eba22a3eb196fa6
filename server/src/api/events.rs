//! Event catalog endpoints:
//! - GET /api/events - Public catalog, filtered by category and search text
//! - POST /api/events - Create an event (admins only)
//! - GET /api/events/:id - Event details

use super::ActionResponse;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use volunteer_hub_core::event::{Event, EventFilter, NewEvent};
use volunteer_hub_core::types::EventId;
use volunteer_hub_web::{AppError, CallerId};

/// Body of a successful create.
#[derive(Debug, Serialize)]
pub struct CreatedEvent {
    /// The stored event
    pub event: Event,
}

/// List public events, soonest first.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/events?category=Environment&search=beach"
/// ```
///
/// # Errors
///
/// Returns 503 if the store is unreachable.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.events.list_events(&filter).await?;
    Ok(Json(events))
}

/// Create an event.
///
/// The caller must be an event admin or super admin.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "X-User-Id: <admin id>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Beach Cleanup",
///     "description": "Collect litter along the shore",
///     "category": "Environment",
///     "date": "2025-06-01T09:00:00Z",
///     "location": "Marina Beach",
///     "maxParticipants": 25,
///     "requiredSkills": ["teamwork"]
///   }'
/// ```
///
/// # Errors
///
/// - 401 without a caller id
/// - 403 when the caller is not an admin
/// - 422 when validation fails
pub async fn create_event(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(new): Json<NewEvent>,
) -> Result<(StatusCode, Json<ActionResponse<CreatedEvent>>), AppError> {
    let event = state.events.create_event(caller, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(
            "Event created successfully.",
            CreatedEvent { event },
        )),
    ))
}

/// Fetch a single event.
///
/// # Errors
///
/// Returns 404 if the event does not exist.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.events.get_event(id).await?))
}
