//! Router configuration for Volunteer Hub.

use super::state::AppState;
use crate::api::{admin, events, metrics, registrations, suggestions, users};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use volunteer_hub_web::correlation_id_layer;
use volunteer_hub_web::handlers::{liveness, readiness};

/// Build the complete Axum router.
///
/// Health, readiness and metrics sit at the root; everything else is
/// nested under `/api`. Every request gets a correlation id and a trace
/// span.
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/events", get(admin::list_all_events))
        .route("/events/:id/attendees", get(admin::list_attendees))
        .route("/events/:id/certificates", post(admin::issue_certificate))
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", put(admin::update_role));

    let api_routes = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/register", post(registrations::register_for_event))
        .route("/users", post(users::create_profile))
        .route("/users/:id", get(users::get_profile))
        .route("/suggestions", post(suggestions::suggest_events))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics::render_metrics))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
