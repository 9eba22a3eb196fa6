//! GET /metrics - Prometheus text exposition.

use crate::server::state::AppState;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Render every recorded metric.
///
/// Answers 404 when no recorder was installed (tests, embedded use).
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(exporter) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            exporter.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
