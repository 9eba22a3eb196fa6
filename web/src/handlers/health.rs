//! Health check endpoints.
//!
//! Used by load balancers and orchestrators. Liveness never touches
//! dependencies; readiness pings the document store.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use volunteer_hub_core::store::DocumentStore;

/// Readiness report body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    /// `"ok"` or `"unavailable"`.
    pub status: &'static str,
    /// Component that was checked.
    pub component: &'static str,
    /// Failure detail, when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe.
///
/// ```text
/// GET /health  ->  200 {"status":"ok"}
/// ```
#[allow(clippy::unused_async)]
pub async fn liveness() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Readiness probe backed by [`DocumentStore::ping`].
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: the ping failed
pub async fn readiness(
    State(store): State<Arc<dyn DocumentStore>>,
) -> (StatusCode, Json<HealthReport>) {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "ok",
                component: "store",
                message: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "unavailable",
                    component: "store",
                    message: Some(err.to_string()),
                }),
            )
        }
    }
}
