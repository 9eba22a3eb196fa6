//! Axum integration for Volunteer Hub.
//!
//! Shared HTTP plumbing used by the `volunteer-hub` server crate:
//!
//! - [`AppError`]: maps domain and store errors to `{code, message}` JSON
//!   responses and logs server-side failures
//! - [`extractors`]: caller identity (`X-User-Id`) and correlation ids
//! - [`middleware`]: correlation-id layer that tags every request span
//! - [`handlers::health`]: liveness and readiness probes
//!
//! # Request Flow
//!
//! 1. **Correlation layer** assigns or propagates `X-Correlation-ID`
//! 2. **Extractors** pull the caller and body out of the request
//! 3. **Service call** runs against the `DocumentStore`
//! 4. **Errors** convert into `AppError` and render as JSON
//!
//! # Example
//!
//! ```ignore
//! use axum::{Json, Router, extract::State, routing::get};
//! use volunteer_hub_web::{AppError, CallerId, correlation_id_layer};
//!
//! async fn me(State(store): State<Arc<dyn DocumentStore>>, caller: CallerId) -> Result<Json<User>, AppError> {
//!     let user = store.get_user(caller.0).await?.ok_or_else(|| AppError::missing("User profile not found."))?;
//!     Ok(Json(user))
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .layer(correlation_id_layer())
//!     .with_state(store);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CALLER_ID_HEADER, CallerId, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
