//! # Volunteer Hub Runtime
//!
//! The imperative shell around `volunteer-hub-core`.
//!
//! ## Core Components
//!
//! - **Registration handler**: runs the registration transaction against a
//!   [`DocumentStore`](volunteer_hub_core::DocumentStore), retrying lost races
//! - **Retry**: exponential backoff with jitter
//! - **Metrics**: Prometheus recorder installation and metric recorders
//!
//! ## Example
//!
//! ```ignore
//! use volunteer_hub_runtime::{RegistrationHandler, retry::RetryPolicy};
//!
//! let handler = RegistrationHandler::new(store, Arc::new(UuidGenerator), RetryPolicy::default());
//! let outcome = handler.register(request).await?;
//! println!("{}", outcome.status);
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

/// The registration transaction handler
pub mod registration;

pub use registration::{RegistrationHandler, RegistrationOutcome};
