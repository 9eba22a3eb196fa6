//! Application state for the HTTP server.
//!
//! Holds the document store, the registration handler and the application
//! services. Cloned per request; every field is an `Arc` or wraps one.

use crate::app::{AttendanceService, EventService, ProfileService, SuggestionService};
use axum::extract::FromRef;
use std::sync::Arc;
use volunteer_hub_core::environment::{Clock, IdGenerator};
use volunteer_hub_core::store::DocumentStore;
use volunteer_hub_core::suggestion::SuggestionEngine;
use volunteer_hub_runtime::RegistrationHandler;
use volunteer_hub_runtime::metrics::MetricsExporter;
use volunteer_hub_runtime::retry::RetryPolicy;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store (readiness checks use it directly)
    pub store: Arc<dyn DocumentStore>,
    /// Registration transaction handler
    pub registrations: RegistrationHandler,
    /// Event catalog
    pub events: EventService,
    /// Profiles and roles
    pub profiles: ProfileService,
    /// Attendees and certificates
    pub attendance: AttendanceService,
    /// AI suggestions
    pub suggestions: SuggestionService,
    /// Prometheus exporter, when installed
    pub metrics: Option<MetricsExporter>,
}

impl AppState {
    /// Wire every service around one store.
    ///
    /// `engine` is `None` when AI suggestions are not configured.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        retry: RetryPolicy,
        engine: Option<Arc<dyn SuggestionEngine>>,
    ) -> Self {
        Self {
            registrations: RegistrationHandler::new(Arc::clone(&store), Arc::clone(&ids), retry),
            events: EventService::new(Arc::clone(&store), Arc::clone(&clock), Arc::clone(&ids)),
            profiles: ProfileService::new(Arc::clone(&store), Arc::clone(&clock)),
            attendance: AttendanceService::new(Arc::clone(&store), Arc::clone(&clock), ids),
            suggestions: SuggestionService::new(Arc::clone(&store), clock, engine),
            store,
            metrics: None,
        }
    }

    /// Attach the Prometheus exporter served at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsExporter) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl FromRef<AppState> for Arc<dyn DocumentStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.store)
    }
}
