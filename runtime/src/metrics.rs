//! Prometheus metrics for observability and monitoring.
//!
//! [`MetricsExporter::install`] registers the process-wide recorder once and
//! hands back a handle that renders the exposition text for `GET /metrics`.
//! Recording goes through small recorder structs so metric names live in one
//! place.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `registrations_total{status}` - Successful registrations by status
//! - `registration_failures_total{reason}` - Failed registrations by reason
//! - `registration_conflicts_total` - Transaction attempts lost to a concurrent writer
//! - `events_created_total` - Events created
//! - `certificates_issued_total` - Certificates issued
//! - `suggestions_requests_total{outcome}` - Suggestion requests by outcome
//!
//! ## Histograms
//! - `registration_duration_seconds` - End-to-end registration time, retries included
//!
//! # Example
//!
//! ```rust,no_run
//! use volunteer_hub_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//! let text = exporter.render();
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Handle to the installed Prometheus recorder.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

impl MetricsExporter {
    /// Install the global recorder, or reuse it if this process already did.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or another recorder was
    /// installed by someone else.
    pub fn install() -> Result<Self, MetricsError> {
        if let Some(handle) = HANDLE.get() {
            return Ok(Self {
                handle: handle.clone(),
            });
        }

        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build_recorder();

        let handle = recorder.handle();
        if HANDLE.set(handle.clone()).is_err() {
            // Lost an installation race within this process; use the winner.
            if let Some(existing) = HANDLE.get() {
                return Ok(Self {
                    handle: existing.clone(),
                });
            }
        }

        metrics::set_global_recorder(recorder)
            .map_err(|e| MetricsError::Install(e.to_string()))?;
        register_metrics();
        tracing::info!("Metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "registrations_total",
        "Successful registrations by status (registered, waitlisted)"
    );
    describe_counter!(
        "registration_failures_total",
        "Failed registrations by reason"
    );
    describe_counter!(
        "registration_conflicts_total",
        "Registration transaction attempts lost to a concurrent writer"
    );
    describe_histogram!(
        "registration_duration_seconds",
        "Time taken to complete a registration, retries included"
    );
    describe_counter!("events_created_total", "Total number of events created");
    describe_counter!(
        "certificates_issued_total",
        "Total number of certificates issued"
    );
    describe_counter!(
        "suggestions_requests_total",
        "AI suggestion requests by outcome (ok, error, unavailable)"
    );
}

/// Registration metrics recorder.
pub struct RegistrationMetrics;

impl RegistrationMetrics {
    /// Record a successful registration.
    pub fn record_success(status: &'static str, duration: Duration) {
        counter!("registrations_total", "status" => status).increment(1);
        histogram!("registration_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed registration.
    pub fn record_failure(reason: &'static str, duration: Duration) {
        counter!("registration_failures_total", "reason" => reason).increment(1);
        histogram!("registration_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record one attempt lost to a concurrent writer.
    pub fn record_conflict() {
        counter!("registration_conflicts_total").increment(1);
    }
}

/// Catalog and certificate metrics recorder.
pub struct CatalogMetrics;

impl CatalogMetrics {
    /// Record an event creation.
    pub fn record_event_created() {
        counter!("events_created_total").increment(1);
    }

    /// Record an issued certificate.
    pub fn record_certificate_issued() {
        counter!("certificates_issued_total").increment(1);
    }
}

/// Suggestion metrics recorder.
pub struct SuggestionMetrics;

impl SuggestionMetrics {
    /// Record a suggestion request outcome.
    pub fn record_request(outcome: &'static str) {
        counter!("suggestions_requests_total", "outcome" => outcome).increment(1);
    }
}
