//! Application coordinator: connects the infrastructure and owns the
//! HTTP state for the lifetime of the process.

use crate::config::Config;
use crate::server::{AppState, build_router};
use crate::suggestions::AnthropicSuggestionEngine;
use axum::Router;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use volunteer_hub_core::environment::{SystemClock, UuidGenerator};
use volunteer_hub_core::store::{DocumentStore, StoreError};
use volunteer_hub_core::suggestion::SuggestionEngine;
use volunteer_hub_postgres::PostgresDocumentStore;
use volunteer_hub_runtime::metrics::{MetricsError, MetricsExporter};

/// Errors raised while starting the application.
#[derive(Error, Debug)]
pub enum StartupError {
    /// Database connection or migration failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Prometheus recorder could not be installed
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Binding or serving the listener failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main Volunteer Hub application.
pub struct VolunteerHubApp {
    state: AppState,
    config: Config,
}

impl VolunteerHubApp {
    /// Connect to `PostgreSQL`, run migrations, install the metrics recorder
    /// and build the services.
    ///
    /// AI suggestions stay disabled when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the database is unreachable, a migration
    /// fails, or a metrics recorder is already installed.
    pub async fn connect(config: Config) -> Result<Self, StartupError> {
        tracing::info!("Initializing Volunteer Hub...");

        let store =
            PostgresDocumentStore::connect(&config.postgres.url, &config.pool_settings()).await?;
        tracing::info!("Running database migrations...");
        store.migrate().await?;

        let metrics = MetricsExporter::install()?;

        let engine = AnthropicSuggestionEngine::from_config(&config.suggestions)
            .map(|engine| Arc::new(engine) as Arc<dyn SuggestionEngine>);
        if engine.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY not set, AI suggestions disabled");
        }

        let state = AppState::new(
            Arc::new(store) as Arc<dyn DocumentStore>,
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
            config.retry_policy(),
            engine,
        )
        .with_metrics(metrics);

        tracing::info!("Volunteer Hub initialized");
        Ok(Self { state, config })
    }

    /// Wrap an already-built state, e.g. one backed by an in-memory store.
    #[must_use]
    pub const fn from_state(state: AppState, config: Config) -> Self {
        Self { state, config }
    }

    /// The HTTP router over this application's state.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// In-flight requests get the configured shutdown timeout to finish;
    /// connections still open after that are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Io`] if the address cannot be bound or the
    /// server fails.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), StartupError> {
        let addr = self.config.bind_address();
        let drain = self.config.shutdown_timeout();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(address = %addr, "Server listening");

        let signalled = Arc::new(Notify::new());
        let trigger = Arc::clone(&signalled);
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                trigger.notify_one();
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result?,
            () = async {
                signalled.notified().await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!(timeout = ?drain, "Shutdown timeout elapsed, dropping open connections");
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}
