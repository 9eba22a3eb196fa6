//! The registration transaction handler.
//!
//! Wraps [`decide`](volunteer_hub_core::registration::decide) in a store
//! transaction and retries the whole transaction when the store reports a
//! conflict. One call to [`RegistrationHandler::register`] either writes all
//! three documents (registration, user, event) or none of them.

use crate::metrics::RegistrationMetrics;
use crate::retry::{RetryPolicy, retry_if};
use std::sync::Arc;
use std::time::Instant;
use volunteer_hub_core::environment::IdGenerator;
use volunteer_hub_core::registration::{
    MissingRecord, PendingRegistration, RegistrationError, RegistrationRequest,
    RegistrationStatus, decide,
};
use volunteer_hub_core::store::DocumentStore;
use volunteer_hub_core::types::RegistrationId;

/// Result of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Id of the new registration
    pub registration_id: RegistrationId,
    /// Registered or waitlisted
    pub status: RegistrationStatus,
}

/// Runs registrations against a [`DocumentStore`].
#[derive(Clone)]
pub struct RegistrationHandler {
    store: Arc<dyn DocumentStore>,
    ids: Arc<dyn IdGenerator>,
    retry: RetryPolicy,
}

impl RegistrationHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, ids: Arc<dyn IdGenerator>, retry: RetryPolicy) -> Self {
        Self { store, ids, retry }
    }

    /// Registers a user for an event.
    ///
    /// The user is registered while seats remain and waitlisted afterwards.
    /// Lost races are retried per the handler's [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// - `NotFound` when the user profile or the event does not exist
    /// - `AlreadyRegistered` when the user already holds a registration
    /// - `TransactionConflict` when every retry lost a race
    /// - `Unknown` for any other store failure
    #[tracing::instrument(
        skip(self, request),
        fields(event_id = %request.event_id, user_id = %request.user_id)
    )]
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let started = Instant::now();

        let req = &request;
        let result = retry_if(&self.retry, RegistrationError::is_retryable, move || {
            self.attempt(req)
        })
        .await;

        match &result {
            Ok(outcome) => {
                RegistrationMetrics::record_success(outcome.status.as_str(), started.elapsed());
                tracing::info!(
                    registration_id = %outcome.registration_id,
                    status = %outcome.status,
                    "Registration recorded"
                );
            }
            Err(err) => {
                RegistrationMetrics::record_failure(err.reason(), started.elapsed());
                match err {
                    RegistrationError::Unknown(detail) => {
                        tracing::error!(error = %detail, "Registration failed");
                    }
                    other => tracing::info!(reason = other.reason(), "Registration rejected"),
                }
            }
        }

        result
    }

    /// One transaction attempt. Dropping the transaction on any early return
    /// discards its writes.
    async fn attempt(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let result = self.run_transaction(request).await;
        if matches!(result, Err(RegistrationError::TransactionConflict)) {
            RegistrationMetrics::record_conflict();
        }
        result
    }

    async fn run_transaction(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let mut tx = self.store.begin().await?;

        let mut user = tx
            .get_user(request.user_id)
            .await?
            .ok_or(RegistrationError::NotFound(MissingRecord::User(request.user_id)))?;

        if user.is_registered_for(&request.event_id) {
            return Err(RegistrationError::AlreadyRegistered {
                user_id: request.user_id,
                event_id: request.event_id,
            });
        }

        let mut event = tx
            .get_event(request.event_id)
            .await?
            .ok_or(RegistrationError::NotFound(MissingRecord::Event(request.event_id)))?;

        let decision = decide(&user, &event)?;

        let registration = tx
            .insert_registration(PendingRegistration {
                id: RegistrationId::from_uuid(self.ids.next_uuid()),
                user_id: request.user_id,
                event_id: request.event_id,
                status: decision.status,
                user_name: request.user_name.clone(),
                custom_fields: request.custom_fields.clone(),
            })
            .await?;

        decision.apply(&mut user, &mut event);
        tx.update_user(user).await?;
        if !decision.is_full {
            tx.update_event(event).await?;
        }

        tx.commit().await?;

        Ok(RegistrationOutcome {
            registration_id: registration.id,
            status: registration.status,
        })
    }
}

impl std::fmt::Debug for RegistrationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationHandler")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
