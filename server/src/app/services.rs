//! Application services: the operations behind every HTTP endpoint.
//!
//! Each service holds the shared [`DocumentStore`] plus whatever injected
//! dependencies it needs (clock, id generator, suggestion engine), and:
//! 1. Checks the caller's role when the operation is restricted
//! 2. Validates input with the domain types from `volunteer-hub-core`
//! 3. Reads or writes the store
//! 4. Records metrics and logs the outcome
//!
//! The registration transaction is not here; it lives in
//! `volunteer_hub_runtime::RegistrationHandler`.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use volunteer_hub_core::certificate::{Certificate, NewCertificate};
use volunteer_hub_core::environment::{Clock, IdGenerator};
use volunteer_hub_core::event::{Event, EventFilter, NewEvent};
use volunteer_hub_core::registration::Registration;
use volunteer_hub_core::store::{DocumentStore, StoreError};
use volunteer_hub_core::suggestion::{
    Suggestion, SuggestionEngine, SuggestionError, SuggestionRequest, UpcomingEvent,
};
use volunteer_hub_core::types::{CertificateId, EventId, UserId, ValidationError};
use volunteer_hub_core::user::{NewUser, Role, User};
use volunteer_hub_runtime::metrics::{CatalogMetrics, SuggestionMetrics};

/// Message for callers lacking the required role.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Errors that can occur in application services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Caller is unknown or lacks the required role
    #[error("{0}")]
    Forbidden(&'static str),

    /// The addressed record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The record already exists
    #[error("{0}")]
    Conflict(String),

    /// No suggestion engine is configured
    #[error("AI suggestions are not configured.")]
    SuggestionsUnavailable,

    /// The suggestion engine failed
    #[error(transparent)]
    Suggestion(SuggestionError),

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SuggestionError> for ServiceError {
    fn from(err: SuggestionError) -> Self {
        match err {
            SuggestionError::Unavailable => Self::SuggestionsUnavailable,
            other => Self::Suggestion(other),
        }
    }
}

/// Loads the caller and checks their role.
async fn authorize(
    store: &dyn DocumentStore,
    caller: UserId,
    allowed: impl Fn(Role) -> bool,
) -> Result<User, ServiceError> {
    match store.get_user(caller).await? {
        Some(user) if allowed(user.role) => Ok(user),
        Some(user) => {
            tracing::warn!(caller = %caller, role = %user.role, "Permission denied");
            Err(ServiceError::Forbidden(PERMISSION_DENIED))
        }
        None => {
            tracing::warn!(caller = %caller, "Unknown caller");
            Err(ServiceError::Forbidden(PERMISSION_DENIED))
        }
    }
}

async fn require_event(store: &dyn DocumentStore, id: EventId) -> Result<Event, ServiceError> {
    store
        .get_event(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Event not found.".to_string()))
}

/// Event catalog service
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl EventService {
    /// Create a new event service
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Create an event. Admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Validation` for bad input, `Store` on
    /// persistence failure.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_event(&self, caller: UserId, new: NewEvent) -> Result<Event, ServiceError> {
        authorize(self.store.as_ref(), caller, Role::is_admin).await?;
        let new = new.validate()?;

        let event = Event::from_new(
            EventId::from_uuid(self.ids.next_uuid()),
            new,
            Some(caller),
            self.clock.now(),
        );
        self.store.insert_event(event.clone()).await?;

        CatalogMetrics::record_event_created();
        tracing::info!(event_id = %event.id, max_participants = event.max_participants, "Event created");
        Ok(event)
    }

    /// Fetch one event by id, public or not.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent.
    pub async fn get_event(&self, id: EventId) -> Result<Event, ServiceError> {
        require_event(self.store.as_ref(), id).await
    }

    /// Public catalog, soonest first.
    ///
    /// # Errors
    ///
    /// `Store` on read failure.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, ServiceError> {
        let events = self.store.list_events().await?;
        Ok(filter.apply(events))
    }

    /// Every event, latest first. Admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Store` on read failure.
    pub async fn list_all_events(&self, caller: UserId) -> Result<Vec<Event>, ServiceError> {
        authorize(self.store.as_ref(), caller, Role::is_admin).await?;
        let mut events = self.store.list_events().await?;
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }
}

/// A profile together with its registrations and certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// The stored profile
    #[serde(flatten)]
    pub user: User,
    /// Registrations held by the user
    pub registrations: Vec<Registration>,
    /// Certificates issued to the user
    pub certificates: Vec<Certificate>,
}

/// Profile and role management service
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    /// Create a new profile service
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Provision a profile on first login. The id comes from the identity
    /// provider.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input, `Conflict` if the profile exists.
    #[tracing::instrument(skip(self, new))]
    pub async fn create_profile(&self, id: UserId, new: NewUser) -> Result<User, ServiceError> {
        let user = User::from_new(id, new.validate()?, self.clock.now());

        match self.store.insert_user(user.clone()).await {
            Ok(()) => {
                tracing::info!(user_id = %id, "Profile created");
                Ok(user)
            }
            Err(StoreError::Duplicate(_)) => Err(ServiceError::Conflict(
                "A profile already exists for this user.".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// A profile with its registrations and certificates.
    ///
    /// # Errors
    ///
    /// `NotFound` when the profile does not exist.
    pub async fn get_profile(&self, id: UserId) -> Result<ProfileView, ServiceError> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User profile not found.".to_string()))?;
        let registrations = self.store.list_registrations_for_user(id).await?;
        let certificates = self.store.list_certificates_for_user(id).await?;

        Ok(ProfileView {
            user,
            registrations,
            certificates,
        })
    }

    /// All users ordered by name. Super admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for anyone else.
    pub async fn list_users(&self, caller: UserId) -> Result<Vec<User>, ServiceError> {
        authorize(self.store.as_ref(), caller, |r| r == Role::SuperAdmin).await?;
        let mut users = self.store.list_users().await?;
        users.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(users)
    }

    /// Change a user's role. Super admins only.
    ///
    /// `role` is the wire name (`volunteer`, `event_admin`, `super_admin`).
    ///
    /// # Errors
    ///
    /// `Forbidden` for anyone else, `Validation` for an unknown role,
    /// `NotFound` when the user does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_role(&self, caller: UserId, user_id: UserId, role: &str) -> Result<User, ServiceError> {
        authorize(self.store.as_ref(), caller, |r| r == Role::SuperAdmin).await?;
        let role: Role = role.parse()?;

        match self.store.set_user_role(user_id, role).await {
            Ok(user) => {
                tracing::info!(user_id = %user_id, role = %role, "User role updated");
                Ok(user)
            }
            Err(StoreError::NotFound(_)) => {
                Err(ServiceError::NotFound("User profile not found.".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Attendee and certificate service
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl AttendanceService {
    /// Create a new attendance service
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Registrations for an event. Admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for an unknown event.
    pub async fn list_attendees(&self, caller: UserId, event_id: EventId) -> Result<Vec<Registration>, ServiceError> {
        authorize(self.store.as_ref(), caller, Role::is_admin).await?;
        require_event(self.store.as_ref(), event_id).await?;
        Ok(self.store.list_registrations_for_event(event_id).await?)
    }

    /// Issue a certificate for a registered attendee. Admins only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Validation` for a blank file url,
    /// `NotFound` for an unknown event or a user without a registration,
    /// `Conflict` when the user already holds a certificate for the event.
    #[tracing::instrument(skip(self, new), fields(user_id = %new.user_id))]
    pub async fn issue_certificate(
        &self,
        caller: UserId,
        event_id: EventId,
        new: NewCertificate,
    ) -> Result<Certificate, ServiceError> {
        authorize(self.store.as_ref(), caller, Role::is_admin).await?;
        let new = new.validate()?;
        let event = require_event(self.store.as_ref(), event_id).await?;

        let attended = self
            .store
            .list_registrations_for_event(event_id)
            .await?
            .iter()
            .any(|r| r.user_id == new.user_id);
        if !attended {
            return Err(ServiceError::NotFound(
                "The user is not registered for this event.".to_string(),
            ));
        }

        let certificate = new.issue(
            CertificateId::from_uuid(self.ids.next_uuid()),
            &event,
            self.clock.now(),
        );
        match self.store.insert_certificate(certificate.clone()).await {
            Ok(()) => {
                CatalogMetrics::record_certificate_issued();
                tracing::info!(certificate_id = %certificate.id, "Certificate issued");
                Ok(certificate)
            }
            Err(StoreError::Duplicate(_)) => Err(ServiceError::Conflict(
                "A certificate has already been issued for this event.".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Certificates issued to a user.
    ///
    /// # Errors
    ///
    /// `Store` on read failure.
    pub async fn list_certificates_for_user(&self, user_id: UserId) -> Result<Vec<Certificate>, ServiceError> {
        Ok(self.store.list_certificates_for_user(user_id).await?)
    }
}

/// AI suggestion service
#[derive(Clone)]
pub struct SuggestionService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    engine: Option<Arc<dyn SuggestionEngine>>,
}

impl SuggestionService {
    /// Create a new suggestion service. `None` disables suggestions.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        engine: Option<Arc<dyn SuggestionEngine>>,
    ) -> Self {
        Self { store, clock, engine }
    }

    /// Whether an engine is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Rank the public upcoming events for the caller.
    ///
    /// # Errors
    ///
    /// `SuggestionsUnavailable` without an engine, `NotFound` for an unknown
    /// caller, `Suggestion` when the engine fails.
    #[tracing::instrument(skip(self))]
    pub async fn suggest_for(&self, caller: UserId) -> Result<Vec<Suggestion>, ServiceError> {
        let Some(engine) = &self.engine else {
            SuggestionMetrics::record_request("unavailable");
            return Err(ServiceError::SuggestionsUnavailable);
        };

        let user = self
            .store
            .get_user(caller)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User profile not found.".to_string()))?;

        let now = self.clock.now();
        let upcoming: Vec<UpcomingEvent> = EventFilter::default()
            .apply(self.store.list_events().await?)
            .iter()
            .filter(|e| e.date >= now)
            .map(UpcomingEvent::from)
            .collect();

        if upcoming.is_empty() {
            SuggestionMetrics::record_request("ok");
            return Ok(Vec::new());
        }

        let request = SuggestionRequest {
            volunteer_skills: user.skills,
            volunteer_interests: user.interests,
            upcoming_events: upcoming,
        };

        match engine.suggest(request).await {
            Ok(suggestions) => {
                SuggestionMetrics::record_request("ok");
                tracing::info!(count = suggestions.len(), "Suggestions produced");
                Ok(suggestions)
            }
            Err(err) => {
                SuggestionMetrics::record_request("error");
                tracing::warn!(error = %err, "Suggestion engine failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use volunteer_hub_core::event::Visibility;
    use volunteer_hub_core::store::StoreTransaction;
    use volunteer_hub_testing::{InMemoryDocumentStore, SequentialIdGenerator, fixtures, test_clock};

    struct Env {
        store: InMemoryDocumentStore,
        admin: User,
        volunteer: User,
    }

    async fn env() -> Env {
        let store = InMemoryDocumentStore::new();
        let admin = fixtures::user_with_role("Ada", Role::EventAdmin);
        let volunteer = fixtures::volunteer("Vik");
        store.insert_user(admin.clone()).await.unwrap();
        store.insert_user(volunteer.clone()).await.unwrap();
        Env { store, admin, volunteer }
    }

    fn events(store: &InMemoryDocumentStore) -> EventService {
        EventService::new(
            Arc::new(store.clone()),
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }

    fn attendance(store: &InMemoryDocumentStore) -> AttendanceService {
        AttendanceService::new(
            Arc::new(store.clone()),
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }

    #[tokio::test]
    async fn admins_create_events_with_defaults() {
        let env = env().await;
        let new = NewEvent::minimal("Beach Cleanup", "Pier 3", test_clock().now(), 20);

        let event = events(&env.store).create_event(env.admin.id, new).await.unwrap();

        assert_eq!(event.participants, 0);
        assert_eq!(event.created_by, Some(env.admin.id));
        assert_eq!(event.created_at, test_clock().now());
        assert_eq!(event.image_hint, "event photo");
        assert_eq!(env.store.get_event(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn volunteers_cannot_create_events() {
        let env = env().await;
        let new = NewEvent::minimal("Beach Cleanup", "Pier 3", test_clock().now(), 20);

        let err = events(&env.store).create_event(env.volunteer.id, new).await.unwrap_err();

        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(env.store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_capacity_is_rejected() {
        let env = env().await;
        let new = NewEvent::minimal("Beach Cleanup", "Pier 3", test_clock().now(), 0);

        let err = events(&env.store).create_event(env.admin.id, new).await.unwrap_err();

        assert_eq!(err.to_string(), "Max participants must be at least 1.");
    }

    #[tokio::test]
    async fn admin_listing_includes_private_events_latest_first() {
        let env = env().await;
        let early = fixtures::event_with_capacity("Early", 5);
        let mut late = fixtures::event_with_capacity("Late", 5);
        late.date = early.date + Duration::days(3);
        late.visibility = Visibility::Private;
        env.store.insert_event(early.clone()).await.unwrap();
        env.store.insert_event(late.clone()).await.unwrap();

        let service = events(&env.store);
        let all = service.list_all_events(env.admin.id).await.unwrap();
        let public = service.list_events(&EventFilter::default()).await.unwrap();

        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![late.id, early.id]);
        assert_eq!(public.iter().map(|e| e.id).collect::<Vec<_>>(), vec![early.id]);
    }

    #[tokio::test]
    async fn role_updates_are_super_admin_only() {
        let env = env().await;
        let root = fixtures::user_with_role("Root", Role::SuperAdmin);
        env.store.insert_user(root.clone()).await.unwrap();
        let profiles = ProfileService::new(Arc::new(env.store.clone()), Arc::new(test_clock()));

        let denied = profiles
            .update_role(env.admin.id, env.volunteer.id, "super_admin")
            .await
            .unwrap_err();
        assert!(matches!(denied, ServiceError::Forbidden(_)));

        let invalid = profiles.update_role(root.id, env.volunteer.id, "owner").await.unwrap_err();
        assert_eq!(invalid.to_string(), "Invalid role specified.");

        let updated = profiles
            .update_role(root.id, env.volunteer.id, "event_admin")
            .await
            .unwrap();
        assert_eq!(updated.role, Role::EventAdmin);
    }

    #[tokio::test]
    async fn users_are_listed_by_name() {
        let env = env().await;
        let root = fixtures::user_with_role("root", Role::SuperAdmin);
        env.store.insert_user(root.clone()).await.unwrap();
        let profiles = ProfileService::new(Arc::new(env.store.clone()), Arc::new(test_clock()));

        let names: Vec<String> = profiles
            .list_users(root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();

        assert_eq!(names, vec!["Ada", "root", "Vik"]);
    }

    #[tokio::test]
    async fn duplicate_profiles_conflict() {
        let env = env().await;
        let profiles = ProfileService::new(Arc::new(env.store.clone()), Arc::new(test_clock()));

        let err = profiles
            .create_profile(env.volunteer.id, NewUser::named("Vik", "vik@example.org"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn certificates_require_a_registration_and_are_unique() {
        let env = env().await;
        let event = fixtures::event_with_capacity("Clinic", 5);
        env.store.insert_event(event.clone()).await.unwrap();
        let service = attendance(&env.store);
        let new = NewCertificate {
            user_id: env.volunteer.id,
            file_url: "https://files.example.org/vik.pdf".to_string(),
        };

        let not_registered = service
            .issue_certificate(env.admin.id, event.id, new.clone())
            .await
            .unwrap_err();
        assert!(matches!(not_registered, ServiceError::NotFound(_)));

        let mut tx = env.store.begin().await.unwrap();
        tx.insert_registration(fixtures::pending_registration(&env.volunteer, &event))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let certificate = service
            .issue_certificate(env.admin.id, event.id, new.clone())
            .await
            .unwrap();
        assert_eq!(certificate.event_name, "Clinic");
        assert_eq!(certificate.date_issued, test_clock().now());

        let again = service.issue_certificate(env.admin.id, event.id, new).await.unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));
        assert_eq!(
            service.list_certificates_for_user(env.volunteer.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn blank_certificate_url_is_missing_data() {
        let env = env().await;
        let event = fixtures::event_with_capacity("Clinic", 5);
        env.store.insert_event(event.clone()).await.unwrap();

        let err = attendance(&env.store)
            .issue_certificate(
                env.admin.id,
                event.id,
                NewCertificate {
                    user_id: env.volunteer.id,
                    file_url: " ".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required data.");
    }

    #[tokio::test]
    async fn attendees_of_unknown_events_are_not_found() {
        let env = env().await;
        let err = attendance(&env.store)
            .list_attendees(env.admin.id, EventId::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Event not found.");
    }

    struct RecordingEngine {
        seen: Mutex<Option<SuggestionRequest>>,
    }

    impl SuggestionEngine for RecordingEngine {
        fn suggest(
            &self,
            request: SuggestionRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Suggestion>, SuggestionError>> + Send + '_>> {
            Box::pin(async move {
                let first = request.upcoming_events[0].clone();
                *self.seen.lock().unwrap() = Some(request);
                Ok(vec![Suggestion {
                    event: first,
                    relevance_score: 0.8,
                    reasoning: "Matches gardening".to_string(),
                }])
            })
        }
    }

    #[tokio::test]
    async fn suggestions_use_profile_and_upcoming_public_events() {
        let env = env().await;
        let upcoming = fixtures::event_with_capacity("Tree Planting", 5);
        let mut past = fixtures::event_with_capacity("Old Drive", 5);
        past.date = test_clock().now() - Duration::days(1);
        let mut hidden = fixtures::event_with_capacity("Board Meeting", 5);
        hidden.visibility = Visibility::Private;
        for e in [&upcoming, &past, &hidden] {
            env.store.insert_event(e.clone()).await.unwrap();
        }

        let engine = Arc::new(RecordingEngine { seen: Mutex::new(None) });
        let service = SuggestionService::new(
            Arc::new(env.store.clone()),
            Arc::new(test_clock()),
            Some(engine.clone() as Arc<dyn SuggestionEngine>),
        );

        let suggestions = service.suggest_for(env.volunteer.id).await.unwrap();

        assert_eq!(suggestions.len(), 1);
        let seen = engine.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.upcoming_events.len(), 1);
        assert_eq!(seen.upcoming_events[0].event_name, "Tree Planting");
    }

    #[tokio::test]
    async fn suggestions_without_engine_are_unavailable() {
        let env = env().await;
        let service = SuggestionService::new(Arc::new(env.store.clone()), Arc::new(test_clock()), None);

        assert!(!service.is_enabled());
        assert!(matches!(
            service.suggest_for(env.volunteer.id).await,
            Err(ServiceError::SuggestionsUnavailable)
        ));
    }
}
