//! Document store abstraction.
//!
//! The platform persists four document kinds (users, events, registrations,
//! certificates). Most access is plain CRUD, but the registration flow needs a
//! read-modify-write across three documents that either commits as a whole or
//! not at all. [`DocumentStore::begin`] hands out a [`StoreTransaction`] for
//! exactly that.
//!
//! # Implementations
//!
//! - `PostgresDocumentStore` (in `volunteer-hub-postgres`): production, runs
//!   transactions at `SERIALIZABLE`
//! - `InMemoryDocumentStore` (in `volunteer-hub-testing`): versioned documents
//!   with optimistic validation at commit
//!
//! # Conflicts
//!
//! Both implementations report a lost race as [`StoreError::Conflict`]. The
//! caller decides whether to retry; the store never retries on its own.
//!
//! # Example
//!
//! ```no_run
//! use volunteer_hub_core::store::{DocumentStore, StoreError};
//! use volunteer_hub_core::types::{EventId, UserId};
//!
//! async fn bump(store: &dyn DocumentStore, user_id: UserId, event_id: EventId) -> Result<(), StoreError> {
//!     let mut tx = store.begin().await?;
//!     let Some(mut event) = tx.get_event(event_id).await? else {
//!         return Err(StoreError::NotFound(event_id.to_string()));
//!     };
//!     event.participants += 1;
//!     tx.update_event(event).await?;
//!     tx.commit().await
//! }
//! ```

use crate::certificate::Certificate;
use crate::event::Event;
use crate::registration::{PendingRegistration, Registration};
use crate::types::{EventId, UserId};
use crate::user::{Role, User};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by every store operation.
///
/// Explicit boxing keeps [`DocumentStore`] and [`StoreTransaction`] usable as
/// trait objects (`Arc<dyn DocumentStore>`).
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A concurrent transaction modified a document this transaction read.
    ///
    /// Safe to retry from the beginning with a fresh transaction.
    #[error("Transaction conflict: a concurrent update touched the same documents")]
    Conflict,

    /// The addressed document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A document with the same key already exists.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Connection, query or driver failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// One atomic unit of work.
///
/// Reads observe a consistent snapshot and writes become visible only after
/// [`commit`](Self::commit) succeeds. Dropping the transaction without
/// committing discards every buffered write.
///
/// A transaction handle belongs to a single attempt. After a
/// [`StoreError::Conflict`] the caller should drop it and begin a new one.
pub trait StoreTransaction: Send {
    /// Read a user profile inside the transaction.
    ///
    /// # Errors
    ///
    /// `Conflict` if the row is locked by a transaction that wins the race,
    /// `Database` or `Serialization` on driver failure.
    fn get_user(&mut self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Read an event inside the transaction.
    ///
    /// # Errors
    ///
    /// Same as [`get_user`](Self::get_user).
    fn get_event(&mut self, id: EventId) -> StoreFuture<'_, Option<Event>>;

    /// Insert a registration. The store assigns `created_at`.
    ///
    /// # Errors
    ///
    /// `Duplicate` if the (user, event) pair already has a registration.
    fn insert_registration(&mut self, registration: PendingRegistration)
    -> StoreFuture<'_, Registration>;

    /// Overwrite a user profile previously read in this transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist, `Conflict` on a lost race.
    fn update_user(&mut self, user: User) -> StoreFuture<'_, ()>;

    /// Overwrite an event previously read in this transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist, `Conflict` on a lost race.
    fn update_event(&mut self, event: Event) -> StoreFuture<'_, ()>;

    /// Apply every write atomically.
    ///
    /// # Errors
    ///
    /// `Conflict` if any document read by this transaction changed since it was
    /// read. No write is applied in that case.
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()>;
}

/// Persistent storage for every document kind.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// across request handlers behind an `Arc`.
pub trait DocumentStore: Send + Sync {
    /// Open a new atomic transaction.
    ///
    /// # Errors
    ///
    /// `Database` if no connection could be obtained.
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>>;

    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// `Duplicate` if the id is taken.
    fn insert_event(&self, event: Event) -> StoreFuture<'_, ()>;

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure. A missing event is `Ok(None)`.
    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>>;

    /// Every event, in no particular order.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_events(&self) -> StoreFuture<'_, Vec<Event>>;

    /// Insert a new user profile.
    ///
    /// # Errors
    ///
    /// `Duplicate` if a profile with this id exists.
    fn insert_user(&self, user: User) -> StoreFuture<'_, ()>;

    /// Fetch one user profile.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure. A missing user is `Ok(None)`.
    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Every user profile, in no particular order.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_users(&self) -> StoreFuture<'_, Vec<User>>;

    /// Change a user's role and return the updated profile.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist.
    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, User>;

    /// Registrations for one event, oldest first.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_registrations_for_event(&self, event_id: EventId)
    -> StoreFuture<'_, Vec<Registration>>;

    /// Registrations held by one user, oldest first.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_registrations_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Registration>>;

    /// Store an issued certificate.
    ///
    /// # Errors
    ///
    /// `Duplicate` if the (user, event) pair already has a certificate.
    fn insert_certificate(&self, certificate: Certificate) -> StoreFuture<'_, ()>;

    /// Certificates issued for one event.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_certificates_for_event(&self, event_id: EventId)
    -> StoreFuture<'_, Vec<Certificate>>;

    /// Certificates held by one user.
    ///
    /// # Errors
    ///
    /// `Database` or `Serialization` on failure.
    fn list_certificates_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Certificate>>;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// `Database` if the backend is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
