//! In-memory document store with optimistic concurrency.
//!
//! Every user and event document carries a version. A transaction remembers
//! the version of each document it read and buffers its writes; `commit`
//! re-checks those versions under the store lock and applies everything at
//! once, or fails with [`StoreError::Conflict`].

use std::collections::HashMap;
use std::future::ready;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use volunteer_hub_core::certificate::Certificate;
use volunteer_hub_core::environment::{Clock, SystemClock};
use volunteer_hub_core::event::Event;
use volunteer_hub_core::registration::{PendingRegistration, Registration};
use volunteer_hub_core::store::{DocumentStore, StoreError, StoreFuture, StoreTransaction};
use volunteer_hub_core::types::{EventId, UserId};
use volunteer_hub_core::user::{Role, User};

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    doc: T,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, Versioned<User>>,
    events: HashMap<EventId, Versioned<Event>>,
    registrations: Vec<Registration>,
    certificates: Vec<Certificate>,
}

impl State {
    fn has_registration(&self, user_id: UserId, event_id: EventId) -> bool {
        self.registrations
            .iter()
            .any(|r| r.user_id == user_id && r.event_id == event_id)
    }
}

#[derive(Debug, Default)]
struct Faults {
    forced_conflicts: AtomicU32,
    unavailable: AtomicBool,
}

/// In-memory [`DocumentStore`] for fast, deterministic tests.
///
/// Cloning shares the underlying data.
///
/// # Example
///
/// ```
/// use volunteer_hub_testing::InMemoryDocumentStore;
/// use volunteer_hub_core::store::DocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// assert!(store.list_events().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
    faults: Arc<Faults>,
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore").finish_non_exhaustive()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create an empty store stamping registrations with wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping registrations with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
            faults: Arc::new(Faults::default()),
        }
    }

    /// Make the next `n` commits fail with [`StoreError::Conflict`].
    pub fn fail_next_commits(&self, n: u32) {
        self.faults.forced_conflicts.store(n, Ordering::SeqCst);
    }

    /// Make every operation fail with [`StoreError::Database`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored registrations.
    ///
    /// # Errors
    ///
    /// `Database` if the lock is poisoned.
    pub fn registration_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.registrations.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        lock_state(&self.state)
    }

    fn with_state<T, F>(&self, f: F) -> StoreFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut State) -> Result<T, StoreError>,
    {
        let result = self.lock().and_then(|mut state| f(&mut state));
        Box::pin(ready(result))
    }
}

fn lock_state(state: &Mutex<State>) -> Result<MutexGuard<'_, State>, StoreError> {
    state
        .lock()
        .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
}

impl DocumentStore for InMemoryDocumentStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StoreTransaction>> {
        let result = if self.faults.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Database("store unavailable".to_string()))
        } else {
            Ok(Box::new(InMemoryTransaction {
                state: Arc::clone(&self.state),
                clock: Arc::clone(&self.clock),
                faults: Arc::clone(&self.faults),
                user_reads: HashMap::new(),
                event_reads: HashMap::new(),
                user_writes: HashMap::new(),
                event_writes: HashMap::new(),
                registrations: Vec::new(),
            }) as Box<dyn StoreTransaction>)
        };
        Box::pin(ready(result))
    }

    fn insert_event(&self, event: Event) -> StoreFuture<'_, ()> {
        self.with_state(move |state| {
            if state.events.contains_key(&event.id) {
                return Err(StoreError::Duplicate(format!("event {}", event.id)));
            }
            state.events.insert(event.id, Versioned { version: 1, doc: event });
            Ok(())
        })
    }

    fn get_event(&self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        self.with_state(move |state| Ok(state.events.get(&id).map(|v| v.doc.clone())))
    }

    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        self.with_state(|state| Ok(state.events.values().map(|v| v.doc.clone()).collect()))
    }

    fn insert_user(&self, user: User) -> StoreFuture<'_, ()> {
        self.with_state(move |state| {
            if state.users.contains_key(&user.id) {
                return Err(StoreError::Duplicate(format!("user {}", user.id)));
            }
            state.users.insert(user.id, Versioned { version: 1, doc: user });
            Ok(())
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        self.with_state(move |state| Ok(state.users.get(&id).map(|v| v.doc.clone())))
    }

    fn list_users(&self) -> StoreFuture<'_, Vec<User>> {
        self.with_state(|state| Ok(state.users.values().map(|v| v.doc.clone()).collect()))
    }

    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, User> {
        self.with_state(move |state| {
            let entry = state
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
            entry.doc.role = role;
            entry.version += 1;
            Ok(entry.doc.clone())
        })
    }

    fn list_registrations_for_event(
        &self,
        event_id: EventId,
    ) -> StoreFuture<'_, Vec<Registration>> {
        self.with_state(move |state| {
            Ok(state
                .registrations
                .iter()
                .filter(|r| r.event_id == event_id)
                .cloned()
                .collect())
        })
    }

    fn list_registrations_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Registration>> {
        self.with_state(move |state| {
            Ok(state
                .registrations
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    fn insert_certificate(&self, certificate: Certificate) -> StoreFuture<'_, ()> {
        self.with_state(move |state| {
            let exists = state
                .certificates
                .iter()
                .any(|c| c.user_id == certificate.user_id && c.event_id == certificate.event_id);
            if exists {
                return Err(StoreError::Duplicate(format!(
                    "certificate for user {} and event {}",
                    certificate.user_id, certificate.event_id
                )));
            }
            state.certificates.push(certificate);
            Ok(())
        })
    }

    fn list_certificates_for_event(
        &self,
        event_id: EventId,
    ) -> StoreFuture<'_, Vec<Certificate>> {
        self.with_state(move |state| {
            Ok(state
                .certificates
                .iter()
                .filter(|c| c.event_id == event_id)
                .cloned()
                .collect())
        })
    }

    fn list_certificates_for_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Certificate>> {
        self.with_state(move |state| {
            Ok(state
                .certificates
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        self.with_state(|_| Ok(()))
    }
}

/// Buffered transaction over [`InMemoryDocumentStore`].
///
/// Read versions are `None` for documents that did not exist when read, so a
/// concurrent insert is also detected as a conflict.
struct InMemoryTransaction {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
    faults: Arc<Faults>,
    user_reads: HashMap<UserId, Option<u64>>,
    event_reads: HashMap<EventId, Option<u64>>,
    user_writes: HashMap<UserId, User>,
    event_writes: HashMap<EventId, Event>,
    registrations: Vec<Registration>,
}

impl InMemoryTransaction {
    fn read_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        if let Some(user) = self.user_writes.get(&id) {
            return Ok(Some(user.clone()));
        }
        let state = lock_state(&self.state)?;
        let found = state.users.get(&id);
        self.user_reads.entry(id).or_insert(found.map(|v| v.version));
        Ok(found.map(|v| v.doc.clone()))
    }

    fn read_event(&mut self, id: EventId) -> Result<Option<Event>, StoreError> {
        if let Some(event) = self.event_writes.get(&id) {
            return Ok(Some(event.clone()));
        }
        let state = lock_state(&self.state)?;
        let found = state.events.get(&id);
        self.event_reads.entry(id).or_insert(found.map(|v| v.version));
        Ok(found.map(|v| v.doc.clone()))
    }

    fn stage_registration(
        &mut self,
        pending: PendingRegistration,
    ) -> Result<Registration, StoreError> {
        let duplicate_in_tx = self
            .registrations
            .iter()
            .any(|r| r.user_id == pending.user_id && r.event_id == pending.event_id);
        let duplicate_in_store =
            lock_state(&self.state)?.has_registration(pending.user_id, pending.event_id);
        if duplicate_in_tx || duplicate_in_store {
            return Err(StoreError::Duplicate(format!(
                "registration for user {} and event {}",
                pending.user_id, pending.event_id
            )));
        }

        let registration = pending.into_registration(self.clock.now());
        self.registrations.push(registration.clone());
        Ok(registration)
    }

    fn stage_user(&mut self, user: User) -> Result<(), StoreError> {
        if !self.user_writes.contains_key(&user.id) && self.read_user(user.id)?.is_none() {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        self.user_writes.insert(user.id, user);
        Ok(())
    }

    fn stage_event(&mut self, event: Event) -> Result<(), StoreError> {
        if !self.event_writes.contains_key(&event.id) && self.read_event(event.id)?.is_none() {
            return Err(StoreError::NotFound(format!("event {}", event.id)));
        }
        self.event_writes.insert(event.id, event);
        Ok(())
    }

    fn apply(self) -> Result<(), StoreError> {
        let forced = self
            .faults
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(StoreError::Conflict);
        }

        let mut state = lock_state(&self.state)?;

        let users_unchanged = self
            .user_reads
            .iter()
            .all(|(id, seen)| state.users.get(id).map(|v| v.version) == *seen);
        let events_unchanged = self
            .event_reads
            .iter()
            .all(|(id, seen)| state.events.get(id).map(|v| v.version) == *seen);
        let registrations_fresh = self
            .registrations
            .iter()
            .all(|r| !state.has_registration(r.user_id, r.event_id));

        if !(users_unchanged && events_unchanged && registrations_fresh) {
            return Err(StoreError::Conflict);
        }

        for (id, user) in self.user_writes {
            let version = state.users.get(&id).map_or(0, |v| v.version) + 1;
            state.users.insert(id, Versioned { version, doc: user });
        }
        for (id, event) in self.event_writes {
            let version = state.events.get(&id).map_or(0, |v| v.version) + 1;
            state.events.insert(id, Versioned { version, doc: event });
        }
        state.registrations.extend(self.registrations);

        Ok(())
    }
}

impl StoreTransaction for InMemoryTransaction {
    fn get_user(&mut self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(ready(self.read_user(id)))
    }

    fn get_event(&mut self, id: EventId) -> StoreFuture<'_, Option<Event>> {
        Box::pin(ready(self.read_event(id)))
    }

    fn insert_registration(
        &mut self,
        registration: PendingRegistration,
    ) -> StoreFuture<'_, Registration> {
        Box::pin(ready(self.stage_registration(registration)))
    }

    fn update_user(&mut self, user: User) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.stage_user(user)))
    }

    fn update_event(&mut self, event: Event) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.stage_event(event)))
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(ready((*self).apply()))
    }
}
