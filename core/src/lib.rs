//! # Volunteer Hub Core
//!
//! Domain types, pure decision logic and storage abstractions for the
//! volunteer-event platform.
//!
//! This crate has no I/O of its own. It describes:
//!
//! - **Documents**: [`event::Event`], [`user::User`], [`registration::Registration`],
//!   [`certificate::Certificate`]
//! - **Decisions**: pure functions that validate input and decide outcomes
//!   (for example [`registration::decide`], which picks registered vs waitlisted)
//! - **Environment**: injected dependencies such as [`environment::Clock`] and
//!   [`environment::IdGenerator`]
//! - **Storage**: the dyn-compatible [`store::DocumentStore`] trait and its
//!   atomic [`store::StoreTransaction`]
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: decisions live here, execution lives in
//!   `volunteer-hub-runtime` and the application crate
//! - Dependency Injection via traits (`Arc<dyn DocumentStore>`, `Arc<dyn Clock>`)
//! - Invariants are enforced in one place, inside one transaction
//!
//! ## Example
//!
//! ```
//! use volunteer_hub_core::registration::{decide, RegistrationStatus};
//! use volunteer_hub_core::types::{EventId, UserId};
//! use volunteer_hub_core::user::{NewUser, User};
//! use volunteer_hub_core::event::{Event, NewEvent};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let user = User::from_new(UserId::new(), NewUser::named("Asha", "asha@example.org"), now);
//! let new_event = NewEvent::minimal("Beach Cleanup", "Marina Beach", now, 2);
//! let event = Event::from_new(EventId::new(), new_event.validate().unwrap(), None, now);
//!
//! let decision = decide(&user, &event).unwrap();
//! assert_eq!(decision.status, RegistrationStatus::Registered);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod certificate;
pub mod environment;
pub mod event;
pub mod registration;
pub mod store;
pub mod suggestion;
pub mod types;
pub mod user;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub use store::{DocumentStore, StoreError, StoreFuture, StoreTransaction};
pub use types::{CertificateId, EventId, RegistrationId, UserId};
