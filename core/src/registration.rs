//! Registrations and the capacity decision.
//!
//! [`decide`] is the pure half of the registration transaction: given the user
//! and event as read inside the transaction, it rejects duplicates and picks
//! `registered` or `waitlisted`. [`RegistrationDecision::apply`] then produces
//! the derived writes. The runtime crate wraps both in a store transaction and
//! a retry loop.

use crate::event::Event;
use crate::store::StoreError;
use crate::types::{EventId, RegistrationId, UserId, ValidationError};
use crate::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Custom field key for the volunteer's t-shirt size.
pub const T_SHIRT_SIZE: &str = "tShirtSize";

/// Lifecycle state of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Holds a seat
    Registered,
    /// Accepted after capacity ran out
    Waitlisted,
    /// Withdrawn
    Cancelled,
}

impl RegistrationStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Waitlisted => "waitlisted",
            Self::Cancelled => "cancelled",
        }
    }

    /// Message shown to the volunteer after a successful attempt.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Waitlisted => "The event is full. You have been added to the waitlist.",
            Self::Registered | Self::Cancelled => "Successfully registered for the event.",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "waitlisted" => Ok(Self::Waitlisted),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::Invalid(format!(
                "Unknown registration status: {other}"
            ))),
        }
    }
}

/// Free-form answers collected on the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFields(BTreeMap<String, String>);

impl CustomFields {
    /// No answers.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds one answer, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Looks up one answer.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The `tShirtSize` answer, if given.
    #[must_use]
    pub fn t_shirt_size(&self) -> Option<&str> {
        self.get(T_SHIRT_SIZE)
    }

    /// Number of answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no answers were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stored registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Registration id
    pub id: RegistrationId,
    /// Registered user
    pub user_id: UserId,
    /// Target event
    pub event_id: EventId,
    /// Registered or waitlisted
    pub status: RegistrationStatus,
    /// Assigned by the store when the record is written
    pub created_at: DateTime<Utc>,
    /// The user's display name at registration time
    pub user_name: String,
    /// Form answers
    pub custom_fields: CustomFields,
}

/// A registration about to be written. The store fills in `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    /// Registration id
    pub id: RegistrationId,
    /// Registered user
    pub user_id: UserId,
    /// Target event
    pub event_id: EventId,
    /// Registered or waitlisted
    pub status: RegistrationStatus,
    /// The user's display name
    pub user_name: String,
    /// Form answers
    pub custom_fields: CustomFields,
}

impl PendingRegistration {
    /// Stamps the record with its creation time.
    #[must_use]
    pub fn into_registration(self, created_at: DateTime<Utc>) -> Registration {
        Registration {
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            status: self.status,
            created_at,
            user_name: self.user_name,
            custom_fields: self.custom_fields,
        }
    }
}

/// Input of the registration transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Target event
    pub event_id: EventId,
    /// Registering user
    pub user_id: UserId,
    /// Display name copied onto the registration
    pub user_name: String,
    /// Form answers
    pub custom_fields: CustomFields,
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationDecision {
    /// Status the new registration gets
    pub status: RegistrationStatus,
    /// Capacity was exhausted when the event was read
    pub is_full: bool,
}

impl RegistrationDecision {
    /// Applies the derived state changes to the documents read in the
    /// transaction: the event id joins the user's set, and the participant
    /// count grows by one only when a seat was available.
    pub fn apply(&self, user: &mut User, event: &mut Event) {
        user.registered_event_ids.insert(event.id);
        if !self.is_full {
            event.participants = event.participants.saturating_add(1);
        }
    }
}

/// Which document was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRecord {
    /// No profile for the user
    User(UserId),
    /// No such event
    Event(EventId),
}

/// Failures of the registration transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The user profile or the event does not exist.
    #[error("{}", not_found_message(.0))]
    NotFound(MissingRecord),

    /// The user already holds a registration for the event.
    #[error("You are already registered for this event.")]
    AlreadyRegistered {
        /// Registering user
        user_id: UserId,
        /// Target event
        event_id: EventId,
    },

    /// Retries were exhausted while concurrent registrations kept winning.
    #[error("The event is busy right now. Please try again.")]
    TransactionConflict,

    /// Anything else.
    #[error("An unexpected error occurred: {0}")]
    Unknown(String),
}

const fn not_found_message(missing: &MissingRecord) -> &'static str {
    match missing {
        MissingRecord::User(_) => "User profile not found.",
        MissingRecord::Event(_) => "Event not found.",
    }
}

impl RegistrationError {
    /// Short label used for metrics and logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(MissingRecord::User(_)) => "user_not_found",
            Self::NotFound(MissingRecord::Event(_)) => "event_not_found",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::TransactionConflict => "conflict",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Only lost races are worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict)
    }
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::TransactionConflict,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Decides the outcome of a registration attempt.
///
/// `user` and `event` must be the versions read inside the same transaction
/// that will write the result.
///
/// # Errors
///
/// [`RegistrationError::AlreadyRegistered`] if the event is already in the
/// user's registered set.
pub fn decide(user: &User, event: &Event) -> Result<RegistrationDecision, RegistrationError> {
    if user.is_registered_for(&event.id) {
        return Err(RegistrationError::AlreadyRegistered {
            user_id: user.id,
            event_id: event.id,
        });
    }

    let is_full = event.is_full();
    let status = if is_full {
        RegistrationStatus::Waitlisted
    } else {
        RegistrationStatus::Registered
    };

    Ok(RegistrationDecision { status, is_full })
}
