//! Identifier types and shared validation errors.
//!
//! Every document kind gets its own UUID newtype so that a `UserId` can never be
//! passed where an `EventId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a volunteer event
    EventId
);

define_id!(
    /// Unique identifier for a user profile
    UserId
);

define_id!(
    /// Unique identifier for a registration record
    RegistrationId
);

define_id!(
    /// Unique identifier for an issued certificate
    CertificateId
);

/// Input validation failures.
///
/// Messages are user-facing and are returned verbatim by the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or missing.
    #[error("{field} is required")]
    MissingField {
        /// Name of the offending field
        field: &'static str,
    },

    /// A field was present but its value is not acceptable.
    #[error("{0}")]
    Invalid(String),
}

/// Returns `MissingField` when `value` is blank.
pub(crate) fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_uuids() {
        let uuid = Uuid::new_v4();
        let id = EventId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn require_rejects_whitespace() {
        assert_eq!(
            require("   ", "name"),
            Err(ValidationError::MissingField { field: "name" })
        );
        assert!(require("Beach Cleanup", "name").is_ok());
    }
}
