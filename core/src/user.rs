//! User profiles and roles.

use crate::types::{EventId, UserId, ValidationError, require};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Access level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular volunteer
    #[default]
    Volunteer,
    /// Can create events, view attendees and issue certificates
    EventAdmin,
    /// Everything an event admin can do, plus user management
    SuperAdmin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::EventAdmin => "event_admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Event admins and super admins.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::EventAdmin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Self::Volunteer),
            "event_admin" => Ok(Self::EventAdmin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(ValidationError::Invalid("Invalid role specified.".to_string())),
        }
    }
}

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Profile id, shared with the identity provider
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Avatar image
    pub avatar_url: String,
    /// Access level
    pub role: Role,
    /// Self-declared skills
    pub skills: Vec<String>,
    /// Self-declared interests
    pub interests: Vec<String>,
    /// Hours volunteered so far
    pub volunteer_hours: u32,
    /// Events the user registered or waitlisted for
    pub registered_event_ids: BTreeSet<EventId>,
    /// Profile creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Provisions a profile on first login. Every new user is a volunteer.
    #[must_use]
    pub fn from_new(id: UserId, new: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            avatar_url: new.avatar_url.unwrap_or_default(),
            role: Role::Volunteer,
            skills: new.skills,
            interests: new.interests,
            volunteer_hours: 0,
            registered_event_ids: BTreeSet::new(),
            created_at,
        }
    }

    /// Whether the user already holds a registration for `event_id`.
    #[must_use]
    pub fn is_registered_for(&self, event_id: &EventId) -> bool {
        self.registered_event_ids.contains(event_id)
    }

    /// Shorthand for `self.role.is_admin()`.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Input for provisioning a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Avatar image
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Self-declared skills
    #[serde(default)]
    pub skills: Vec<String>,
    /// Self-declared interests
    #[serde(default)]
    pub interests: Vec<String>,
}

impl NewUser {
    /// A profile with just a name and an email.
    #[must_use]
    pub fn named(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            avatar_url: None,
            skills: Vec::new(),
            interests: Vec::new(),
        }
    }

    /// Checks name and email.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or the email is not
    /// plausibly an address.
    pub fn validate(self) -> Result<Self, ValidationError> {
        require(&self.name, "name")?;
        require(&self.email, "email")?;
        if !self.email.contains('@') {
            return Err(ValidationError::Invalid("Invalid email address.".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_users_are_volunteers_with_no_registrations() {
        let user = User::from_new(
            UserId::new(),
            NewUser::named(" Asha ", "asha@example.org"),
            Utc::now(),
        );

        assert_eq!(user.role, Role::Volunteer);
        assert_eq!(user.name, "Asha");
        assert!(user.registered_event_ids.is_empty());
        assert!(!user.is_admin());
    }

    #[test]
    fn role_parsing_accepts_only_known_roles() {
        assert_eq!("event_admin".parse::<Role>(), Ok(Role::EventAdmin));
        assert_eq!("super_admin".parse::<Role>(), Ok(Role::SuperAdmin));

        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid role specified.");
    }

    #[test]
    fn role_wire_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Role::EventAdmin).unwrap();
        assert_eq!(json, "\"event_admin\"");
        assert_eq!(Role::EventAdmin.to_string(), "event_admin");
    }

    #[test]
    fn registered_ids_have_set_semantics() {
        let mut user = User::from_new(
            UserId::new(),
            NewUser::named("Ben", "ben@example.org"),
            Utc::now(),
        );
        let event_id = EventId::new();

        assert!(user.registered_event_ids.insert(event_id));
        assert!(!user.registered_event_ids.insert(event_id));
        assert_eq!(user.registered_event_ids.len(), 1);
        assert!(user.is_registered_for(&event_id));
    }

    #[test]
    fn validate_rejects_bad_email() {
        assert!(NewUser::named("Ben", "not-an-email").validate().is_err());
        assert!(NewUser::named("Ben", "ben@example.org").validate().is_ok());
    }
}
