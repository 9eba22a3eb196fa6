//! Ready-made documents for tests.
//!
//! Every fixture is timestamped with [`test_clock`](crate::test_clock) so
//! assertions on dates are stable.

use crate::test_clock;
use chrono::Duration;
use volunteer_hub_core::environment::Clock;
use volunteer_hub_core::event::{Event, NewEvent};
use volunteer_hub_core::registration::{CustomFields, PendingRegistration, RegistrationStatus};
use volunteer_hub_core::types::{EventId, RegistrationId, UserId};
use volunteer_hub_core::user::{NewUser, Role, User};

/// A volunteer named `name` with an `example.org` address.
#[must_use]
pub fn volunteer(name: &str) -> User {
    let email = format!("{}@example.org", name.to_lowercase().replace(' ', "."));
    User::from_new(UserId::new(), NewUser::named(name, email), test_clock().now())
}

/// A user with the given role.
#[must_use]
pub fn user_with_role(name: &str, role: Role) -> User {
    let mut user = volunteer(name);
    user.role = role;
    user
}

/// A public event one week after the test clock, with no participants yet.
#[must_use]
pub fn event_with_capacity(name: &str, max_participants: u32) -> Event {
    let now = test_clock().now();
    let mut new = NewEvent::minimal(name, "Community Hall", now + Duration::days(7), 1);
    new.max_participants = max_participants;
    Event::from_new(EventId::new(), new, None, now)
}

/// An event that already has `participants` of `max_participants` seats taken.
#[must_use]
pub fn event_with_seats_taken(name: &str, participants: u32, max_participants: u32) -> Event {
    let mut event = event_with_capacity(name, max_participants);
    event.participants = participants;
    event
}

/// A registered-status pending registration for `user` at `event`.
#[must_use]
pub fn pending_registration(user: &User, event: &Event) -> PendingRegistration {
    PendingRegistration {
        id: RegistrationId::new(),
        user_id: user.id,
        event_id: event.id,
        status: RegistrationStatus::Registered,
        user_name: user.name.clone(),
        custom_fields: CustomFields::new(),
    }
}
