//! # Volunteer Hub Testing
//!
//! Testing utilities and helpers for Volunteer Hub.
//!
//! This crate provides:
//! - Mock implementations of environment traits ([`FixedClock`], [`SequentialIdGenerator`])
//! - [`InMemoryDocumentStore`], an optimistic in-memory document store
//! - Fixtures for users, events and registrations
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use volunteer_hub_testing::{InMemoryDocumentStore, fixtures};
//!
//! #[tokio::test]
//! async fn registers_user() {
//!     let store = InMemoryDocumentStore::new();
//!     let user = fixtures::volunteer("Asha");
//!     store.insert_user(user.clone()).await.unwrap();
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use volunteer_hub_core::environment::{Clock, IdGenerator};

/// Ready-made documents
pub mod fixtures;

/// In-memory document store
pub mod store;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use volunteer_hub_testing::mocks::FixedClock;
    /// use volunteer_hub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }

    /// Predictable ids: `00000000-0000-0000-0000-000000000001`, then `...02`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Starts counting at one.
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_uuid(&self) -> Uuid {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Uuid::from_u128(u128::from(n))
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use volunteer_hub_core::registration::{CustomFields, T_SHIRT_SIZE};

    /// `(max_participants, participants)` with `participants <= max_participants`.
    pub fn capacity_and_taken() -> impl Strategy<Value = (u32, u32)> {
        (1u32..40).prop_flat_map(|max| (Just(max), 0..=max))
    }

    /// Registration form answers, with or without a t-shirt size.
    pub fn custom_fields() -> impl Strategy<Value = CustomFields> {
        proptest::option::of(prop_oneof![
            Just("S"),
            Just("M"),
            Just("L"),
            Just("XL"),
            Just("XXL")
        ])
        .prop_map(|size| match size {
            Some(size) => CustomFields::new().with(T_SHIRT_SIZE, size),
            None => CustomFields::new(),
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, test_clock};
pub use store::InMemoryDocumentStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_new_year_2025() {
        let expected = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(test_clock().now(), expected);
    }

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_uuid(), uuid::Uuid::from_u128(1));
        assert_eq!(ids.next_uuid(), uuid::Uuid::from_u128(2));
    }
}
