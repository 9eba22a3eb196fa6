//! Injected dependencies.
//!
//! Services never read the wall clock or mint identifiers directly. They take
//! these traits so tests can substitute deterministic versions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Clock trait for getting current time
///
/// Abstracted to allow deterministic testing with fixed time.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh document identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a UUID that has not been handed out before.
    fn next_uuid(&self) -> Uuid;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_generator_does_not_repeat() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_uuid(), ids.next_uuid());
    }
}
