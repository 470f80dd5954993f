//! Clock abstraction.
//!
//! Event timestamps are taken from an injected clock so handlers and the
//! relay can be tested against a fixed instant.

use chrono::{DateTime, Utc};

/// Source of the current time for event timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
