//! Relay checkpoint abstraction.

use async_trait::async_trait;

use crate::error::DomainError;

/// Persists how far a named relay has progressed through the event store.
#[async_trait]
pub trait RelayCheckpoint: Send + Sync {
    /// Returns the last event id the relay delivered, or `None` if it has
    /// never run.
    async fn load(&self, relay_name: &str) -> Result<Option<i64>, DomainError>;

    /// Records that every event up to and including `last_event_id` has been
    /// delivered.
    async fn save(&self, relay_name: &str, last_event_id: i64) -> Result<(), DomainError>;
}
