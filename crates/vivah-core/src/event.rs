//! Domain event abstractions.

use crate::error::DomainError;

/// Trait that all domain events implement.
///
/// Events are recorded in the event store as a type tag plus a JSON payload
/// and published on the bus keyed by [`DomainEvent::aggregate_id`].
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type tag (used for storage filtering and dispatch).
    fn event_type(&self) -> &'static str;

    /// Returns the identifier of the aggregate that emitted the event.
    fn aggregate_id(&self) -> i64;

    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;
}
