//! Event store abstraction.
//!
//! The store is an append-only log. Records are never updated or deleted;
//! the only reads are a type-filtered scan (audit/replay) and a positional
//! scan used by the outbox relay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::DomainEvent;

/// An event that has not been appended yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Aggregate this event belongs to (used as the bus partition key).
    pub aggregate_id: i64,
    /// Event type tag.
    pub event_type: String,
    /// Serialized event payload.
    pub event_data: String,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    /// Builds a record from a domain event, stamped with the clock's time.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
    pub fn from_domain_event(event: &dyn DomainEvent, clock: &dyn Clock) -> Result<Self, DomainError> {
        Ok(Self {
            aggregate_id: event.aggregate_id(),
            event_type: event.event_type().to_owned(),
            event_data: serde_json::to_string(&event.to_payload()?)?,
            created_at: clock.now(),
        })
    }
}

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Store-assigned identifier; increases with insertion order.
    pub event_id: i64,
    /// Aggregate this event belongs to.
    pub aggregate_id: i64,
    /// Event type tag.
    pub event_type: String,
    /// Serialized event payload.
    pub event_data: String,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Deserializes the payload into the requested shape.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_str(&self.event_data).map_err(|e| {
            DomainError::Infrastructure(format!(
                "event {} ({}) deserialization failed: {e}",
                self.event_id, self.event_type
            ))
        })
    }
}

/// Append-only event store.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event and returns it with its assigned id. The event is
    /// durable when this returns.
    async fn append(&self, event: NewEvent) -> Result<StoredEvent, DomainError>;

    /// Returns every event whose type tag equals `event_type`, in insertion order.
    async fn query_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError>;

    /// Returns up to `limit` events with an id greater than `after_event_id`,
    /// in insertion order.
    async fn load_after(
        &self,
        after_event_id: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, DomainError>;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::Deserialize;

    use super::*;
    use crate::clock::Clock;

    #[derive(Debug)]
    struct Fixed(DateTime<Utc>);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Debug)]
    struct Renamed {
        id: i64,
    }

    impl DomainEvent for Renamed {
        fn event_type(&self) -> &'static str {
            "Renamed"
        }

        fn aggregate_id(&self) -> i64 {
            self.id
        }

        fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
            Ok(serde_json::json!({ "Id": self.id }))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct RenamedData {
        #[serde(rename = "Id")]
        id: i64,
    }

    #[test]
    fn test_new_event_from_domain_event_copies_tag_id_and_time() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        // Act
        let event = NewEvent::from_domain_event(&Renamed { id: 7 }, &Fixed(now)).unwrap();

        // Assert
        assert_eq!(event.aggregate_id, 7);
        assert_eq!(event.event_type, "Renamed");
        assert_eq!(event.event_data, r#"{"Id":7}"#);
        assert_eq!(event.created_at, now);
    }

    #[test]
    fn test_stored_event_decode_reports_shape_mismatch() {
        let stored = StoredEvent {
            event_id: 3,
            aggregate_id: 7,
            event_type: "Renamed".to_owned(),
            event_data: r#"{"Name":"x"}"#.to_owned(),
            created_at: Utc::now(),
        };

        let decoded: Result<RenamedData, _> = stored.decode();

        match decoded {
            Err(DomainError::Infrastructure(msg)) => assert!(msg.contains("event 3 (Renamed)")),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }
}
