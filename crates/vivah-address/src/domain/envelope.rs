//! Bus envelope for address events.
//!
//! Wire shape:
//!
//! ```json
//! { "EventType": "AddressCreatedEvent",
//!   "Address": { "Id": 1, "UserId": 5, "Street": null, "City": "Pune", "State": "MH", "Country": "India" },
//!   "Timestamp": "2026-01-15T10:00:00Z" }
//! ```
//!
//! The message key is the decimal address id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vivah_core::error::DomainError;
use vivah_core::event::DomainEvent;
use vivah_core::event_store::StoredEvent;

use super::events::AddressEvent;

/// Errors raised while decoding an envelope received from the bus.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body is not a JSON envelope.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The envelope names a known event type but its payload does not match.
    #[error("invalid {event_type} payload: {source}")]
    InvalidPayload {
        /// The envelope's type tag.
        event_type: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// The message body carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressEnvelope {
    /// Event type tag.
    #[serde(rename = "EventType")]
    pub event_type: String,
    /// Event payload.
    #[serde(rename = "Address")]
    pub address: serde_json::Value,
    /// When the event was recorded.
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// The result of decoding an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEnvelope {
    /// One of the address events this version understands.
    Known {
        /// The decoded event.
        event: AddressEvent,
        /// When the event was recorded.
        timestamp: DateTime<Utc>,
    },
    /// A type tag this version does not understand.
    Unknown {
        /// The unrecognised tag.
        event_type: String,
    },
}

impl AddressEnvelope {
    /// Wraps an event for publishing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
    pub fn from_event(event: &AddressEvent, timestamp: DateTime<Utc>) -> Result<Self, DomainError> {
        Ok(Self {
            event_type: event.event_type().to_owned(),
            address: event.to_payload()?,
            timestamp,
        })
    }

    /// Rebuilds the envelope for a record read back from the event store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the stored payload is not JSON.
    pub fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        Ok(Self {
            event_type: stored.event_type.clone(),
            address: stored.decode()?,
            timestamp: stored.created_at,
        })
    }

    /// Decodes a message body into a closed event variant.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError` if the body is not an envelope or a known
    /// event's payload is malformed. Unknown type tags are not an error.
    pub fn decode(body: &[u8]) -> Result<DecodedEnvelope, EnvelopeError> {
        let envelope: Self = serde_json::from_slice(body).map_err(EnvelopeError::Malformed)?;
        let Self {
            event_type,
            address,
            timestamp,
        } = envelope;

        match AddressEvent::from_tagged(&event_type, address) {
            Ok(Some(event)) => Ok(DecodedEnvelope::Known { event, timestamp }),
            Ok(None) => Ok(DecodedEnvelope::Unknown { event_type }),
            Err(source) => Err(EnvelopeError::InvalidPayload { event_type, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::domain::events::{AddressDeleted, AddressUpdated};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_envelope_serializes_to_wire_field_names() {
        // Arrange
        let event = AddressEvent::Deleted(AddressDeleted { id: 4 });

        // Act
        let envelope = AddressEnvelope::from_event(&event, at()).unwrap();
        let wire = serde_json::to_value(&envelope).unwrap();

        // Assert
        assert_eq!(
            wire,
            json!({
                "EventType": "AddressDeletedEvent",
                "Address": { "Id": 4 },
                "Timestamp": "2026-01-15T10:00:00Z",
            })
        );
    }

    #[test]
    fn test_decode_known_event() {
        // Arrange
        let event = AddressEvent::Updated(AddressUpdated {
            id: 1,
            user_id: 5,
            street: Some("MG Road".to_owned()),
            city: "Mumbai".to_owned(),
            state: "MH".to_owned(),
            country: "India".to_owned(),
        });
        let body = serde_json::to_vec(&AddressEnvelope::from_event(&event, at()).unwrap()).unwrap();

        // Act
        let decoded = AddressEnvelope::decode(&body).unwrap();

        // Assert
        assert_eq!(
            decoded,
            DecodedEnvelope::Known {
                event,
                timestamp: at()
            }
        );
    }

    #[test]
    fn test_decode_unknown_tag_is_not_an_error() {
        let body = json!({
            "EventType": "AddressVerifiedEvent",
            "Address": { "Id": 1 },
            "Timestamp": "2026-01-15T10:00:00Z",
        });

        let decoded = AddressEnvelope::decode(&serde_json::to_vec(&body).unwrap()).unwrap();

        assert_eq!(
            decoded,
            DecodedEnvelope::Unknown {
                event_type: "AddressVerifiedEvent".to_owned()
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_json_body() {
        let result = AddressEnvelope::decode(b"not json");

        assert!(matches!(result, Err(EnvelopeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_known_tag_with_bad_payload() {
        let body = json!({
            "EventType": "AddressCreatedEvent",
            "Address": { "Id": "one" },
            "Timestamp": "2026-01-15T10:00:00Z",
        });

        let result = AddressEnvelope::decode(&serde_json::to_vec(&body).unwrap());

        match result {
            Err(EnvelopeError::InvalidPayload { event_type, .. }) => {
                assert_eq!(event_type, "AddressCreatedEvent");
            }
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn test_from_stored_reuses_record_timestamp() {
        let stored = StoredEvent {
            event_id: 10,
            aggregate_id: 4,
            event_type: "AddressDeletedEvent".to_owned(),
            event_data: r#"{"Id":4}"#.to_owned(),
            created_at: at(),
        };

        let envelope = AddressEnvelope::from_stored(&stored).unwrap();

        assert_eq!(envelope.event_type, "AddressDeletedEvent");
        assert_eq!(envelope.address, json!({ "Id": 4 }));
        assert_eq!(envelope.timestamp, at());
    }
}
