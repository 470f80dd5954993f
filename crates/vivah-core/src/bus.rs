//! Event bus abstractions.
//!
//! The bus carries opaque payload bytes under a partition key. Messages that
//! share a key are delivered in publish order to a single reader of the
//! partition; nothing is guaranteed across keys. Delivery is at least once,
//! so consumers may see a message again after a restart.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by event bus clients.
#[derive(Debug, Error)]
pub enum BusError {
    /// The client could not be created from its configuration.
    #[error("bus configuration error: {0}")]
    Configuration(String),

    /// The broker did not acknowledge a published message.
    #[error("publish to '{topic}' failed: {reason}")]
    Publish {
        /// The destination topic.
        topic: String,
        /// Broker or client error text.
        reason: String,
    },

    /// Subscribing to a topic failed.
    #[error("subscription to '{topic}' failed: {reason}")]
    Subscription {
        /// The topic that could not be subscribed.
        topic: String,
        /// Broker or client error text.
        reason: String,
    },

    /// A broker-level error while receiving.
    #[error("transport error: {0}")]
    Transport(String),

    /// Committing a consumed offset failed.
    #[error("offset commit failed: {0}")]
    Commit(String),

    /// The message body could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// A message pulled off the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Topic the message was read from.
    pub topic: String,
    /// Partition the message was read from.
    pub partition: i32,
    /// Offset of the message within its partition.
    pub offset: i64,
    /// Partition key, if the producer set one.
    pub key: Option<String>,
    /// Message body.
    pub payload: Vec<u8>,
}

/// Publishes messages to a single, fixed topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns the destination topic.
    fn topic(&self) -> &str;

    /// Sends `payload` keyed by `key` and waits for the broker acknowledgment.
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BusError>;
}

/// Pulls messages from a subscribed topic.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Waits up to `timeout` for the next message. `Ok(None)` means nothing
    /// arrived in time.
    async fn poll(&self, timeout: Duration) -> Result<Option<ReceivedMessage>, BusError>;

    /// Marks `message` as consumed so the consumer group resumes after it.
    async fn commit(&self, message: &ReceivedMessage) -> Result<(), BusError>;
}

/// Serializes `body` as JSON and publishes it under `key`.
///
/// # Errors
///
/// Returns `BusError::Serialization` if `body` cannot be encoded, or the
/// publisher's error if the send fails.
pub async fn publish_json<T>(
    publisher: &dyn EventPublisher,
    key: &str,
    body: &T,
) -> Result<(), BusError>
where
    T: Serialize + Sync + ?Sized,
{
    let payload = serde_json::to_vec(body).map_err(|e| BusError::Serialization(e.to_string()))?;
    publisher.publish(key, &payload).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct Capture {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl EventPublisher for Capture {
        fn topic(&self) -> &str {
            "test-topic"
        }

        async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BusError> {
            self.sent.lock().unwrap().push((key.to_owned(), payload.to_vec()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_json_encodes_body_and_forwards_key() {
        // Arrange
        let publisher = Capture::default();
        let body = serde_json::json!({ "EventType": "Ping" });

        // Act
        publish_json(&publisher, "12", &body).await.unwrap();

        // Assert
        let sent = publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "12");
        let decoded: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_publish_error_names_topic() {
        let err = BusError::Publish {
            topic: "address-events".to_owned(),
            reason: "broker down".to_owned(),
        };
        assert_eq!(err.to_string(), "publish to 'address-events' failed: broker down");
    }
}
