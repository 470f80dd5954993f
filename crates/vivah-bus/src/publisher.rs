//! Kafka implementation of `EventPublisher`.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, info};
use vivah_core::bus::{BusError, EventPublisher};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ACKS: &str = "all";

/// Publishes to one topic, waiting for the broker acknowledgment of every
/// message.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    /// Starts building a publisher.
    #[must_use]
    pub fn builder() -> KafkaEventPublisherBuilder {
        KafkaEventPublisherBuilder::default()
    }
}

impl std::fmt::Debug for KafkaEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaEventPublisher")
            .field("topic", &self.topic)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`KafkaEventPublisher`].
#[derive(Debug, Default)]
pub struct KafkaEventPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    timeout: Option<Duration>,
    acks: Option<String>,
}

impl KafkaEventPublisherBuilder {
    /// Comma-separated bootstrap servers.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// How long a send may wait for acknowledgment (default 5s).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Producer `acks` setting (default `all`).
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Creates the producer. No broker connection is made until the first
    /// send.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Configuration` if brokers or topic are missing or
    /// the producer cannot be created.
    pub fn build(self) -> Result<KafkaEventPublisher, BusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| BusError::Configuration("brokers not configured".to_owned()))?;
        let topic = self
            .topic
            .ok_or_else(|| BusError::Configuration("topic not configured".to_owned()))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let acks = self.acks.as_deref().unwrap_or(DEFAULT_ACKS);

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .create()
            .map_err(|e| BusError::Configuration(format!("failed to create producer: {e}")))?;

        info!(brokers = %brokers, topic = %topic, acks, timeout = ?timeout, "kafka publisher created");

        Ok(KafkaEventPublisher {
            producer,
            topic,
            timeout,
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BusError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                debug!(topic = %self.topic, key, partition, offset, "message acknowledged");
                Ok(())
            }
            Err((kafka_error, _)) => Err(BusError::Publish {
                topic: self.topic.clone(),
                reason: kafka_error.to_string(),
            }),
        }
    }
}
