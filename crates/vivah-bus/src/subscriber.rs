//! Kafka implementation of `EventSubscriber`.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tracing::info;
use vivah_core::bus::{BusError, EventSubscriber, ReceivedMessage};

const DEFAULT_AUTO_OFFSET_RESET: &str = "earliest";

/// Reads one topic as a member of a consumer group. Offsets are committed
/// explicitly through [`EventSubscriber::commit`].
pub struct KafkaEventSubscriber {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaEventSubscriber {
    /// Starts building a subscriber.
    #[must_use]
    pub fn builder() -> KafkaEventSubscriberBuilder {
        KafkaEventSubscriberBuilder::default()
    }
}

impl std::fmt::Debug for KafkaEventSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaEventSubscriber")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

/// Builder for [`KafkaEventSubscriber`].
#[derive(Debug, Default)]
pub struct KafkaEventSubscriberBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    group_id: Option<String>,
    auto_offset_reset: Option<String>,
}

impl KafkaEventSubscriberBuilder {
    /// Comma-separated bootstrap servers.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Topic to subscribe to.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Consumer group id.
    #[must_use]
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Where a group without committed offsets starts reading: `earliest`
    /// (default) or `latest`.
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Creates the consumer and subscribes it to the topic.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Configuration` if a required setting is missing or
    /// the consumer cannot be created, and `BusError::Subscription` if the
    /// subscription is rejected.
    pub fn build(self) -> Result<KafkaEventSubscriber, BusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| BusError::Configuration("brokers not configured".to_owned()))?;
        let topic = self
            .topic
            .ok_or_else(|| BusError::Configuration("topic not configured".to_owned()))?;
        let group_id = self
            .group_id
            .ok_or_else(|| BusError::Configuration("consumer group not configured".to_owned()))?;
        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| DEFAULT_AUTO_OFFSET_RESET.to_owned());

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &auto_offset_reset)
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| BusError::Configuration(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[topic.as_str()])
            .map_err(|e| BusError::Subscription {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;

        info!(
            brokers = %brokers,
            topic = %topic,
            consumer_group = %group_id,
            auto_offset_reset = %auto_offset_reset,
            manual_commit = true,
            "subscribed to topic"
        );

        Ok(KafkaEventSubscriber { consumer, topic })
    }
}

#[async_trait]
impl EventSubscriber for KafkaEventSubscriber {
    async fn poll(&self, timeout: Duration) -> Result<Option<ReceivedMessage>, BusError> {
        let Ok(received) = tokio::time::timeout(timeout, self.consumer.recv()).await else {
            return Ok(None);
        };
        let message = received.map_err(|e| BusError::Transport(e.to_string()))?;

        Ok(Some(ReceivedMessage {
            topic: message.topic().to_owned(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }

    async fn commit(&self, message: &ReceivedMessage) -> Result<(), BusError> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&message.topic, message.partition, Offset::Offset(message.offset + 1))
            .map_err(|e| BusError::Commit(e.to_string()))?;

        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| BusError::Commit(e.to_string()))
    }
}
