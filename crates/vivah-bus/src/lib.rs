//! Kafka clients for the Vivah address pipeline.
//!
//! [`KafkaEventPublisher`] implements `EventPublisher` over an rdkafka
//! `FutureProducer`; [`KafkaEventSubscriber`] implements `EventSubscriber`
//! over a `StreamConsumer` with auto-commit disabled, so offsets advance
//! only when the consumer loop commits them.

pub mod publisher;
pub mod subscriber;

pub use publisher::{KafkaEventPublisher, KafkaEventPublisherBuilder};
pub use subscriber::{KafkaEventSubscriber, KafkaEventSubscriberBuilder};
