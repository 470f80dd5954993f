//! Outbox relay.
//!
//! In outbox delivery mode the command handlers only append events; this
//! relay reads the event store in id order and publishes everything past its
//! checkpoint. The checkpoint is a single event id, so the store must make
//! appends visible in id order. Delivery is at-least-once: a crash between publish and
//! checkpoint save republishes the batch, which the replica tolerates only
//! for updates and deletes of records that still exist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vivah_core::bus::EventPublisher;
use vivah_core::checkpoint::RelayCheckpoint;
use vivah_core::error::DomainError;
use vivah_core::event_store::EventStore;

use super::command_handlers::publish_stored_event;

/// Publishes stored address events that have not yet reached the bus.
pub struct OutboxRelay {
    name: String,
    event_store: Arc<dyn EventStore>,
    publisher: Arc<dyn EventPublisher>,
    checkpoint: Arc<dyn RelayCheckpoint>,
    batch_size: i64,
    interval: Duration,
}

impl OutboxRelay {
    /// Creates a relay that tracks its progress under `name`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        event_store: Arc<dyn EventStore>,
        publisher: Arc<dyn EventPublisher>,
        checkpoint: Arc<dyn RelayCheckpoint>,
        batch_size: i64,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            event_store,
            publisher,
            checkpoint,
            batch_size,
            interval,
        }
    }

    /// Publishes one batch and returns how many events were delivered.
    ///
    /// Stops at the first publish failure; the checkpoint is advanced to the
    /// last event that was delivered, so the failed event is retried on the
    /// next call.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the checkpoint or the event
    /// store cannot be read or written.
    pub async fn relay_once(&self) -> Result<usize, DomainError> {
        let after = self.checkpoint.load(&self.name).await?.unwrap_or(0);
        let batch = self.event_store.load_after(after, self.batch_size).await?;

        let mut delivered = 0;
        let mut last_delivered = None;
        for stored in &batch {
            if let Err(e) = publish_stored_event(self.publisher.as_ref(), stored).await {
                warn!(
                    relay = %self.name,
                    event_id = stored.event_id,
                    event_type = %stored.event_type,
                    error = %e,
                    "relay publish failed; will retry"
                );
                break;
            }
            delivered += 1;
            last_delivered = Some(stored.event_id);
        }

        if let Some(last_event_id) = last_delivered {
            self.checkpoint.save(&self.name, last_event_id).await?;
            debug!(relay = %self.name, delivered, last_event_id, "relay batch delivered");
        }

        Ok(delivered)
    }

    /// Runs [`relay_once`](Self::relay_once) on every interval tick until
    /// `shutdown` becomes `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            relay = %self.name,
            topic = self.publisher.topic(),
            batch_size = self.batch_size,
            "outbox relay started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.relay_once().await {
                        error!(relay = %self.name, error = %e, "relay pass failed");
                    }
                }
            }
        }

        info!(relay = %self.name, "outbox relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;
    use vivah_test_support::{
        FailingEventStore, FixedClock, FlakyPublisher, InMemoryCheckpoint, InMemoryEventStore,
        RecordingPublisher,
    };

    use super::*;
    use crate::application::command_handlers::{handle_create_address, handle_delete_address};
    use crate::domain::commands::{CreateAddress, DeleteAddress};
    use crate::memory::{InMemoryAddressRepository, SequentialUnitOfWork};

    const RELAY: &str = "address-outbox";

    /// Creates one address per city and returns the writer used, so later
    /// commands continue against the same primary store.
    async fn seed(event_store: &Arc<InMemoryEventStore>, cities: &[&str]) -> SequentialUnitOfWork {
        let clock = FixedClock::standard();
        let writes = SequentialUnitOfWork::new(
            Arc::new(InMemoryAddressRepository::new()),
            Arc::clone(event_store) as Arc<dyn EventStore>,
        );
        for city in cities {
            let command = CreateAddress {
                correlation_id: Uuid::new_v4(),
                user_id: 5,
                street: None,
                city: (*city).to_owned(),
                state: "MH".to_owned(),
                country: "India".to_owned(),
            };
            handle_create_address(&command, &clock, &writes, None)
                .await
                .unwrap();
        }
        writes
    }

    fn relay(
        event_store: Arc<dyn EventStore>,
        publisher: Arc<dyn EventPublisher>,
        checkpoint: &Arc<InMemoryCheckpoint>,
        batch_size: i64,
    ) -> OutboxRelay {
        OutboxRelay::new(
            RELAY,
            event_store,
            publisher,
            Arc::clone(checkpoint) as Arc<dyn RelayCheckpoint>,
            batch_size,
            Duration::from_millis(5),
        )
    }

    #[tokio::test]
    async fn test_relay_once_publishes_pending_events_in_order() {
        // Arrange
        let event_store = Arc::new(InMemoryEventStore::new());
        seed(&event_store, &["Pune", "Nagpur"]).await;
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(event_store, Arc::clone(&publisher) as _, &checkpoint, 100);

        // Act
        let delivered = relay.relay_once().await.unwrap();

        // Assert
        assert_eq!(delivered, 2);
        let published = publisher.published_json();
        assert_eq!(published[0].0, "1");
        assert_eq!(published[0].1["EventType"], json!("AddressCreatedEvent"));
        assert_eq!(published[0].1["Address"]["City"], json!("Pune"));
        assert_eq!(published[1].0, "2");
        assert_eq!(checkpoint.position(RELAY), Some(2));
    }

    #[tokio::test]
    async fn test_relay_once_resumes_after_checkpoint() {
        // Arrange
        let event_store = Arc::new(InMemoryEventStore::new());
        let writes = seed(&event_store, &["Pune"]).await;
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(
            Arc::clone(&event_store) as _,
            Arc::clone(&publisher) as _,
            &checkpoint,
            100,
        );
        relay.relay_once().await.unwrap();
        let delete = DeleteAddress {
            correlation_id: Uuid::new_v4(),
            address_id: 1,
        };
        handle_delete_address(&delete, &FixedClock::standard(), &writes, None)
            .await
            .unwrap();

        // Act
        let delivered = relay.relay_once().await.unwrap();

        // Assert
        assert_eq!(delivered, 1);
        let published = publisher.published_json();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].1["EventType"], json!("AddressDeletedEvent"));
        assert_eq!(published[1].1["Address"], json!({ "Id": 1 }));
        assert_eq!(checkpoint.position(RELAY), Some(2));
    }

    #[tokio::test]
    async fn test_relay_once_stops_at_first_failure_and_retries_it_later() {
        // Arrange
        let event_store = Arc::new(InMemoryEventStore::new());
        seed(&event_store, &["Pune", "Nagpur", "Nashik"]).await;
        let publisher = Arc::new(FlakyPublisher::failing_after(1));
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(event_store, Arc::clone(&publisher) as _, &checkpoint, 100);

        // Act
        let first = relay.relay_once().await.unwrap();
        publisher.recover();
        let second = relay.relay_once().await.unwrap();

        // Assert
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        let keys: Vec<String> = publisher
            .published_json()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(checkpoint.position(RELAY), Some(3));
    }

    #[tokio::test]
    async fn test_relay_once_respects_batch_size() {
        let event_store = Arc::new(InMemoryEventStore::new());
        seed(&event_store, &["Pune", "Nagpur", "Nashik"]).await;
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(event_store, Arc::clone(&publisher) as _, &checkpoint, 2);

        let delivered = relay.relay_once().await.unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(checkpoint.position(RELAY), Some(2));
    }

    #[tokio::test]
    async fn test_relay_once_with_nothing_pending_leaves_checkpoint_unset() {
        let event_store = Arc::new(InMemoryEventStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(event_store, publisher as _, &checkpoint, 100);

        let delivered = relay.relay_once().await.unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(checkpoint.position(RELAY), None);
    }

    #[tokio::test]
    async fn test_relay_once_propagates_event_store_failure() {
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(Arc::new(FailingEventStore), publisher as _, &checkpoint, 100);

        let result = relay.relay_once().await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_run_delivers_until_shutdown() {
        // Arrange
        let event_store = Arc::new(InMemoryEventStore::new());
        seed(&event_store, &["Pune", "Nagpur"]).await;
        let publisher = Arc::new(RecordingPublisher::new());
        let checkpoint = Arc::new(InMemoryCheckpoint::new());
        let relay = relay(event_store, Arc::clone(&publisher) as _, &checkpoint, 100);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { relay.run(shutdown_rx).await });

        // Act
        while checkpoint.position(RELAY) != Some(2) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(publisher.published().len(), 2);
    }
}
