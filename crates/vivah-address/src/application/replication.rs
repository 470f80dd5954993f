//! Replica consumer.
//!
//! Pulls address envelopes off the bus and applies them to the replica
//! store. The loop runs until the shutdown signal flips to `true`:
//!
//! ```text
//! Subscribed -> Polling -> Processing(one envelope) -> Polling -> ...
//! ```
//!
//! Every failure is contained to the message that caused it. Broker errors,
//! undecodable bodies and replica errors are logged and the loop moves on.
//! There is no retry and no dead-letter queue; the offset of a failed
//! message is committed like any other.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vivah_core::bus::{EventSubscriber, ReceivedMessage};
use vivah_core::error::DomainError;
use vivah_core::event::DomainEvent;

use crate::domain::aggregates::Address;
use crate::domain::envelope::{AddressEnvelope, DecodedEnvelope, EnvelopeError};
use crate::domain::events::AddressEvent;
use crate::domain::repository::ReplicaAddressStore;

/// Why a message could not be applied.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// The body could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The replica store rejected the change.
    #[error("replica store rejected {event_type} for address {address_id}: {source}")]
    Replica {
        /// The event being applied.
        event_type: &'static str,
        /// The address it targets.
        address_id: i64,
        /// The store error.
        #[source]
        source: DomainError,
    },
}

/// What happened to a single message.
#[derive(Debug)]
pub enum Outcome {
    /// The event was applied to the replica.
    Applied {
        /// The applied event's type tag.
        event_type: &'static str,
        /// The address it targeted.
        address_id: i64,
    },
    /// The event type is not known to this consumer.
    Skipped {
        /// The unrecognised tag.
        event_type: String,
    },
    /// The message could not be applied.
    Failed(ReplicationError),
}

/// Counters for a consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Messages applied to the replica.
    pub applied: u64,
    /// Messages with an unknown event type.
    pub skipped: u64,
    /// Messages that failed to decode or apply.
    pub failed: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied { .. } => self.applied += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Maintains the replica store from the address event topic.
pub struct ReplicaConsumer {
    subscriber: Arc<dyn EventSubscriber>,
    replica: Arc<dyn ReplicaAddressStore>,
    poll_timeout: Duration,
}

impl ReplicaConsumer {
    /// Creates a consumer that waits up to `poll_timeout` for each message.
    #[must_use]
    pub fn new(
        subscriber: Arc<dyn EventSubscriber>,
        replica: Arc<dyn ReplicaAddressStore>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            subscriber,
            replica,
            poll_timeout,
        }
    }

    /// Polls and applies messages until `shutdown` becomes `true` or its
    /// sender is dropped. A message already being applied when shutdown is
    /// signalled is finished first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        info!(poll_timeout = ?self.poll_timeout, "replica consumer started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let polled = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                polled = self.subscriber.poll(self.poll_timeout) => polled,
            };

            match polled {
                Ok(Some(message)) => {
                    let outcome = self.handle_message(&message).await;
                    stats.record(&outcome);
                    if let Err(e) = self.subscriber.commit(&message).await {
                        warn!(
                            partition = message.partition,
                            offset = message.offset,
                            error = %e,
                            "offset commit failed; message may be redelivered"
                        );
                    }
                }
                Ok(None) => debug!("no message within poll timeout"),
                Err(e) => error!(error = %e, "failed to receive from bus"),
            }
        }

        info!(
            applied = stats.applied,
            skipped = stats.skipped,
            failed = stats.failed,
            "replica consumer stopped"
        );
        stats
    }

    /// Decodes one message and applies it to the replica. Never fails; the
    /// outcome says what happened and has already been logged.
    pub async fn handle_message(&self, message: &ReceivedMessage) -> Outcome {
        let outcome = match AddressEnvelope::decode(&message.payload) {
            Ok(DecodedEnvelope::Known { event, .. }) => self.apply(event).await,
            Ok(DecodedEnvelope::Unknown { event_type }) => Outcome::Skipped { event_type },
            Err(e) => Outcome::Failed(e.into()),
        };

        match &outcome {
            Outcome::Applied {
                event_type,
                address_id,
            } => info!(
                event_type,
                address_id,
                partition = message.partition,
                offset = message.offset,
                "replica updated"
            ),
            Outcome::Skipped { event_type } => warn!(
                event_type = %event_type,
                partition = message.partition,
                offset = message.offset,
                "skipping envelope with unknown event type"
            ),
            Outcome::Failed(e) => error!(
                key = message.key.as_deref().unwrap_or(""),
                partition = message.partition,
                offset = message.offset,
                error = %e,
                "failed to apply envelope to replica"
            ),
        }

        outcome
    }

    async fn apply(&self, event: AddressEvent) -> Outcome {
        let event_type = event.event_type();
        let address_id = event.aggregate_id();

        let result = match event {
            AddressEvent::Created(created) => self.replica.insert(&Address::from(created)).await,
            AddressEvent::Updated(updated) => self.replica.update(&Address::from(updated)).await,
            AddressEvent::Deleted(deleted) => self.replica.delete_by_id(deleted.id).await,
        };

        match result {
            Ok(()) => Outcome::Applied {
                event_type,
                address_id,
            },
            Err(source) => Outcome::Failed(ReplicationError::Replica {
                event_type,
                address_id,
                source,
            }),
        }
    }
}
