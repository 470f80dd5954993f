//! Test bus clients — mock `EventPublisher` and `EventSubscriber`
//! implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vivah_core::bus::{BusError, EventPublisher, EventSubscriber, ReceivedMessage};

const TEST_TOPIC: &str = "address-events";

/// A publisher that records every message and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingPublisher {
    /// Creates an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published `(key, body)` pair with the body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned or a body is not JSON.
    pub fn published_json(&self) -> Vec<(String, serde_json::Value)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(key, body)| (key.clone(), serde_json::from_slice(body).unwrap()))
            .collect()
    }

    /// Returns every published `(key, body)` pair as raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    fn topic(&self) -> &str {
        TEST_TOPIC
    }

    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BusError> {
        self.sent
            .lock()
            .unwrap()
            .push((key.to_owned(), payload.to_vec()));
        Ok(())
    }
}

/// A publisher whose broker is always unreachable.
#[derive(Debug)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    fn topic(&self) -> &str {
        TEST_TOPIC
    }

    async fn publish(&self, _key: &str, _payload: &[u8]) -> Result<(), BusError> {
        Err(BusError::Publish {
            topic: TEST_TOPIC.to_owned(),
            reason: "broker transport failure".to_owned(),
        })
    }
}

/// A publisher that accepts a fixed number of messages and then fails until
/// [`FlakyPublisher::recover`] is called.
#[derive(Debug)]
pub struct FlakyPublisher {
    remaining: Mutex<usize>,
    inner: RecordingPublisher,
}

impl FlakyPublisher {
    /// Accepts `successes` messages before failing.
    #[must_use]
    pub fn failing_after(successes: usize) -> Self {
        Self {
            remaining: Mutex::new(successes),
            inner: RecordingPublisher::new(),
        }
    }

    /// Lets every following publish succeed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn recover(&self) {
        *self.remaining.lock().unwrap() = usize::MAX;
    }

    /// Returns the messages that were accepted, parsed as JSON.
    pub fn published_json(&self) -> Vec<(String, serde_json::Value)> {
        self.inner.published_json()
    }
}

#[async_trait]
impl EventPublisher for FlakyPublisher {
    fn topic(&self) -> &str {
        TEST_TOPIC
    }

    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), BusError> {
        {
            let mut remaining = self.remaining.lock().unwrap();
            if *remaining == 0 {
                return Err(BusError::Publish {
                    topic: TEST_TOPIC.to_owned(),
                    reason: "message timed out".to_owned(),
                });
            }
            *remaining -= 1;
        }
        self.inner.publish(key, payload).await
    }
}

/// A subscriber that replays a scripted queue of messages and errors, then
/// reports an empty poll after waiting out the timeout.
#[derive(Debug, Default)]
pub struct QueuedSubscriber {
    queue: Mutex<VecDeque<Result<ReceivedMessage, BusError>>>,
    next_offset: Mutex<i64>,
    committed: Mutex<Vec<i64>>,
}

impl QueuedSubscriber {
    /// Creates an empty subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message whose body is `body` serialized as JSON and returns
    /// the message as it will be delivered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_json(&self, key: &str, body: &serde_json::Value) -> ReceivedMessage {
        self.push_raw(key, serde_json::to_vec(body).unwrap())
    }

    /// Queues a message with an arbitrary body.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_raw(&self, key: &str, payload: Vec<u8>) -> ReceivedMessage {
        let offset = {
            let mut next = self.next_offset.lock().unwrap();
            let offset = *next;
            *next += 1;
            offset
        };
        let message = ReceivedMessage {
            topic: TEST_TOPIC.to_owned(),
            partition: 0,
            offset,
            key: Some(key.to_owned()),
            payload,
        };
        self.queue.lock().unwrap().push_back(Ok(message.clone()));
        message
    }

    /// Queues a broker-level error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_error(&self, error: BusError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// Returns the offsets committed so far, in commit order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn committed_offsets(&self) -> Vec<i64> {
        self.committed.lock().unwrap().clone()
    }

    /// Returns `true` once every queued item has been polled.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_drained(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl EventSubscriber for QueuedSubscriber {
    async fn poll(&self, timeout: Duration) -> Result<Option<ReceivedMessage>, BusError> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(error)) => Err(error),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn commit(&self, message: &ReceivedMessage) -> Result<(), BusError> {
        self.committed.lock().unwrap().push(message.offset);
        Ok(())
    }
}
