//! Test event stores — mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use vivah_core::error::DomainError;
use vivah_core::event_store::{EventStore, NewEvent, StoredEvent};

/// An in-memory append-only log. Ids start at 1 and increase by one per
/// append, matching a `BIGSERIAL` column.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every appended event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<StoredEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: NewEvent) -> Result<StoredEvent, DomainError> {
        let mut events = self.events.lock().unwrap();
        let event_id = i64::try_from(events.len()).unwrap() + 1;
        let stored = StoredEvent {
            event_id,
            aggregate_id: event.aggregate_id,
            event_type: event.event_type,
            event_data: event.event_data,
            created_at: event.created_at,
        };
        events.push(stored.clone());
        Ok(stored)
    }

    async fn query_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn load_after(
        &self,
        after_event_id: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_id > after_event_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing the partial-failure path after a primary write.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(&self, _event: NewEvent) -> Result<StoredEvent, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn query_by_type(&self, _event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_after(
        &self,
        _after_event_id: i64,
        _limit: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
