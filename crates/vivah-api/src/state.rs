//! Shared application state.

use std::sync::Arc;

use vivah_address::domain::repository::{AddressRepository, AddressUnitOfWork};
use vivah_core::bus::EventPublisher;
use vivah_core::clock::Clock;
use vivah_core::event_store::EventStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Primary address store, for reads.
    pub addresses: Arc<dyn AddressRepository>,
    /// Writes an address change together with its event.
    pub writes: Arc<dyn AddressUnitOfWork>,
    /// Append-only event store.
    pub event_store: Arc<dyn EventStore>,
    /// Inline publisher; `None` when the outbox relay delivers events.
    pub publisher: Option<Arc<dyn EventPublisher>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        addresses: Arc<dyn AddressRepository>,
        writes: Arc<dyn AddressUnitOfWork>,
        event_store: Arc<dyn EventStore>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        Self {
            clock,
            addresses,
            writes,
            event_store,
            publisher,
        }
    }

    /// Borrows the inline publisher, if any.
    #[must_use]
    pub fn publisher(&self) -> Option<&dyn EventPublisher> {
        self.publisher.as_deref()
    }
}
