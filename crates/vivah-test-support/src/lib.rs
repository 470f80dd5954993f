//! Shared test mocks and utilities for the Vivah address pipeline.

mod bus;
mod checkpoint;
mod clock;
mod event_store;

pub use bus::{FailingPublisher, FlakyPublisher, QueuedSubscriber, RecordingPublisher};
pub use checkpoint::InMemoryCheckpoint;
pub use clock::FixedClock;
pub use event_store::{FailingEventStore, InMemoryEventStore};
