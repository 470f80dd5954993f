//! Test checkpoint — in-memory `RelayCheckpoint`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vivah_core::checkpoint::RelayCheckpoint;
use vivah_core::error::DomainError;

/// Keeps relay positions in a map.
#[derive(Debug, Default)]
pub struct InMemoryCheckpoint {
    positions: Mutex<HashMap<String, i64>>,
}

impl InMemoryCheckpoint {
    /// Creates a checkpoint with no saved positions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the saved position for `relay_name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn position(&self, relay_name: &str) -> Option<i64> {
        self.positions.lock().unwrap().get(relay_name).copied()
    }
}

#[async_trait]
impl RelayCheckpoint for InMemoryCheckpoint {
    async fn load(&self, relay_name: &str) -> Result<Option<i64>, DomainError> {
        Ok(self.position(relay_name))
    }

    async fn save(&self, relay_name: &str, last_event_id: i64) -> Result<(), DomainError> {
        self.positions
            .lock()
            .unwrap()
            .insert(relay_name.to_owned(), last_event_id);
        Ok(())
    }
}
