//! `PostgreSQL` implementation of the `RelayCheckpoint` trait.

use async_trait::async_trait;
use sqlx::PgPool;

use vivah_core::checkpoint::RelayCheckpoint;
use vivah_core::error::DomainError;

use crate::infrastructure;

/// Stores relay positions in the `relay_checkpoints` table of the primary
/// database.
#[derive(Debug, Clone)]
pub struct PgRelayCheckpoint {
    pool: PgPool,
}

impl PgRelayCheckpoint {
    /// Creates a new `PgRelayCheckpoint`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelayCheckpoint for PgRelayCheckpoint {
    async fn load(&self, relay_name: &str) -> Result<Option<i64>, DomainError> {
        let position: Option<(i64,)> =
            sqlx::query_as("SELECT last_event_id FROM relay_checkpoints WHERE relay_name = $1")
                .bind(relay_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| infrastructure("failed to load relay checkpoint", &e))?;

        Ok(position.map(|(last_event_id,)| last_event_id))
    }

    async fn save(&self, relay_name: &str, last_event_id: i64) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO relay_checkpoints (relay_name, last_event_id, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (relay_name) DO UPDATE
             SET last_event_id = EXCLUDED.last_event_id,
                 updated_at = now()",
        )
        .bind(relay_name)
        .bind(last_event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to save relay checkpoint", &e))?;

        Ok(())
    }
}
