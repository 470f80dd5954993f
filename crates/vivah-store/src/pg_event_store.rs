//! `PostgreSQL` implementation of the `EventStore` trait.
//!
//! Every append runs inside a transaction that holds a transaction-level
//! advisory lock until it commits. Event ids are therefore drawn and made
//! visible in the same order, and a reader that sees event `n` also sees
//! every committed event below `n`. The outbox relay's id checkpoint
//! depends on this.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use vivah_core::error::DomainError;
use vivah_core::event_store::{EventStore, NewEvent, StoredEvent};

use crate::infrastructure;

/// PostgreSQL-backed event store over the `address_events` table.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i64,
    aggregate_id: i64,
    event_type: String,
    event_data: String,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_id: row.aggregate_id,
            event_type: row.event_type,
            event_data: row.event_data,
            created_at: row.created_at,
        }
    }
}

/// Appends `event` on `conn`, which must be inside a transaction.
///
/// Takes the append lock first; it is released when the caller's
/// transaction ends, so the event becomes visible before any later append
/// can draw an id.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the lock or the insert fails.
pub async fn append_in_transaction(
    conn: &mut PgConnection,
    event: &NewEvent,
) -> Result<StoredEvent, DomainError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('address_events'))")
        .execute(&mut *conn)
        .await
        .map_err(|e| infrastructure("failed to take event append lock", &e))?;

    let row: EventRow = sqlx::query_as(
        "INSERT INTO address_events (aggregate_id, event_type, event_data, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING event_id, aggregate_id, event_type, event_data, created_at",
    )
    .bind(event.aggregate_id)
    .bind(&event.event_type)
    .bind(&event.event_data)
    .bind(event.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| infrastructure("failed to append event", &e))?;

    debug!(
        event_id = row.event_id,
        aggregate_id = row.aggregate_id,
        event_type = %row.event_type,
        "event appended"
    );
    Ok(row.into())
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, event: NewEvent) -> Result<StoredEvent, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infrastructure("failed to begin append transaction", &e))?;
        let stored = append_in_transaction(&mut tx, &event).await?;
        tx.commit()
            .await
            .map_err(|e| infrastructure("failed to commit event append", &e))?;
        Ok(stored)
    }

    async fn query_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT event_id, aggregate_id, event_type, event_data, created_at
             FROM address_events
             WHERE event_type = $1
             ORDER BY event_id",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to query events by type", &e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    async fn load_after(
        &self,
        after_event_id: i64,
        limit: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT event_id, aggregate_id, event_type, event_data, created_at
             FROM address_events
             WHERE event_id > $1
             ORDER BY event_id
             LIMIT $2",
        )
        .bind(after_event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load pending events", &e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }
}
