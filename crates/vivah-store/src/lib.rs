//! PostgreSQL-backed stores for the Vivah address pipeline.
//!
//! The primary database holds `addresses`, the append-only `address_events`
//! log and `relay_checkpoints`. The replica database holds only
//! `replica_addresses`. Schemas live under `migrations/primary` and
//! `migrations/replica` at the workspace root.

pub mod pg_address_store;
pub mod pg_event_store;
pub mod pg_relay_checkpoint;

fn infrastructure(context: &str, err: &sqlx::Error) -> vivah_core::error::DomainError {
    vivah_core::error::DomainError::Infrastructure(format!("{context}: {err}"))
}
