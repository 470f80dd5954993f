//! Replicator startup errors.

use thiserror::Error;
use vivah_core::bus::BusError;

/// Startup errors for the replicator.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The bus client could not be created or subscribed.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}
