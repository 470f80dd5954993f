//! Replicator configuration read from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Replicator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Replica database connection string.
    pub replica_database_url: String,
    /// Kafka bootstrap servers.
    pub kafka_brokers: String,
    /// Topic carrying address events.
    pub address_topic: String,
    /// Consumer group id.
    pub consumer_group: String,
    /// Start position for a group with no committed offsets.
    pub auto_offset_reset: String,
    /// How long one poll waits for a message.
    pub poll_timeout: Duration,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value is invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let replica_database_url = lookup("REPLICA_DATABASE_URL").ok_or_else(|| {
            AppError::Config("REPLICA_DATABASE_URL environment variable must be set".to_owned())
        })?;

        let auto_offset_reset = lookup("AUTO_OFFSET_RESET")
            .unwrap_or_else(|| "earliest".to_owned())
            .to_ascii_lowercase();
        if !matches!(auto_offset_reset.as_str(), "earliest" | "latest") {
            return Err(AppError::Config(format!(
                "AUTO_OFFSET_RESET must be 'earliest' or 'latest', got '{auto_offset_reset}'"
            )));
        }

        let poll_timeout_ms = match lookup("POLL_TIMEOUT_MS") {
            Some(raw) => u64::from_str(raw.trim())
                .map_err(|e| AppError::Config(format!("POLL_TIMEOUT_MS is invalid: {e}")))?,
            None => 1000,
        };

        Ok(Self {
            replica_database_url,
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_owned()),
            address_topic: lookup("ADDRESS_TOPIC").unwrap_or_else(|| "address-events".to_owned()),
            consumer_group: lookup("CONSUMER_GROUP").unwrap_or_else(|| "address-replica".to_owned()),
            auto_offset_reset,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
        })
    }
}
