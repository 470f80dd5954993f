//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// How committed events reach the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Command handlers publish inline; failures are logged and dropped.
    #[default]
    Direct,
    /// Command handlers only append; a background relay publishes from the
    /// event store.
    Outbox,
}

impl FromStr for DeliveryMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "outbox" => Ok(Self::Outbox),
            other => Err(AppError::Config(format!(
                "DELIVERY_MODE must be 'direct' or 'outbox', got '{other}'"
            ))),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary database connection string.
    pub database_url: String,
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Kafka bootstrap servers.
    pub kafka_brokers: String,
    /// Topic carrying address events.
    pub address_topic: String,
    /// Upper bound on waiting for a broker acknowledgment.
    pub publish_timeout: Duration,
    /// How events reach the bus.
    pub delivery_mode: DeliveryMode,
    /// Pause between outbox relay passes.
    pub relay_interval: Duration,
    /// Maximum events per outbox relay pass.
    pub relay_batch_size: i64,
    /// OTLP collector endpoint; trace export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let listen_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let delivery_mode = match lookup("DELIVERY_MODE") {
            Some(value) => value.parse()?,
            None => DeliveryMode::default(),
        };

        let relay_batch_size: i64 = parse_or(&lookup, "RELAY_BATCH_SIZE", 100)?;
        if relay_batch_size < 1 {
            return Err(AppError::Config(
                "RELAY_BATCH_SIZE must be at least 1".to_owned(),
            ));
        }

        let relay_interval_ms: u64 = parse_or(&lookup, "RELAY_INTERVAL_MS", 1000)?;
        if relay_interval_ms < 1 {
            return Err(AppError::Config(
                "RELAY_INTERVAL_MS must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            listen_addr,
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_owned()),
            address_topic: lookup("ADDRESS_TOPIC").unwrap_or_else(|| "address-events".to_owned()),
            publish_timeout: Duration::from_millis(parse_or(&lookup, "PUBLISH_TIMEOUT_MS", 5000)?),
            delivery_mode,
            relay_interval: Duration::from_millis(relay_interval_ms),
            relay_batch_size,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}
