//! Vivah replicator entry point.
//!
//! Subscribes to the address event topic and applies every envelope to the
//! replica database until Ctrl-C or SIGTERM.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vivah_address::application::replication::ReplicaConsumer;
use vivah_bus::KafkaEventSubscriber;
use vivah_store::pg_address_store::PgReplicaAddressStore;

mod config;
mod error;

use config::Config;
use error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    info!(
        topic = %config.address_topic,
        consumer_group = %config.consumer_group,
        auto_offset_reset = %config.auto_offset_reset,
        "starting vivah replicator"
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.replica_database_url)
        .await?;
    sqlx::migrate!("../../migrations/replica").run(&pool).await?;

    let subscriber = KafkaEventSubscriber::builder()
        .brokers(&config.kafka_brokers)
        .topic(&config.address_topic)
        .group_id(&config.consumer_group)
        .auto_offset_reset(&config.auto_offset_reset)
        .build()?;

    let consumer = ReplicaConsumer::new(
        Arc::new(subscriber),
        Arc::new(PgReplicaAddressStore::new(pool)),
        config.poll_timeout,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(async move { consumer.run(shutdown_rx).await });

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    match consumer_task.await {
        Ok(stats) => info!(
            applied = stats.applied,
            skipped = stats.skipped,
            failed = stats.failed,
            "vivah replicator stopped"
        ),
        Err(e) => error!(error = %e, "replica consumer task failed"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
