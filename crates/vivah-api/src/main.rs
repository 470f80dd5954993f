//! Vivah address API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use vivah_address::application::relay::OutboxRelay;
use vivah_address::domain::repository::AddressRepository;
use vivah_api::config::{Config, DeliveryMode};
use vivah_api::error::AppError;
use vivah_api::routes;
use vivah_api::state::AppState;
use vivah_api::telemetry;
use vivah_bus::KafkaEventPublisher;
use vivah_core::bus::EventPublisher;
use vivah_core::clock::SystemClock;
use vivah_core::event_store::EventStore;
use vivah_store::pg_address_store::PgAddressRepository;
use vivah_store::pg_event_store::PgEventStore;
use vivah_store::pg_relay_checkpoint::PgRelayCheckpoint;

const RELAY_NAME: &str = "address-outbox";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let _telemetry = telemetry::init("vivah-api", config.otlp_endpoint.as_deref())?;

    info!(
        listen_addr = %config.listen_addr,
        delivery_mode = ?config.delivery_mode,
        topic = %config.address_topic,
        "starting vivah address API"
    );

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations/primary").run(&pool).await?;

    let publisher: Arc<dyn EventPublisher> = Arc::new(
        KafkaEventPublisher::builder()
            .brokers(&config.kafka_brokers)
            .topic(&config.address_topic)
            .timeout(config.publish_timeout)
            .build()?,
    );
    let event_store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // In outbox mode the relay is the only path to the bus.
    let (inline_publisher, relay_task) = match config.delivery_mode {
        DeliveryMode::Direct => (Some(publisher), None),
        DeliveryMode::Outbox => {
            let relay = OutboxRelay::new(
                RELAY_NAME,
                Arc::clone(&event_store),
                publisher,
                Arc::new(PgRelayCheckpoint::new(pool.clone())),
                config.relay_batch_size,
                config.relay_interval,
            );
            let task = tokio::spawn(async move { relay.run(shutdown_rx).await });
            (None, Some(task))
        }
    };

    let addresses = Arc::new(PgAddressRepository::new(pool));
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::clone(&addresses) as Arc<dyn AddressRepository>,
        addresses,
        event_store,
        inline_publisher,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server has drained; stop the relay after its current pass.
    let _ = shutdown_tx.send(true);
    if let Some(task) = relay_task {
        if let Err(e) = task.await {
            error!(error = %e, "outbox relay task failed");
        }
    }

    info!("vivah address API stopped");
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
