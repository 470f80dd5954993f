//! Liveness endpoint.
//!
//! Besides status and version it reports how events leave this process:
//! `direct` when handlers publish inline, `outbox` when the relay does.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers.
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
    /// `direct` or `outbox`.
    pub delivery: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let delivery = if state.publisher.is_some() {
        "direct"
    } else {
        "outbox"
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        delivery,
    })
}

/// Returns the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use vivah_address::domain::repository::AddressRepository;
    use vivah_address::memory::{InMemoryAddressRepository, SequentialUnitOfWork};
    use vivah_core::bus::EventPublisher;
    use vivah_core::event_store::EventStore;
    use vivah_test_support::{FixedClock, InMemoryEventStore, RecordingPublisher};

    use super::*;

    async fn health(publisher: Option<Arc<dyn EventPublisher>>) -> (StatusCode, Value) {
        let addresses: Arc<dyn AddressRepository> = Arc::new(InMemoryAddressRepository::new());
        let event_store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
        let state = AppState::new(
            Arc::new(FixedClock::standard()),
            Arc::clone(&addresses),
            Arc::new(SequentialUnitOfWork::new(addresses, Arc::clone(&event_store))),
            event_store,
            publisher,
        );
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = router().with_state(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_direct_delivery_with_inline_publisher() {
        let publisher: Arc<dyn EventPublisher> = Arc::new(RecordingPublisher::new());

        let (status, json) = health(Some(publisher)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["delivery"], "direct");
    }

    #[tokio::test]
    async fn test_health_reports_outbox_delivery_without_publisher() {
        let (_, json) = health(None).await;

        assert_eq!(json["delivery"], "outbox");
    }
}
