//! Integration tests for the address and event routes over Postgres.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use vivah_test_support::RecordingPublisher;

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_create_update_delete_lifecycle(pool: PgPool) {
    // Arrange
    let publisher = Arc::new(RecordingPublisher::new());
    let app = common::build_test_app_with_publisher(pool, Some(publisher.clone()));

    // Act
    let (created_status, created) = common::post_json(
        app.clone(),
        "/api/v1/addresses",
        &json!({ "user_id": 5, "city": "Pune", "state": "MH", "country": "India" }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let (updated_status, updated) = common::put_json(
        app.clone(),
        &format!("/api/v1/addresses/{id}"),
        &json!({ "city": "Mumbai", "state": "MH", "country": "India" }),
    )
    .await;
    let (deleted_status, _) = common::delete(app.clone(), &format!("/api/v1/addresses/{id}")).await;
    let (get_status, _) = common::get_json(app, &format!("/api/v1/addresses/{id}")).await;

    // Assert
    assert_eq!(created_status, StatusCode::CREATED);
    assert_eq!(created["city"], "Pune");
    assert_eq!(updated_status, StatusCode::OK);
    assert_eq!(updated["city"], "Mumbai");
    assert_eq!(updated["user_id"], 5);
    assert_eq!(deleted_status, StatusCode::NO_CONTENT);
    assert_eq!(get_status, StatusCode::NOT_FOUND);

    let published = publisher.published_json();
    let event_types: Vec<&str> = published
        .iter()
        .map(|(_, body)| body["EventType"].as_str().unwrap())
        .collect();
    assert_eq!(
        event_types,
        vec!["AddressCreatedEvent", "AddressUpdatedEvent", "AddressDeletedEvent"]
    );
    assert!(published.iter().all(|(key, _)| *key == id.to_string()));
}

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_events_endpoint_lists_appended_events(pool: PgPool) {
    // Arrange
    let app = common::build_test_app(pool);
    for city in ["Pune", "Nagpur"] {
        common::post_json(
            app.clone(),
            "/api/v1/addresses",
            &json!({ "user_id": 5, "city": city, "state": "MH", "country": "India" }),
        )
        .await;
    }

    // Act
    let (status, json) =
        common::get_json(app, "/api/v1/events?event_type=AddressCreatedEvent").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_data"]["City"], "Pune");
    assert_eq!(events[1]["event_data"]["City"], "Nagpur");
    assert_eq!(events[0]["created_at"], "2026-01-15T10:00:00Z");
}

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_list_addresses_returns_created_addresses(pool: PgPool) {
    let app = common::build_test_app(pool);
    common::post_json(
        app.clone(),
        "/api/v1/addresses",
        &json!({ "user_id": 5, "street": "FC Road", "city": "Pune", "state": "MH", "country": "India" }),
    )
    .await;

    let (status, json) = common::get_json(app, "/api/v1/addresses").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["street"], "FC Road");
}

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_delete_missing_address_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let (status, json) = common::delete(app, "/api/v1/addresses/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "aggregate_not_found");
}
