//! Integration tests for `PgEventStore`.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use vivah_core::event_store::{EventStore, NewEvent};
use vivah_store::pg_event_store::PgEventStore;

fn make_new_event(aggregate_id: i64, event_type: &str, event_data: &str) -> NewEvent {
    NewEvent {
        aggregate_id,
        event_type: event_type.to_owned(),
        event_data: event_data.to_owned(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    }
}

// --- append ---

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_append_assigns_increasing_ids_and_keeps_fields(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let payload = r#"{"Id":1,"UserId":5,"Street":null,"City":"Pune","State":"MH","Country":"India"}"#;

    let first = store
        .append(make_new_event(1, "AddressCreatedEvent", payload))
        .await
        .unwrap();
    let second = store
        .append(make_new_event(1, "AddressDeletedEvent", r#"{"Id":1}"#))
        .await
        .unwrap();

    assert!(second.event_id > first.event_id);
    assert_eq!(first.aggregate_id, 1);
    assert_eq!(first.event_type, "AddressCreatedEvent");
    assert_eq!(first.event_data, payload);
    assert_eq!(
        first.created_at,
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    );
}

// --- query_by_type ---

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_query_by_type_returns_exact_matches_in_insertion_order(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store
        .append(make_new_event(1, "AddressCreatedEvent", r#"{"Id":1}"#))
        .await
        .unwrap();
    store
        .append(make_new_event(1, "AddressUpdatedEvent", r#"{"Id":1}"#))
        .await
        .unwrap();
    store
        .append(make_new_event(2, "AddressCreatedEvent", r#"{"Id":2}"#))
        .await
        .unwrap();

    let created = store.query_by_type("AddressCreatedEvent").await.unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].aggregate_id, 1);
    assert_eq!(created[1].aggregate_id, 2);
    assert!(created[0].event_id < created[1].event_id);
}

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_query_by_type_is_case_sensitive(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store
        .append(make_new_event(1, "AddressCreatedEvent", r#"{"Id":1}"#))
        .await
        .unwrap();

    let events = store.query_by_type("addresscreatedevent").await.unwrap();

    assert!(events.is_empty());
}

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_stored_payload_decodes(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store
        .append(make_new_event(7, "AddressDeletedEvent", r#"{"Id":7}"#))
        .await
        .unwrap();

    let events = store.query_by_type("AddressDeletedEvent").await.unwrap();
    let payload: serde_json::Value = events[0].decode().unwrap();

    assert_eq!(payload, serde_json::json!({ "Id": 7 }));
}

// --- load_after ---

#[sqlx::test(migrations = "../../migrations/primary")]
async fn test_load_after_skips_delivered_events_and_honours_limit(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let mut ids = Vec::new();
    for aggregate_id in 1..=4 {
        let stored = store
            .append(make_new_event(aggregate_id, "AddressCreatedEvent", "{}"))
            .await
            .unwrap();
        ids.push(stored.event_id);
    }

    let pending = store.load_after(ids[0], 2).await.unwrap();

    let pending_ids: Vec<i64> = pending.iter().map(|e| e.event_id).collect();
    assert_eq!(pending_ids, vec![ids[1], ids[2]]);
}
