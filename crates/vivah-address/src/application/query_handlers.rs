//! Query handlers for the Address context.
//!
//! Address queries read the primary store directly; they never consult the
//! event store or the replica. The event query serves audit and replay.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vivah_core::error::DomainError;
use vivah_core::event_store::EventStore;

use crate::domain::aggregates::Address;
use crate::domain::repository::AddressRepository;

/// Read-only view of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressView {
    /// The address identifier.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// Street line, if any.
    pub street: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
}

impl From<Address> for AddressView {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            user_id: address.user_id,
            street: address.street,
            city: address.city,
            state: address.state,
            country: address.country,
        }
    }
}

/// Read-only view of a stored event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    /// Store-assigned identifier.
    pub event_id: i64,
    /// Aggregate the event belongs to.
    pub aggregate_id: i64,
    /// Event type tag.
    pub event_type: String,
    /// Decoded event payload.
    pub event_data: serde_json::Value,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Retrieves an address by id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the address does not exist.
pub async fn get_address_by_id(
    address_id: i64,
    addresses: &dyn AddressRepository,
) -> Result<AddressView, DomainError> {
    addresses
        .get_by_id(address_id)
        .await?
        .map(AddressView::from)
        .ok_or(DomainError::AggregateNotFound(address_id))
}

/// Retrieves every address, ordered by id.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store cannot be read.
pub async fn get_all_addresses(
    addresses: &dyn AddressRepository,
) -> Result<Vec<AddressView>, DomainError> {
    let all = addresses.get_all().await?;
    Ok(all.into_iter().map(AddressView::from).collect())
}

/// Retrieves every stored event with the given type tag, in insertion order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store cannot be read or a
/// stored payload is not JSON.
pub async fn get_events_by_type(
    event_type: &str,
    event_store: &dyn EventStore,
) -> Result<Vec<EventView>, DomainError> {
    event_store
        .query_by_type(event_type)
        .await?
        .into_iter()
        .map(|stored| {
            Ok(EventView {
                event_data: stored.decode()?,
                event_id: stored.event_id,
                aggregate_id: stored.aggregate_id,
                event_type: stored.event_type,
                created_at: stored.created_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;
    use vivah_core::error::DomainError;
    use vivah_test_support::{FailingEventStore, FixedClock, InMemoryEventStore};

    use super::*;
    use crate::application::command_handlers::{handle_create_address, handle_update_address};
    use crate::domain::commands::{CreateAddress, UpdateAddress};
    use crate::memory::{InMemoryAddressRepository, SequentialUnitOfWork};

    fn address(id: i64, city: &str) -> Address {
        Address {
            id,
            user_id: 5,
            street: None,
            city: city.to_owned(),
            state: "MH".to_owned(),
            country: "India".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_get_address_by_id_returns_view() {
        // Arrange
        let repo = InMemoryAddressRepository::with_addresses(vec![address(1, "Pune")]);

        // Act
        let view = get_address_by_id(1, &repo).await.unwrap();

        // Assert
        assert_eq!(view.id, 1);
        assert_eq!(view.user_id, 5);
        assert_eq!(view.city, "Pune");
        assert_eq!(view.street, None);
    }

    #[tokio::test]
    async fn test_get_address_by_id_returns_not_found() {
        let repo = InMemoryAddressRepository::new();

        let result = get_address_by_id(7, &repo).await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, 7),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_all_addresses_orders_by_id() {
        let repo = InMemoryAddressRepository::with_addresses(vec![
            address(3, "Nagpur"),
            address(1, "Pune"),
        ]);

        let views = get_all_addresses(&repo).await.unwrap();

        let ids: Vec<i64> = views.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_get_events_by_type_returns_only_matching_events_in_order() {
        // Arrange
        let clock = FixedClock::standard();
        let event_store = Arc::new(InMemoryEventStore::new());
        let writes = SequentialUnitOfWork::new(
            Arc::new(InMemoryAddressRepository::new()),
            Arc::clone(&event_store) as Arc<dyn EventStore>,
        );
        for city in ["Pune", "Nagpur"] {
            let command = CreateAddress {
                correlation_id: Uuid::new_v4(),
                user_id: 5,
                street: None,
                city: city.to_owned(),
                state: "MH".to_owned(),
                country: "India".to_owned(),
            };
            handle_create_address(&command, &clock, &writes, None)
                .await
                .unwrap();
        }
        let update = UpdateAddress {
            correlation_id: Uuid::new_v4(),
            address_id: 1,
            street: None,
            city: "Mumbai".to_owned(),
            state: "MH".to_owned(),
            country: "India".to_owned(),
        };
        handle_update_address(&update, &clock, &writes, None)
            .await
            .unwrap();

        // Act
        let created = get_events_by_type("AddressCreatedEvent", event_store.as_ref())
            .await
            .unwrap();
        let updated = get_events_by_type("AddressUpdatedEvent", event_store.as_ref())
            .await
            .unwrap();

        // Assert
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|e| e.event_type == "AddressCreatedEvent"));
        assert_eq!(created[0].event_data["City"], json!("Pune"));
        assert_eq!(created[1].event_data["City"], json!("Nagpur"));
        assert!(created[0].event_id < created[1].event_id);
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].aggregate_id, 1);
    }

    #[tokio::test]
    async fn test_get_events_by_type_unknown_tag_is_empty() {
        let event_store = InMemoryEventStore::new();

        let events = get_events_by_type("AddressArchivedEvent", &event_store)
            .await
            .unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_get_events_by_type_propagates_store_failure() {
        let result = get_events_by_type("AddressCreatedEvent", &FailingEventStore).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
