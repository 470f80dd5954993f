//! Domain events for the Address context.
//!
//! Field names are serialized in `PascalCase` because the payload doubles as
//! the `Address` object of the bus envelope.

use serde::{Deserialize, Serialize};
use vivah_core::error::DomainError;
use vivah_core::event::DomainEvent;

use super::aggregates::Address;

/// Type tag of [`AddressCreated`].
pub const ADDRESS_CREATED: &str = "AddressCreatedEvent";
/// Type tag of [`AddressUpdated`].
pub const ADDRESS_UPDATED: &str = "AddressUpdatedEvent";
/// Type tag of [`AddressDeleted`].
pub const ADDRESS_DELETED: &str = "AddressDeletedEvent";

/// Emitted when an address is created in the primary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressCreated {
    /// Primary store identifier.
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

/// Emitted when an address is overwritten in the primary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressUpdated {
    /// Primary store identifier.
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

/// Emitted when an address is removed from the primary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressDeleted {
    /// Primary store identifier.
    pub id: i64,
}

impl From<&Address> for AddressCreated {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            user_id: address.user_id,
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
        }
    }
}

impl From<&Address> for AddressUpdated {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            user_id: address.user_id,
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
        }
    }
}

impl From<AddressCreated> for Address {
    fn from(event: AddressCreated) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            street: event.street,
            city: event.city,
            state: event.state,
            country: event.country,
        }
    }
}

impl From<AddressUpdated> for Address {
    fn from(event: AddressUpdated) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            street: event.street,
            city: event.city,
            state: event.state,
            country: event.country,
        }
    }
}

/// Closed set of events emitted by the Address aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEvent {
    /// An address was created.
    Created(AddressCreated),
    /// An address was updated.
    Updated(AddressUpdated),
    /// An address was deleted.
    Deleted(AddressDeleted),
}

impl AddressEvent {
    /// Rebuilds an event from its type tag and JSON payload. Returns
    /// `Ok(None)` for tags this version does not know.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the tag is known but the payload does not
    /// have the expected shape.
    pub fn from_tagged(
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        let event = match event_type {
            ADDRESS_CREATED => Self::Created(serde_json::from_value(payload)?),
            ADDRESS_UPDATED => Self::Updated(serde_json::from_value(payload)?),
            ADDRESS_DELETED => Self::Deleted(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

impl DomainEvent for AddressEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => ADDRESS_CREATED,
            Self::Updated(_) => ADDRESS_UPDATED,
            Self::Deleted(_) => ADDRESS_DELETED,
        }
    }

    fn aggregate_id(&self) -> i64 {
        match self {
            Self::Created(e) => e.id,
            Self::Updated(e) => e.id,
            Self::Deleted(e) => e.id,
        }
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        let value = match self {
            Self::Created(e) => serde_json::to_value(e)?,
            Self::Updated(e) => serde_json::to_value(e)?,
            Self::Deleted(e) => serde_json::to_value(e)?,
        };
        Ok(value)
    }
}
