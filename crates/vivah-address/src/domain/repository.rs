//! Storage contracts for addresses.
//!
//! The primary store owns addresses and assigns their ids. The replica store
//! is a separate database maintained only by the replica consumer; it stores
//! records under the primary's id and never assigns its own.
//!
//! Command handlers write through [`AddressUnitOfWork`], which pairs each
//! primary write with the append of its event.

use async_trait::async_trait;
use vivah_core::error::DomainError;
use vivah_core::event_store::{NewEvent, StoredEvent};

use super::aggregates::{Address, AddressFields};

/// The primary address store.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Inserts a new address and returns it with its assigned id.
    async fn add(&self, user_id: i64, fields: &AddressFields) -> Result<Address, DomainError>;

    /// Overwrites a stored address.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn update(&self, address: &Address) -> Result<(), DomainError>;

    /// Removes an address.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError>;

    /// Loads one address.
    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError>;

    /// Loads every address, ordered by id.
    async fn get_all(&self) -> Result<Vec<Address>, DomainError>;
}

/// Builds the event for a primary write from the address as written.
pub type EventBuilder<'a> = &'a (dyn Fn(&Address) -> Result<NewEvent, DomainError> + Send + Sync);

/// Applies a primary write together with the append of its event.
///
/// Implementations that can share a transaction commit both or neither, and
/// serialize writes to one address so its events are appended in the order
/// the primary store applied them.
#[async_trait]
pub trait AddressUnitOfWork: Send + Sync {
    /// Inserts a new address and appends the event built from it.
    async fn record_create(
        &self,
        user_id: i64,
        fields: &AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError>;

    /// Overwrites the mutable fields of an address and appends the event
    /// built from the result. The user id is kept.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn record_update(
        &self,
        id: i64,
        fields: AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError>;

    /// Removes an address and appends the event built from the removed record.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn record_delete(
        &self,
        id: i64,
        event: EventBuilder<'_>,
    ) -> Result<StoredEvent, DomainError>;
}

/// The replica address store.
#[async_trait]
pub trait ReplicaAddressStore: Send + Sync {
    /// Inserts an address under its primary id.
    ///
    /// Returns `DomainError::AlreadyExists` if the id is already stored.
    async fn insert(&self, address: &Address) -> Result<(), DomainError>;

    /// Overwrites the record with the address's primary id.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn update(&self, address: &Address) -> Result<(), DomainError>;

    /// Removes the record with the given primary id.
    ///
    /// Returns `DomainError::AggregateNotFound` if the id is not stored.
    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError>;

    /// Loads one replica record.
    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError>;

    /// Loads every replica record, ordered by id.
    async fn get_all(&self) -> Result<Vec<Address>, DomainError>;
}
