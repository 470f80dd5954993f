//! In-memory address stores.
//!
//! Compiled for this crate's tests and, through the `test-support` feature,
//! for the tests of downstream crates.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::error;
use vivah_core::error::DomainError;
use vivah_core::event_store::{EventStore, StoredEvent};

use crate::domain::aggregates::{Address, AddressFields};
use crate::domain::repository::{
    AddressRepository, AddressUnitOfWork, EventBuilder, ReplicaAddressStore,
};

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Infrastructure("address store lock poisoned".into())
}

/// Primary store backed by a map. Ids start at 1, like a `BIGSERIAL` column.
#[derive(Debug)]
pub struct InMemoryAddressRepository {
    inner: Mutex<(i64, BTreeMap<i64, Address>)>,
}

impl Default for InMemoryAddressRepository {
    fn default() -> Self {
        Self {
            inner: Mutex::new((1, BTreeMap::new())),
        }
    }
}

impl InMemoryAddressRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `addresses`; new ids continue after
    /// the highest one given.
    #[must_use]
    pub fn with_addresses(addresses: Vec<Address>) -> Self {
        let next_id = addresses.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let map = addresses.into_iter().map(|a| (a.id, a)).collect();
        Self {
            inner: Mutex::new((next_id, map)),
        }
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn add(&self, user_id: i64, fields: &AddressFields) -> Result<Address, DomainError> {
        let mut guard = self.inner.lock().map_err(poisoned)?;
        let (next_id, map) = &mut *guard;
        let address = Address::new(*next_id, user_id, fields.clone());
        *next_id += 1;
        map.insert(address.id, address.clone());
        Ok(address)
    }

    async fn update(&self, address: &Address) -> Result<(), DomainError> {
        let mut guard = self.inner.lock().map_err(poisoned)?;
        match guard.1.get_mut(&address.id) {
            Some(slot) => {
                *slot = address.clone();
                Ok(())
            }
            None => Err(DomainError::AggregateNotFound(address.id)),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError> {
        let mut guard = self.inner.lock().map_err(poisoned)?;
        guard
            .1
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::AggregateNotFound(id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError> {
        let guard = self.inner.lock().map_err(poisoned)?;
        Ok(guard.1.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Address>, DomainError> {
        let guard = self.inner.lock().map_err(poisoned)?;
        Ok(guard.1.values().cloned().collect())
    }
}

/// Unit of work over a separate repository and event store.
///
/// The primary write and the append are two calls with nothing shared
/// between them: an append failure leaves the primary write in place.
pub struct SequentialUnitOfWork {
    addresses: Arc<dyn AddressRepository>,
    event_store: Arc<dyn EventStore>,
}

impl SequentialUnitOfWork {
    /// Creates a unit of work writing `addresses` and then `event_store`.
    #[must_use]
    pub fn new(addresses: Arc<dyn AddressRepository>, event_store: Arc<dyn EventStore>) -> Self {
        Self {
            addresses,
            event_store,
        }
    }

    async fn append(
        &self,
        address: &Address,
        event: EventBuilder<'_>,
    ) -> Result<StoredEvent, DomainError> {
        let new_event = event(address)?;
        self.event_store.append(new_event).await.map_err(|e| {
            error!(
                address_id = address.id,
                error = %e,
                "event append failed after primary write; event store and primary store diverge"
            );
            e
        })
    }
}

#[async_trait]
impl AddressUnitOfWork for SequentialUnitOfWork {
    async fn record_create(
        &self,
        user_id: i64,
        fields: &AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError> {
        let address = self.addresses.add(user_id, fields).await?;
        let stored = self.append(&address, event).await?;
        Ok((address, stored))
    }

    async fn record_update(
        &self,
        id: i64,
        fields: AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError> {
        let mut address = self
            .addresses
            .get_by_id(id)
            .await?
            .ok_or(DomainError::AggregateNotFound(id))?;
        address.apply_fields(fields);
        self.addresses.update(&address).await?;
        let stored = self.append(&address, event).await?;
        Ok((address, stored))
    }

    async fn record_delete(
        &self,
        id: i64,
        event: EventBuilder<'_>,
    ) -> Result<StoredEvent, DomainError> {
        let address = self
            .addresses
            .get_by_id(id)
            .await?
            .ok_or(DomainError::AggregateNotFound(id))?;
        self.addresses.delete_by_id(id).await?;
        self.append(&address, event).await
    }
}

/// Replica store backed by a map keyed by the primary id.
#[derive(Debug, Default)]
pub struct InMemoryReplicaStore {
    records: Mutex<BTreeMap<i64, Address>>,
}

impl InMemoryReplicaStore {
    /// Creates an empty replica.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReplicaAddressStore for InMemoryReplicaStore {
    async fn insert(&self, address: &Address) -> Result<(), DomainError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        if records.contains_key(&address.id) {
            return Err(DomainError::AlreadyExists(address.id));
        }
        records.insert(address.id, address.clone());
        Ok(())
    }

    async fn update(&self, address: &Address) -> Result<(), DomainError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        match records.get_mut(&address.id) {
            Some(slot) => {
                *slot = address.clone();
                Ok(())
            }
            None => Err(DomainError::AggregateNotFound(address.id)),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::AggregateNotFound(id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError> {
        let records = self.records.lock().map_err(poisoned)?;
        Ok(records.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Address>, DomainError> {
        let records = self.records.lock().map_err(poisoned)?;
        Ok(records.values().cloned().collect())
    }
}
