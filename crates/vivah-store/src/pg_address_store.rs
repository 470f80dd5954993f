//! `PostgreSQL` address stores.
//!
//! [`PgAddressRepository`] owns the primary `addresses` table and lets the
//! database assign ids. As an [`AddressUnitOfWork`] it writes the address and
//! appends the event in one transaction; updates and deletes lock the row
//! first, so events for one address are appended in the order its writes
//! commit. [`PgReplicaAddressStore`] writes `replica_addresses` in a separate
//! database, always under the primary's id.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use vivah_address::domain::aggregates::{Address, AddressFields};
use vivah_address::domain::repository::{
    AddressRepository, AddressUnitOfWork, EventBuilder, ReplicaAddressStore,
};
use vivah_core::error::DomainError;
use vivah_core::event_store::StoredEvent;

use crate::infrastructure;
use crate::pg_event_store::append_in_transaction;

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    user_id: i64,
    street: Option<String>,
    city: String,
    state: String,
    country: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            street: row.street,
            city: row.city,
            state: row.state,
            country: row.country,
        }
    }
}

/// PostgreSQL-backed primary address store.
#[derive(Debug, Clone)]
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    /// Creates a new `PgAddressRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| infrastructure("failed to begin address transaction", &e))
    }

    async fn lock_for_write(
        tx: &mut Transaction<'static, Postgres>,
        id: i64,
    ) -> Result<Address, DomainError> {
        let row: Option<AddressRow> = sqlx::query_as(
            "SELECT id, user_id, street, city, state, country
             FROM addresses WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| infrastructure("failed to lock address", &e))?;

        row.map(Address::from)
            .ok_or(DomainError::AggregateNotFound(id))
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn add(&self, user_id: i64, fields: &AddressFields) -> Result<Address, DomainError> {
        let row: AddressRow = sqlx::query_as(
            "INSERT INTO addresses (user_id, street, city, state, country)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, street, city, state, country",
        )
        .bind(user_id)
        .bind(fields.street())
        .bind(fields.city())
        .bind(fields.state())
        .bind(fields.country())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to insert address", &e))?;

        Ok(row.into())
    }

    async fn update(&self, address: &Address) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE addresses
             SET street = $2, city = $3, state = $4, country = $5
             WHERE id = $1",
        )
        .bind(address.id)
        .bind(address.street.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to update address", &e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AggregateNotFound(address.id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| infrastructure("failed to delete address", &e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AggregateNotFound(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError> {
        let row: Option<AddressRow> = sqlx::query_as(
            "SELECT id, user_id, street, city, state, country FROM addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load address", &e))?;

        Ok(row.map(Address::from))
    }

    async fn get_all(&self) -> Result<Vec<Address>, DomainError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            "SELECT id, user_id, street, city, state, country FROM addresses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load addresses", &e))?;

        Ok(rows.into_iter().map(Address::from).collect())
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| infrastructure("failed to commit address transaction", &e))
}

#[async_trait]
impl AddressUnitOfWork for PgAddressRepository {
    async fn record_create(
        &self,
        user_id: i64,
        fields: &AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError> {
        let mut tx = self.begin().await?;
        let row: AddressRow = sqlx::query_as(
            "INSERT INTO addresses (user_id, street, city, state, country)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, street, city, state, country",
        )
        .bind(user_id)
        .bind(fields.street())
        .bind(fields.city())
        .bind(fields.state())
        .bind(fields.country())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| infrastructure("failed to insert address", &e))?;

        let address = Address::from(row);
        let stored = append_in_transaction(&mut tx, &event(&address)?).await?;
        commit(tx).await?;
        Ok((address, stored))
    }

    async fn record_update(
        &self,
        id: i64,
        fields: AddressFields,
        event: EventBuilder<'_>,
    ) -> Result<(Address, StoredEvent), DomainError> {
        let mut tx = self.begin().await?;
        let mut address = Self::lock_for_write(&mut tx, id).await?;
        address.apply_fields(fields);

        sqlx::query(
            "UPDATE addresses
             SET street = $2, city = $3, state = $4, country = $5
             WHERE id = $1",
        )
        .bind(address.id)
        .bind(address.street.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .execute(&mut *tx)
        .await
        .map_err(|e| infrastructure("failed to update address", &e))?;

        let stored = append_in_transaction(&mut tx, &event(&address)?).await?;
        commit(tx).await?;
        Ok((address, stored))
    }

    async fn record_delete(
        &self,
        id: i64,
        event: EventBuilder<'_>,
    ) -> Result<StoredEvent, DomainError> {
        let mut tx = self.begin().await?;
        let address = Self::lock_for_write(&mut tx, id).await?;

        sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| infrastructure("failed to delete address", &e))?;

        let stored = append_in_transaction(&mut tx, &event(&address)?).await?;
        commit(tx).await?;
        Ok(stored)
    }
}

/// PostgreSQL-backed replica address store.
#[derive(Debug, Clone)]
pub struct PgReplicaAddressStore {
    pool: PgPool,
}

impl PgReplicaAddressStore {
    /// Creates a new `PgReplicaAddressStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReplicaAddressStore for PgReplicaAddressStore {
    async fn insert(&self, address: &Address) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO replica_addresses (id, user_id, street, city, state, country)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(address.street.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::AlreadyExists(address.id);
                }
            }
            infrastructure("failed to insert replica address", &e)
        })?;

        Ok(())
    }

    async fn update(&self, address: &Address) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE replica_addresses
             SET user_id = $2, street = $3, city = $4, state = $5, country = $6
             WHERE id = $1",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(address.street.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to update replica address", &e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AggregateNotFound(address.id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM replica_addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| infrastructure("failed to delete replica address", &e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AggregateNotFound(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Address>, DomainError> {
        let row: Option<AddressRow> = sqlx::query_as(
            "SELECT id, user_id, street, city, state, country FROM replica_addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load replica address", &e))?;

        Ok(row.map(Address::from))
    }

    async fn get_all(&self) -> Result<Vec<Address>, DomainError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            "SELECT id, user_id, street, city, state, country FROM replica_addresses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("failed to load replica addresses", &e))?;

        Ok(rows.into_iter().map(Address::from).collect())
    }
}
