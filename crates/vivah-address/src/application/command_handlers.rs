//! Command handlers for the Address context.
//!
//! Each handler validates its command, writes the primary store and appends
//! the matching event through an [`AddressUnitOfWork`], then, when a
//! publisher is given, publishes the event keyed by the address id.

use tracing::{error, info, warn};
use vivah_core::bus::{BusError, EventPublisher, publish_json};
use vivah_core::clock::Clock;
use vivah_core::command::Command;
use vivah_core::error::DomainError;
use vivah_core::event_store::{NewEvent, StoredEvent};

use crate::domain::aggregates::{Address, AddressFields};
use crate::domain::commands::{CreateAddress, DeleteAddress, UpdateAddress};
use crate::domain::envelope::AddressEnvelope;
use crate::domain::events::{AddressCreated, AddressDeleted, AddressEvent, AddressUpdated};
use crate::domain::repository::AddressUnitOfWork;

/// Publishes a stored event as an envelope keyed by its aggregate id.
///
/// # Errors
///
/// Returns `BusError::Serialization` if the stored payload cannot be turned
/// into an envelope, or the publisher's error if the send fails.
pub async fn publish_stored_event(
    publisher: &dyn EventPublisher,
    stored: &StoredEvent,
) -> Result<(), BusError> {
    let envelope =
        AddressEnvelope::from_stored(stored).map_err(|e| BusError::Serialization(e.to_string()))?;
    publish_json(publisher, &stored.aggregate_id.to_string(), &envelope).await
}

/// Publishes `stored` if a publisher is given. A failure is logged and
/// swallowed.
async fn publish_recorded(
    command: &dyn Command,
    stored: &StoredEvent,
    publisher: Option<&dyn EventPublisher>,
) {
    let Some(publisher) = publisher else {
        return;
    };

    match publish_stored_event(publisher, stored).await {
        Ok(()) => info!(
            correlation_id = %command.correlation_id(),
            event_id = stored.event_id,
            event_type = %stored.event_type,
            address_id = stored.aggregate_id,
            topic = publisher.topic(),
            "event published"
        ),
        Err(e) => error!(
            correlation_id = %command.correlation_id(),
            event_id = stored.event_id,
            event_type = %stored.event_type,
            address_id = stored.aggregate_id,
            error = %e,
            "event publish failed; replica will not see this change until relayed"
        ),
    }
}

fn not_found(command: &dyn Command, address_id: i64) -> DomainError {
    warn!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        address_id,
        "command rejected: address not found"
    );
    DomainError::AggregateNotFound(address_id)
}

/// Handles the `CreateAddress` command: validates the fields, inserts the
/// address with its `AddressCreatedEvent` and publishes the event.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid fields, or
/// `DomainError::Infrastructure` if the insert or the event append fails.
pub async fn handle_create_address(
    command: &CreateAddress,
    clock: &dyn Clock,
    writes: &dyn AddressUnitOfWork,
    publisher: Option<&dyn EventPublisher>,
) -> Result<Address, DomainError> {
    let fields = AddressFields::new(
        command.street.as_deref(),
        &command.city,
        &command.state,
        &command.country,
    )?;

    let created = |address: &Address| {
        let event = AddressEvent::Created(AddressCreated::from(address));
        NewEvent::from_domain_event(&event, clock)
    };
    let (address, stored) = writes.record_create(command.user_id, &fields, &created).await?;
    info!(
        correlation_id = %command.correlation_id,
        address_id = address.id,
        user_id = address.user_id,
        event_id = stored.event_id,
        "address created"
    );

    publish_recorded(command, &stored, publisher).await;
    Ok(address)
}

/// Handles the `UpdateAddress` command: validates the fields, overwrites the
/// address, records an `AddressUpdatedEvent` and publishes it.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid fields,
/// `DomainError::AggregateNotFound` if the address does not exist, or
/// `DomainError::Infrastructure` if persistence fails.
pub async fn handle_update_address(
    command: &UpdateAddress,
    clock: &dyn Clock,
    writes: &dyn AddressUnitOfWork,
    publisher: Option<&dyn EventPublisher>,
) -> Result<Address, DomainError> {
    let fields = AddressFields::new(
        command.street.as_deref(),
        &command.city,
        &command.state,
        &command.country,
    )?;

    let updated = |address: &Address| {
        let event = AddressEvent::Updated(AddressUpdated::from(address));
        NewEvent::from_domain_event(&event, clock)
    };
    let (address, stored) = match writes
        .record_update(command.address_id, fields, &updated)
        .await
    {
        Err(DomainError::AggregateNotFound(id)) => return Err(not_found(command, id)),
        other => other?,
    };
    info!(
        correlation_id = %command.correlation_id,
        address_id = address.id,
        event_id = stored.event_id,
        "address updated"
    );

    publish_recorded(command, &stored, publisher).await;
    Ok(address)
}

/// Handles the `DeleteAddress` command: deletes the address, records an
/// `AddressDeletedEvent` and publishes it.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the address does not exist,
/// or `DomainError::Infrastructure` if persistence fails.
pub async fn handle_delete_address(
    command: &DeleteAddress,
    clock: &dyn Clock,
    writes: &dyn AddressUnitOfWork,
    publisher: Option<&dyn EventPublisher>,
) -> Result<(), DomainError> {
    let deleted = |address: &Address| {
        let event = AddressEvent::Deleted(AddressDeleted { id: address.id });
        NewEvent::from_domain_event(&event, clock)
    };
    let stored = match writes.record_delete(command.address_id, &deleted).await {
        Err(DomainError::AggregateNotFound(id)) => return Err(not_found(command, id)),
        other => other?,
    };
    info!(
        correlation_id = %command.correlation_id,
        address_id = command.address_id,
        event_id = stored.event_id,
        "address deleted"
    );

    publish_recorded(command, &stored, publisher).await;
    Ok(())
}
