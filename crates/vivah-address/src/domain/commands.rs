//! Commands for the Address context.

use uuid::Uuid;
use vivah_core::command::Command;

/// Command to create an address for a user.
#[derive(Debug, Clone)]
pub struct CreateAddress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
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

impl Command for CreateAddress {
    fn command_type(&self) -> &'static str {
        "address.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to overwrite the fields of an existing address.
#[derive(Debug, Clone)]
pub struct UpdateAddress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The address to update.
    pub address_id: i64,
    /// Street line, if any.
    pub street: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
}

impl Command for UpdateAddress {
    fn command_type(&self) -> &'static str {
        "address.update"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete an address.
#[derive(Debug, Clone)]
pub struct DeleteAddress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The address to delete.
    pub address_id: i64,
}

impl Command for DeleteAddress {
    fn command_type(&self) -> &'static str {
        "address.delete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
