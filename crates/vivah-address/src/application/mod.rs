//! Application services for the Address context.

pub mod command_handlers;
pub mod query_handlers;
pub mod relay;
pub mod replication;
