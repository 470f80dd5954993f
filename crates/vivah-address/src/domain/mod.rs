//! Domain model for the Address context.

pub mod aggregates;
pub mod commands;
pub mod envelope;
pub mod events;
pub mod repository;
