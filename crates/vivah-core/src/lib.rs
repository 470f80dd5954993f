//! Vivah Core — shared abstractions.
//!
//! This crate defines the traits and types that the address pipeline and its
//! infrastructure adapters depend on: the event store, the event bus and the
//! relay checkpoint. It contains no infrastructure code and knows nothing
//! about any particular aggregate.

pub mod bus;
pub mod checkpoint;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod event_store;
