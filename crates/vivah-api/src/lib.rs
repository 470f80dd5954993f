//! Vivah address API.
//!
//! Exposes the address command and query handlers over HTTP and hosts the
//! outbox relay when events are delivered through the event store.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
