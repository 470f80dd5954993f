//! Vivah — Address bounded context.
//!
//! Owns the address aggregate in the primary store, records every change as
//! an immutable event, publishes it on the bus and maintains the replica on
//! the consuming side.

pub mod application;
pub mod domain;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
