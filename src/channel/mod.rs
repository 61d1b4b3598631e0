//! Device channel implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `DeviceChannel` trait. Agent code must not depend on channel-specific
//! types beyond the constructor surface re-exported here.

mod memory;

pub use memory::{EndpointEvent, SimulatedEndpoint};
