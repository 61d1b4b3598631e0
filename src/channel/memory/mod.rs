// src/channel/memory/mod.rs

//! In-memory device channel.
//!
//! This module provides a pure in-process implementation of the domain-level
//! `DeviceChannel` trait, backed by a [`SimulatedEndpoint`] that stands in for
//! the remote device-management server. It is intended for tests, local
//! demos, and as the reference for channel semantics.
//!
//! ## Reference Semantics
//!
//! - `connect()` authenticates against the endpoint's provisioned devices.
//! - `activate()` is required before models can be fetched or virtual
//!   devices created.
//! - `apply()` validates the update against the device model and returns
//!   only after the endpoint has recorded it.
//! - Range violations are accepted synchronously and reported afterwards
//!   through the device's error callback, from a separate task.
//! - After `close()`, every operation on the handle fails with `Closed`.
//!
//! ## Non-Goals
//!
//! No network behavior, persistence, or emulation of any particular vendor's
//! server. Failures happen only when injected through the endpoint.

mod channel;
mod endpoint;

pub use endpoint::{EndpointEvent, SimulatedEndpoint};
