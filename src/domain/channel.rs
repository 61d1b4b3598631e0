// src/domain/channel.rs

//! Device channel domain abstractions.
//!
//! This module defines the interface the agent uses to talk to a remote
//! device-management endpoint. It intentionally avoids any reference to
//! concrete protocols, client libraries or wire formats: activation, secure
//! transport, framing and server-side alerting all live behind it.
//!
//! Three seams are defined:
//!
//! - [`ChannelFactory`] turns [`Credentials`] into an authenticated handle.
//! - [`DeviceChannel`] is that handle: activation, model lookup, virtual
//!   device creation and close.
//! - [`VirtualDevice`] is the remote-side view of one device's attributes.
//!
//! Concrete implementations live under `src/channel/`.

use std::fmt;
use std::sync::Arc;

use crate::{AttributeUpdate, Credentials, DeviceModel, Result};

/// A delivery failure reported after an update was acknowledged.
///
/// Handed to the [`ErrorCallback`] registered on a [`VirtualDevice`].
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    /// Endpoint of the virtual device that owned the failed update.
    pub endpoint_id: Arc<str>,

    /// Human-readable failure text from the endpoint.
    pub message: String,

    /// The update that failed, when the endpoint reports it.
    pub update: Option<AttributeUpdate>,
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint_id, self.message)
    }
}

/// Handler for asynchronous delivery failures.
///
/// Invoked by the channel's own delivery machinery, possibly on a task the
/// caller does not own. Implementations must only observe the event; they
/// must not assume they run on the agent's task.
pub type ErrorCallback = Arc<dyn Fn(ErrorEvent) + Send + Sync>;

/// Remote-side representation of one device's attributes.
#[async_trait::async_trait]
pub trait VirtualDevice: Send + Sync {
    // ---
    /// Endpoint id the device is bound to.
    fn endpoint_id(&self) -> &str;

    /// The model the device implements.
    fn model(&self) -> &DeviceModel;

    /// Submit `update` and wait until the endpoint acknowledges it.
    ///
    /// An `Ok` means the endpoint accepted the update. A later server-side
    /// failure for the same update is reported through the error callback,
    /// not through this return value.
    async fn apply(&self, update: AttributeUpdate) -> Result<()>;

    /// Register the handler for asynchronous delivery failures.
    ///
    /// Replaces any previously registered handler.
    fn set_on_error(&self, callback: ErrorCallback);
}

/// Shared virtual device pointer.
pub type VirtualDevicePtr = Arc<dyn VirtualDevice>;

/// An authenticated handle to a device-management endpoint.
///
/// A handle is acquired once per run and released exactly once through
/// [`DeviceChannel::close`]. Operations after `close()` fail with
/// [`Error::Closed`](crate::Error::Closed).
#[async_trait::async_trait]
pub trait DeviceChannel: Send + Sync {
    // ---
    /// Endpoint id this handle authenticated as.
    fn endpoint_id(&self) -> &str;

    /// Whether the endpoint has already been activated.
    async fn is_activated(&self) -> Result<bool>;

    /// Activate the endpoint under `model_urn`.
    async fn activate(&self, model_urn: &str) -> Result<()>;

    /// Fetch a device model by URN.
    async fn device_model(&self, model_urn: &str) -> Result<DeviceModel>;

    /// Create the virtual device for `(endpoint_id, model)`.
    async fn create_virtual_device(
        &self,
        endpoint_id: &str,
        model: &DeviceModel,
    ) -> Result<VirtualDevicePtr>;

    /// Release the handle and anything it holds.
    async fn close(&self) -> Result<()>;
}

/// Shared device channel pointer.
///
/// Cloning is cheap and every clone refers to the same handle.
pub type DeviceChannelPtr = Arc<dyn DeviceChannel>;

/// Builds device channels from credentials.
#[async_trait::async_trait]
pub trait ChannelFactory: Send + Sync {
    /// Authenticate against the endpoint and return a handle.
    async fn connect(&self, credentials: &Credentials) -> Result<DeviceChannelPtr>;
}

impl dyn VirtualDevice {
    // ---

    /// Set a single attribute and wait for the acknowledgement.
    pub async fn set(
        &self,
        attribute: impl Into<String>,
        value: impl Into<crate::AttributeValue>,
    ) -> Result<()> {
        self.apply(AttributeUpdate::single(attribute, value)).await
    }

    /// Start a multi-attribute update. See [`UpdateBuilder`](crate::UpdateBuilder).
    pub fn update(&self) -> crate::UpdateBuilder<'_> {
        crate::UpdateBuilder::new(self)
    }
}
