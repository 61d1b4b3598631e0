// src/channel/memory/channel.rs

//! In-memory `DeviceChannel` and `VirtualDevice` implementations.
//!
//! Both delegate every remote-side decision to the shared
//! [`SimulatedEndpoint`]; they only own the per-handle state (closed flag,
//! registered error callback).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::endpoint::SimulatedEndpoint;
use crate::macros::{log_debug, log_warn};
use crate::{
    // ---
    AttributeUpdate,
    DeviceChannel,
    DeviceModel,
    Error,
    ErrorCallback,
    ErrorEvent,
    Result,
    VirtualDevice,
    VirtualDevicePtr,
};

/// Handle to a [`SimulatedEndpoint`] for one authenticated endpoint id.
pub(super) struct MemoryChannel {
    // ---
    endpoint_id: String,
    endpoint: SimulatedEndpoint,
    closed: Arc<AtomicBool>,
}

impl MemoryChannel {
    pub(super) fn new(endpoint_id: impl Into<String>, endpoint: SimulatedEndpoint) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            endpoint,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn ensure_activated(&self) -> Result<()> {
        if !self.endpoint.is_activated(&self.endpoint_id) {
            return Err(Error::NotActivated {
                endpoint_id: self.endpoint_id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DeviceChannel for MemoryChannel {
    // ---

    fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    async fn is_activated(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.endpoint.is_activated(&self.endpoint_id))
    }

    async fn activate(&self, model_urn: &str) -> Result<()> {
        self.ensure_open()?;
        self.endpoint.activate(&self.endpoint_id, model_urn)
    }

    async fn device_model(&self, model_urn: &str) -> Result<DeviceModel> {
        // ---
        self.ensure_open()?;
        self.ensure_activated()?;
        self.endpoint.model(model_urn)
    }

    /// Only the handle's own endpoint id can be bound; any other id is
    /// reported as not activated on this handle.
    async fn create_virtual_device(
        &self,
        endpoint_id: &str,
        model: &DeviceModel,
    ) -> Result<VirtualDevicePtr> {
        // ---
        self.ensure_open()?;
        self.ensure_activated()?;

        if endpoint_id != self.endpoint_id {
            return Err(Error::NotActivated {
                endpoint_id: endpoint_id.to_string(),
            });
        }

        self.endpoint.record_virtual_device(endpoint_id, &model.urn);

        Ok(Arc::new(MemoryVirtualDevice {
            endpoint_id: Arc::from(endpoint_id),
            model: model.clone(),
            endpoint: self.endpoint.clone(),
            closed: Arc::clone(&self.closed),
            on_error: RwLock::new(None),
        }))
    }

    async fn close(&self) -> Result<()> {
        // ---
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }
        self.endpoint.record_close(&self.endpoint_id);
        Ok(())
    }
}

/// Virtual device bound to a [`MemoryChannel`].
///
/// Shares the channel's closed flag, so closing the channel also stops the
/// device from accepting updates.
struct MemoryVirtualDevice {
    // ---
    endpoint_id: Arc<str>,
    model: DeviceModel,
    endpoint: SimulatedEndpoint,
    closed: Arc<AtomicBool>,
    on_error: RwLock<Option<ErrorCallback>>,
}

impl MemoryVirtualDevice {
    fn callback(&self) -> Option<ErrorCallback> {
        match self.on_error.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Hand each failure to the registered callback on its own task.
    ///
    /// A panicking callback takes down only that task.
    fn deliver_failures(&self, update: &AttributeUpdate, failures: Vec<String>) {
        // ---
        if failures.is_empty() {
            return;
        }

        let Some(callback) = self.callback() else {
            log_warn!(
                "{}: {} delivery failure(s) with no error callback registered",
                self.endpoint_id,
                failures.len()
            );
            return;
        };

        for message in failures {
            let event = ErrorEvent {
                endpoint_id: Arc::clone(&self.endpoint_id),
                message,
                update: Some(update.clone()),
            };
            let callback = Arc::clone(&callback);
            tokio::spawn(async move { callback(event) });
        }
    }
}

#[async_trait::async_trait]
impl VirtualDevice for MemoryVirtualDevice {
    // ---

    fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    fn model(&self) -> &DeviceModel {
        &self.model
    }

    async fn apply(&self, update: AttributeUpdate) -> Result<()> {
        // ---
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        self.model.validate(&update)?;

        let failures = self
            .endpoint
            .accept_update(&self.endpoint_id, &self.model, &update)?;

        log_debug!(
            "{}: acknowledged update with {} attribute(s)",
            self.endpoint_id,
            update.len()
        );

        self.deliver_failures(&update, failures);
        Ok(())
    }

    fn set_on_error(&self, callback: ErrorCallback) {
        // ---
        let mut slot = match self.on_error.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(callback);
    }
}
