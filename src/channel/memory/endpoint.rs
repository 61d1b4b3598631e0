// src/channel/memory/endpoint.rs

//! The simulated device-management endpoint.
//!
//! Holds everything the remote side would: provisioned devices and their
//! activation state, registered device models, and an ordered log of what
//! the agent did. Tests drive failures through the `fail_*` and
//! `reject_next_delivery` controls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::channel::MemoryChannel;
use crate::macros::{log_debug, log_info};
use crate::{
    // ---
    AttributeKind,
    AttributeSpec,
    AttributeUpdate,
    ChannelFactory,
    Credentials,
    DeviceChannelPtr,
    DeviceModel,
    Error,
    Result,
    SENSOR_MODEL_URN,
    TEMPERATURE_ATTRIBUTE,
};

/// Something the endpoint observed, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointEvent {
    Connected { endpoint_id: String },
    Activated { endpoint_id: String, model_urn: String },
    ModelFetched { model_urn: String },
    VirtualDeviceCreated { endpoint_id: String, model_urn: String },
    Updated { endpoint_id: String, update: AttributeUpdate },
    Closed { endpoint_id: String },
}

struct Provisioned {
    secret: String,
    activated: bool,
}

#[derive(Default)]
struct Faults {
    connect: Option<String>,
    activation: Option<String>,
    updates_after: Option<(usize, String)>,
    deliveries: VecDeque<String>,
}

#[derive(Default)]
struct State {
    permissive: bool,
    devices: HashMap<String, Provisioned>,
    models: HashMap<String, DeviceModel>,
    events: Vec<EndpointEvent>,
    acknowledged: usize,
    faults: Faults,
}

/// An in-process stand-in for a device-management server.
///
/// Cheap to clone; clones share state, so a test can keep one clone for
/// inspection while the agent owns another as its [`ChannelFactory`].
///
/// # Example
///
/// ```
/// use sensor_agent::{ChannelFactory, Credentials, SimulatedEndpoint};
///
/// # async fn example() -> sensor_agent::Result<()> {
/// let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
/// let channel = endpoint.connect(&Credentials::new("id1", "secret1")).await?;
///
/// assert!(!channel.is_activated().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SimulatedEndpoint {
    state: Arc<Mutex<State>>,
}

impl Default for SimulatedEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEndpoint {
    // ---

    /// An endpoint that knows the sample sensor model and no devices.
    pub fn new() -> Self {
        // ---
        let mut state = State::default();
        let model = sample_model();
        state.models.insert(model.urn.clone(), model);

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// An endpoint that provisions any device on first connect.
    ///
    /// Used by the binary, where there is no real server to hold secrets.
    pub fn permissive() -> Self {
        let endpoint = Self::new();
        endpoint.lock().permissive = true;
        endpoint
    }

    /// Provision a device that still needs activation.
    pub fn provision(self, endpoint_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.insert_device(endpoint_id.into(), secret.into(), false);
        self
    }

    /// Provision a device that is already activated.
    pub fn provision_activated(
        self,
        endpoint_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.insert_device(endpoint_id.into(), secret.into(), true);
        self
    }

    /// Register an additional device model.
    pub fn register_model(&self, model: DeviceModel) {
        self.lock().models.insert(model.urn.clone(), model);
    }

    /// Register a device model from its JSON document.
    pub fn register_model_json(&self, document: &str) -> Result<()> {
        self.register_model(DeviceModel::from_json(document)?);
        Ok(())
    }

    /// Make every subsequent `connect()` fail as unreachable.
    pub fn fail_connect(&self, reason: impl Into<String>) {
        self.lock().faults.connect = Some(reason.into());
    }

    /// Make every subsequent `activate()` fail as unreachable.
    pub fn fail_activation(&self, reason: impl Into<String>) {
        self.lock().faults.activation = Some(reason.into());
    }

    /// Acknowledge `count` more updates, then fail every update after that.
    pub fn fail_updates_after(&self, count: usize, reason: impl Into<String>) {
        let mut state = self.lock();
        let threshold = state.acknowledged + count;
        state.faults.updates_after = Some((threshold, reason.into()));
    }

    /// Accept the next update, then report `message` for it asynchronously.
    pub fn reject_next_delivery(&self, message: impl Into<String>) {
        self.lock().faults.deliveries.push_back(message.into());
    }

    /// Every event observed so far.
    pub fn events(&self) -> Vec<EndpointEvent> {
        self.lock().events.clone()
    }

    /// Updates acknowledged for `endpoint_id`, oldest first.
    pub fn updates(&self, endpoint_id: &str) -> Vec<AttributeUpdate> {
        // ---
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                EndpointEvent::Updated {
                    endpoint_id: id,
                    update,
                } if id == endpoint_id => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `close()` calls observed across all handles.
    pub fn close_count(&self) -> usize {
        // ---
        self.lock()
            .events
            .iter()
            .filter(|event| matches!(event, EndpointEvent::Closed { .. }))
            .count()
    }

    /// Number of successful `connect()` calls.
    pub fn connection_count(&self) -> usize {
        // ---
        self.lock()
            .events
            .iter()
            .filter(|event| matches!(event, EndpointEvent::Connected { .. }))
            .count()
    }

    pub fn is_activated(&self, endpoint_id: &str) -> bool {
        self.lock()
            .devices
            .get(endpoint_id)
            .is_some_and(|device| device.activated)
    }

    // --- crate-internal operations used by the memory channel

    pub(super) fn activate(&self, endpoint_id: &str, model_urn: &str) -> Result<()> {
        // ---
        let mut state = self.lock();

        if let Some(reason) = &state.faults.activation {
            return Err(Error::Unavailable(reason.clone()));
        }

        if !state.models.contains_key(model_urn) {
            return Err(Error::UnknownModel(model_urn.to_string()));
        }

        let Some(device) = state.devices.get_mut(endpoint_id) else {
            return Err(Error::Authentication {
                endpoint_id: endpoint_id.to_string(),
            });
        };
        device.activated = true;

        state.events.push(EndpointEvent::Activated {
            endpoint_id: endpoint_id.to_string(),
            model_urn: model_urn.to_string(),
        });

        log_info!("endpoint: {endpoint_id} activated as {model_urn}");
        Ok(())
    }

    pub(super) fn model(&self, model_urn: &str) -> Result<DeviceModel> {
        // ---
        let mut state = self.lock();

        let model = state
            .models
            .get(model_urn)
            .cloned()
            .ok_or_else(|| Error::UnknownModel(model_urn.to_string()))?;

        state.events.push(EndpointEvent::ModelFetched {
            model_urn: model_urn.to_string(),
        });
        Ok(model)
    }

    pub(super) fn record_virtual_device(&self, endpoint_id: &str, model_urn: &str) {
        self.lock().events.push(EndpointEvent::VirtualDeviceCreated {
            endpoint_id: endpoint_id.to_string(),
            model_urn: model_urn.to_string(),
        });
    }

    /// Record an update. Returns the messages to deliver asynchronously.
    pub(super) fn accept_update(
        &self,
        endpoint_id: &str,
        model: &DeviceModel,
        update: &AttributeUpdate,
    ) -> Result<Vec<String>> {
        // ---
        let mut state = self.lock();

        if let Some((threshold, reason)) = &state.faults.updates_after {
            if state.acknowledged >= *threshold {
                return Err(Error::Unavailable(reason.clone()));
            }
        }

        state.acknowledged += 1;
        state.events.push(EndpointEvent::Updated {
            endpoint_id: endpoint_id.to_string(),
            update: update.clone(),
        });

        let mut failures: Vec<String> = model
            .out_of_range(update)
            .into_iter()
            .map(|(name, value)| {
                let (min, max) = model
                    .attribute(name)
                    .and_then(|spec| spec.range)
                    .unwrap_or_default();
                format!("\"{name}\" value {value} is outside [{min}, {max}]")
            })
            .collect();

        if let Some(message) = state.faults.deliveries.pop_front() {
            failures.push(message);
        }

        Ok(failures)
    }

    pub(super) fn record_close(&self, endpoint_id: &str) {
        log_debug!("endpoint: {endpoint_id} closed");
        self.lock().events.push(EndpointEvent::Closed {
            endpoint_id: endpoint_id.to_string(),
        });
    }

    fn insert_device(&self, endpoint_id: String, secret: String, activated: bool) {
        self.lock()
            .devices
            .insert(endpoint_id, Provisioned { secret, activated });
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Poisoning only means a test panicked mid-update; the log is still usable.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl ChannelFactory for SimulatedEndpoint {
    // ---

    async fn connect(&self, credentials: &Credentials) -> Result<DeviceChannelPtr> {
        // ---
        let endpoint_id = credentials.endpoint_id();

        {
            let mut state = self.lock();

            if let Some(reason) = &state.faults.connect {
                return Err(Error::Unavailable(reason.clone()));
            }

            let permissive = state.permissive;
            if permissive {
                state
                    .devices
                    .entry(endpoint_id.to_string())
                    .or_insert_with(|| Provisioned {
                        secret: credentials.secret().to_string(),
                        activated: false,
                    });
            }

            let authenticated = state
                .devices
                .get(endpoint_id)
                .is_some_and(|device| permissive || device.secret == credentials.secret());

            if !authenticated {
                return Err(Error::Authentication {
                    endpoint_id: endpoint_id.to_string(),
                });
            }

            state.events.push(EndpointEvent::Connected {
                endpoint_id: endpoint_id.to_string(),
            });
        }

        log_debug!("endpoint: {endpoint_id} connected");
        Ok(Arc::new(MemoryChannel::new(endpoint_id, self.clone())))
    }
}

/// The model the sample sensor reports against.
fn sample_model() -> DeviceModel {
    DeviceModel {
        urn: SENSOR_MODEL_URN.to_string(),
        name: "Device1 temperature sensor".to_string(),
        attributes: vec![AttributeSpec {
            name: TEMPERATURE_ATTRIBUTE.to_string(),
            kind: AttributeKind::Integer,
            range: Some((-40.0, 125.0)),
        }],
    }
}
