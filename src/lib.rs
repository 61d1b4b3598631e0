//! Sample sensor agent for a device-management endpoint
//!
//! The agent polls a sensor on a fixed cadence and publishes each reading as
//! an attribute update on a virtual device. Everything remote (activation,
//! secure transport, framing, server-side alerting) sits behind the
//! [`DeviceChannel`] trait; this crate ships an in-process
//! [`SimulatedEndpoint`] that implements it.
//!

// Import all sub modules once...
mod agent;
mod channel;
mod device;
mod domain;
mod macros;
mod sensor;

mod agent_config;

mod cli;
mod console;
mod error;

// Re-export main types
pub use agent::{
    //
    spawn_keypress_watcher,
    stop_signal,
    RunSummary,
    SensorAgent,
    StopHandle,
    StopSignal,
};

pub use agent_config::{AgentConfig, SENSOR_MODEL_URN, TEMPERATURE_ATTRIBUTE};

pub use channel::{EndpointEvent, SimulatedEndpoint};
pub use cli::parse_credentials;
pub use console::{describe, Captured, Console, TIMESTAMP_FORMAT};
pub use device::UpdateBuilder;
pub use error::{Error, Result};
pub use sensor::{ScriptedSensor, SensorSource};

// --- public re-exports
pub use domain::{
    //
    AttributeKind,
    AttributeSpec,
    AttributeUpdate,
    AttributeValue,
    ChannelFactory,
    Credentials,
    DeviceChannel,
    DeviceChannelPtr,
    DeviceModel,
    ErrorCallback,
    ErrorEvent,
    SensorReading,
    VirtualDevice,
    VirtualDevicePtr,
};
