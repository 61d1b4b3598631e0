//! Domain layer public interface.
//!
//! Types and traits here describe devices, models and the channel to the
//! device-management endpoint without depending on any concrete channel
//! implementation.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod channel;
mod credentials;
mod model;

pub use channel::{
    //
    ChannelFactory,
    DeviceChannel,
    DeviceChannelPtr,
    ErrorCallback,
    ErrorEvent,
    VirtualDevice,
    VirtualDevicePtr,
};

pub use credentials::Credentials;

pub use model::{
    //
    AttributeKind,
    AttributeSpec,
    AttributeUpdate,
    AttributeValue,
    DeviceModel,
    SensorReading,
};
