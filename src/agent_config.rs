//! Agent configuration.
//!
//! Everything the agent needs besides its credentials and collaborators.
//! There is no config file and no environment surface; embedders build an
//! `AgentConfig` in code, the binary uses the defaults.

use std::time::Duration;

/// Device model the sample sensor activates under.
pub const SENSOR_MODEL_URN: &str = "urn:lsaetta:device1model1";

/// Attribute the sample sensor publishes.
pub const TEMPERATURE_ATTRIBUTE: &str = "temperature";

/// Agent configuration.
///
/// # Example
///
/// ```
/// use sensor_agent::AgentConfig;
/// use std::time::Duration;
///
/// let config = AgentConfig::default()
///     .with_publish_interval(Duration::from_secs(1))
///     .under_framework();
///
/// assert!(config.under_framework);
/// ```
#[derive(Debug, Clone)]
pub struct AgentConfig {
    // ---
    /// Model URN passed to activation and used for the virtual device.
    pub model_urn: String,

    /// Attribute name readings are published under.
    pub attribute: String,

    /// Time between readings after the initial publish.
    ///
    /// Default: 5 seconds
    pub publish_interval: Duration,

    /// Running inside an embedding framework.
    ///
    /// Disables the stdin keypress watcher; the embedder stops the agent
    /// through its [`StopHandle`](crate::StopHandle) instead.
    pub under_framework: bool,

    /// Program name shown in the usage line.
    pub program_name: String,
}

impl Default for AgentConfig {
    /// Sample defaults.
    ///
    /// - `model_urn`: `urn:lsaetta:device1model1`
    /// - `attribute`: `temperature`
    /// - `publish_interval`: 5s
    /// - `under_framework`: false
    fn default() -> Self {
        Self {
            model_urn: SENSOR_MODEL_URN.to_string(),
            attribute: TEMPERATURE_ATTRIBUTE.to_string(),
            publish_interval: Duration::from_secs(5),
            under_framework: false,
            program_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl AgentConfig {
    /// Set the model URN used for activation and the virtual device.
    pub fn with_model_urn(mut self, urn: impl Into<String>) -> Self {
        self.model_urn = urn.into();
        self
    }

    /// Set the attribute name readings are published under.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Set the time between readings.
    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = interval;
        self
    }

    /// Mark the agent as embedded; no stdin watcher is started.
    pub fn under_framework(mut self) -> Self {
        self.under_framework = true;
        self
    }

    /// Set the program name shown in the usage line.
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }
}
