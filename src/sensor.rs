//! Sensor sources.
//!
//! The agent does not know how values are acquired. A [`SensorSource`]
//! produces one value per publish interval; the agent names it and sends it.

use crate::{AttributeValue, Result};

/// Produces the next value to publish.
///
/// Called once for the initial publish and once per completed interval.
/// An error is fatal to the run, like a publish failure.
#[async_trait::async_trait]
pub trait SensorSource: Send {
    async fn sample(&mut self) -> Result<AttributeValue>;
}

/// A simulated sensor: one initial value, then a steady value forever.
///
/// The sample program reports 25 at startup and 26 afterwards.
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    initial: Option<AttributeValue>,
    steady: AttributeValue,
}

impl ScriptedSensor {
    pub fn new(initial: impl Into<AttributeValue>, steady: impl Into<AttributeValue>) -> Self {
        Self {
            initial: Some(initial.into()),
            steady: steady.into(),
        }
    }
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self::new(25, 26)
    }
}

#[async_trait::async_trait]
impl SensorSource for ScriptedSensor {
    async fn sample(&mut self) -> Result<AttributeValue> {
        Ok(self.initial.take().unwrap_or_else(|| self.steady.clone()))
    }
}
