//! Multi-attribute updates on a virtual device.

use crate::{AttributeUpdate, AttributeValue, Result, VirtualDevice};

/// Collects several attribute values and submits them in one call.
///
/// ```no_run
/// # async fn example(device: sensor_agent::VirtualDevicePtr) -> sensor_agent::Result<()> {
/// device
///     .update()
///     .set("temperature", 25)
///     .set("unit", "C")
///     .finish()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// Dropping the builder without calling [`finish`](UpdateBuilder::finish)
/// sends nothing.
#[must_use = "an update is only sent by finish()"]
pub struct UpdateBuilder<'a> {
    device: &'a dyn VirtualDevice,
    update: AttributeUpdate,
}

impl<'a> UpdateBuilder<'a> {
    pub(crate) fn new(device: &'a dyn VirtualDevice) -> Self {
        Self {
            device,
            update: AttributeUpdate::new(),
        }
    }

    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.update.insert(attribute, value);
        self
    }

    /// Send the collected values and wait for the acknowledgement.
    ///
    /// An empty update is not sent.
    pub async fn finish(self) -> Result<()> {
        // ---
        if self.update.is_empty() {
            return Ok(());
        }
        self.device.apply(self.update).await
    }
}
