//! The sensor agent.
//!
//! One linear run: parse credentials, connect, activate if needed, create
//! the virtual device, publish the initial reading, register the delivery
//! error callback, then publish a fresh reading every interval until the
//! stop signal fires.
//!
//! ## Error boundary
//!
//! [`SensorAgent::run`] is the only place errors are handled. Anything that
//! fails before the loop or while publishing is printed once (message,
//! direct cause, usage text) and returned to the caller unchanged; nothing is
//! retried. The device channel, once obtained, is closed exactly once on
//! every exit path, and a failing close is ignored.
//!
//! ## Cancellation
//!
//! The wait between readings races the publish timer against the
//! [`StopSignal`], so a stop is observed as soon as it is requested. A stop
//! requested while a publish is in flight is observed at the next wait;
//! nothing is published after that.

mod stop;

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use crate::macros::{log_debug, log_error, log_info, log_warn};
use crate::{
    // ---
    cli,
    AgentConfig,
    ChannelFactory,
    Console,
    DeviceChannel,
    DeviceChannelPtr,
    Error,
    ErrorEvent,
    Result,
    SensorReading,
    SensorSource,
    VirtualDevice,
};

pub use stop::{spawn_keypress_watcher, stop_signal, StopHandle, StopSignal};

/// Outcome of a run that ended by stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Endpoint the readings were published for.
    pub endpoint_id: String,

    /// Acknowledged publishes, the initial one included.
    pub published: usize,
}

/// Polls a sensor and publishes its readings through a device channel.
///
/// # Example
///
/// ```no_run
/// use sensor_agent::{stop_signal, AgentConfig, ScriptedSensor, SensorAgent, SimulatedEndpoint};
///
/// # async fn example() -> sensor_agent::Result<()> {
/// let (stop, signal) = stop_signal();
/// let agent = SensorAgent::new(
///     AgentConfig::default().under_framework(),
///     SimulatedEndpoint::permissive(),
///     ScriptedSensor::default(),
/// );
///
/// let run = tokio::spawn(agent.run(["sensor-agent", "id1", "secret1"], signal));
/// // ... later
/// stop.stop();
/// let summary = run.await.expect("agent task panicked")?;
/// println!("published {} readings", summary.published);
/// # Ok(())
/// # }
/// ```
pub struct SensorAgent<F, S> {
    // ---
    config: AgentConfig,
    factory: F,
    sensor: S,
    console: Console,
    keypress_input: Option<Box<dyn BufRead + Send>>,
}

impl<F, S> SensorAgent<F, S>
where
    F: ChannelFactory,
    S: SensorSource,
{
    // ---

    /// Create an agent writing to stdout.
    pub fn new(config: AgentConfig, factory: F, sensor: S) -> Self {
        Self {
            config,
            factory,
            sensor,
            console: Console::stdout(),
            keypress_input: None,
        }
    }

    /// Write user-facing lines to `console` instead of stdout.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Watch `input` instead of stdin for the "press enter" stop.
    ///
    /// Ignored when the agent runs under a framework.
    pub fn with_keypress_input(mut self, input: impl BufRead + Send + 'static) -> Self {
        self.keypress_input = Some(Box::new(input));
        self
    }

    /// Run until `stop` fires or something fails.
    ///
    /// `args` are the process arguments, program name first. Returns the
    /// run summary on a requested stop; any error has already been printed
    /// when it is returned.
    pub async fn run<I, T>(mut self, args: I, mut stop: StopSignal) -> Result<RunSummary>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        // ---
        let channel = match connect(&self.factory, args).await {
            Ok(channel) => channel,
            Err(err) => return Err(self.report(err)),
        };

        let result = self.drive(channel.as_ref(), &mut stop).await;

        let result = result.map_err(|err| self.report(err));
        release(channel).await;
        result
    }

    async fn drive(
        &mut self,
        channel: &dyn DeviceChannel,
        stop: &mut StopSignal,
    ) -> Result<RunSummary> {
        // ---
        let endpoint_id = channel.endpoint_id().to_string();
        let model_urn = self.config.model_urn.clone();

        if channel.is_activated().await? {
            log_debug!("{endpoint_id}: already activated");
        } else {
            log_info!("{endpoint_id}: activating as {model_urn}");
            channel
                .activate(&model_urn)
                .await
                .map_err(|err| Error::activation(&endpoint_id, err))?;
        }

        let model = channel.device_model(&model_urn).await?;
        let device = channel.create_virtual_device(&endpoint_id, &model).await?;

        self.console.line(format_args!(
            "\nCreated virtual sensor {}\n",
            device.endpoint_id()
        ));

        // The initial reading is printed once the endpoint has it.
        let reading = SensorReading::new(&self.config.attribute, self.sensor.sample().await?);
        publish(device.as_ref(), &reading).await?;
        self.console.reading(device.endpoint_id(), &reading.attribute, &reading.value);
        let mut published = 1;

        let console = self.console.clone();
        device.set_on_error(Arc::new(move |event: ErrorEvent| {
            console.delivery_error(&event);
        }));

        if !self.config.under_framework {
            self.console.line("\n\tPress enter to exit.\n");

            let input: Box<dyn BufRead + Send> = match self.keypress_input.take() {
                Some(input) => input,
                None => Box::new(BufReader::new(io::stdin())),
            };

            if let Err(_err) = spawn_keypress_watcher(stop.handle(), input) {
                log_warn!("{endpoint_id}: keypress stop unavailable: {_err}");
            }
        }

        loop {
            tokio::select! {
                biased;

                _ = stop.stopped() => {
                    log_info!("{endpoint_id}: stop requested after {published} publish(es)");
                    break;
                }
                _ = tokio::time::sleep(self.config.publish_interval) => {}
            }

            // Periodic readings are printed before they are sent.
            let reading = SensorReading::new(&self.config.attribute, self.sensor.sample().await?);
            self.console.reading(device.endpoint_id(), &reading.attribute, &reading.value);
            publish(device.as_ref(), &reading).await?;
            published += 1;
        }

        Ok(RunSummary {
            endpoint_id,
            published,
        })
    }

    /// Print a fatal error and hand it back.
    fn report(&self, err: Error) -> Error {
        log_error!("sensor agent failed: {err}");
        self.console.fatal(&err, &self.config.program_name);
        err
    }
}

/// Parse credentials and obtain a channel from the factory.
async fn connect<F, I, T>(factory: &F, args: I) -> Result<DeviceChannelPtr>
where
    F: ChannelFactory,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // ---
    let credentials = cli::parse_credentials(args)?;
    log_debug!("connecting as {}", credentials.endpoint_id());
    factory.connect(&credentials).await
}

/// Send one reading and wait for the endpoint to acknowledge it.
async fn publish(device: &dyn VirtualDevice, reading: &SensorReading) -> Result<()> {
    device
        .apply(reading.to_update())
        .await
        .map_err(|err| Error::publish(device.endpoint_id(), err))
}

/// Close the channel, ignoring failures.
async fn release(channel: DeviceChannelPtr) {
    // ---
    if let Err(_err) = channel.close().await {
        log_debug!("{}: close failed (ignored): {_err}", channel.endpoint_id());
    }
}
