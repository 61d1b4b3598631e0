//! Sample sensor agent.
//!
//! Publishes a simulated temperature reading every five seconds until enter
//! is pressed.
//!
//! Run with: cargo run -- <endpoint id> <secret>
//!
//! Diagnostics go to stderr; set `RUST_LOG=debug` to see them.

use std::process::ExitCode;

use sensor_agent::{stop_signal, AgentConfig, ScriptedSensor, SensorAgent, SimulatedEndpoint};

#[tokio::main]
async fn main() -> ExitCode {
    // ---
    #[cfg(feature = "logging")]
    {
        use tracing_subscriber::{fmt as tracing_format, EnvFilter};

        tracing_format()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .init();
    }

    let args: Vec<String> = std::env::args().collect();

    let config = match args.first() {
        Some(program) => AgentConfig::default().with_program_name(program.as_str()),
        None => AgentConfig::default(),
    };

    let (_stop, signal) = stop_signal();
    let agent = SensorAgent::new(
        config,
        SimulatedEndpoint::permissive(),
        ScriptedSensor::default(),
    );

    match agent.run(args, signal).await {
        Ok(_summary) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
