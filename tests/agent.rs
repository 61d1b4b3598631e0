// tests/agent.rs

use std::io;
use std::time::Duration;

use sensor_agent::{
    // ---
    stop_signal,
    AgentConfig,
    AttributeUpdate,
    AttributeValue,
    Captured,
    Console,
    EndpointEvent,
    Error,
    Result,
    ScriptedSensor,
    SensorAgent,
    SimulatedEndpoint,
    SENSOR_MODEL_URN,
};

const ARGS: [&str; 3] = ["sensor-agent", "id1", "secret1"];

fn config() -> AgentConfig {
    AgentConfig::default()
        .under_framework()
        .with_program_name("sensor-agent")
}

fn agent(
    endpoint: &SimulatedEndpoint,
) -> (SensorAgent<SimulatedEndpoint, ScriptedSensor>, Captured) {
    // ---
    let (console, captured) = Console::capture();
    let agent = SensorAgent::new(config(), endpoint.clone(), ScriptedSensor::default())
        .with_console(console);
    (agent, captured)
}

fn temperatures(endpoint: &SimulatedEndpoint) -> Vec<AttributeValue> {
    endpoint
        .updates("id1")
        .iter()
        .filter_map(|update| update.get("temperature").cloned())
        .collect()
}

#[tokio::test]
async fn wrong_argument_count_never_connects() {
    // ---
    for args in [
        vec!["sensor-agent"],
        vec!["sensor-agent", "id1"],
        vec!["sensor-agent", "id1", "secret1", "extra"],
    ] {
        let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
        let (agent, captured) = agent(&endpoint);
        let (_stop, signal) = stop_signal();

        let err = agent.run(args, signal).await.unwrap_err();

        assert!(matches!(err, Error::Usage));
        assert!(endpoint.events().is_empty(), "no channel activity expected");
        assert_eq!(endpoint.close_count(), 0);

        let output = captured.contents();
        assert!(output.contains("Incorrect number of arguments."));
        assert!(output.contains("Usage: \nsensor-agent <endpoint id> <secret>"));
    }
}

#[tokio::test(start_paused = true)]
async fn activates_before_creating_virtual_device() -> Result<()> {
    // ---
    // Arrange
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, _captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();
    stop.stop();

    // ---
    // Act
    // ---
    let summary = agent.run(ARGS, signal).await?;

    // ---
    // Assert
    // ---
    assert_eq!(summary.published, 1);
    assert_eq!(
        endpoint.events(),
        vec![
            EndpointEvent::Connected {
                endpoint_id: "id1".to_string()
            },
            EndpointEvent::Activated {
                endpoint_id: "id1".to_string(),
                model_urn: SENSOR_MODEL_URN.to_string(),
            },
            EndpointEvent::ModelFetched {
                model_urn: SENSOR_MODEL_URN.to_string()
            },
            EndpointEvent::VirtualDeviceCreated {
                endpoint_id: "id1".to_string(),
                model_urn: SENSOR_MODEL_URN.to_string(),
            },
            EndpointEvent::Updated {
                endpoint_id: "id1".to_string(),
                update: AttributeUpdate::single("temperature", 25),
            },
            EndpointEvent::Closed {
                endpoint_id: "id1".to_string()
            },
        ]
    );
    assert!(endpoint.is_activated("id1"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn already_activated_skips_activation() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision_activated("id1", "secret1");
    let (agent, _captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();
    stop.stop();

    agent.run(ARGS, signal).await?;

    let events = endpoint.events();
    assert!(!events
        .iter()
        .any(|event| matches!(event, EndpointEvent::Activated { .. })));
    assert!(events
        .iter()
        .any(|event| matches!(event, EndpointEvent::VirtualDeviceCreated { .. })));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn publishes_initial_value_then_one_per_interval() -> Result<()> {
    // ---
    // Arrange
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();

    // ---
    // Act
    // ---
    let run = tokio::spawn(agent.run(ARGS, signal));

    tokio::time::sleep(Duration::from_millis(12_500)).await;
    stop.stop();

    let summary = run.await.expect("agent task panicked")?;

    // ---
    // Assert
    // ---
    assert_eq!(summary.endpoint_id, "id1");
    assert_eq!(summary.published, 3);
    assert_eq!(
        temperatures(&endpoint),
        vec![
            AttributeValue::Integer(25),
            AttributeValue::Integer(26),
            AttributeValue::Integer(26),
        ]
    );
    assert_eq!(endpoint.close_count(), 1);

    let set_lines: Vec<String> = captured
        .lines()
        .into_iter()
        .filter(|line| line.contains(" : Set : "))
        .collect();
    assert_eq!(set_lines.len(), 3);
    assert!(set_lines[0].ends_with(" : id1 : Set : \"temperature\"=25"));
    assert!(set_lines[2].ends_with(" : id1 : Set : \"temperature\"=26"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_during_first_wait_publishes_nothing_more() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, _captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();

    let run = tokio::spawn(agent.run(ARGS, signal));

    tokio::time::sleep(Duration::from_millis(2_300)).await;
    stop.stop();
    let summary = run.await.expect("agent task panicked")?;

    // Well past the next interval: nothing else may show up.
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(summary.published, 1);
    assert_eq!(temperatures(&endpoint), vec![AttributeValue::Integer(25)]);
    assert_eq!(endpoint.close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn delivery_error_is_printed_and_loop_continues() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();

    let run = tokio::spawn(agent.run(ARGS, signal));

    // After the initial publish, before the first interval.
    tokio::time::sleep(Duration::from_secs(1)).await;
    endpoint.reject_next_delivery("value rejected by server");

    tokio::time::sleep(Duration::from_millis(11_500)).await;
    stop.stop();
    let summary = run.await.expect("agent task panicked")?;

    assert_eq!(summary.published, 3);
    assert!(captured
        .contents()
        .contains(" : onError : id1 : \"value rejected by server\""));
    assert_eq!(endpoint.close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn out_of_range_reading_is_reported_asynchronously() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (console, captured) = Console::capture();
    let agent = SensorAgent::new(config(), endpoint.clone(), ScriptedSensor::new(25, 200))
        .with_console(console);
    let (stop, signal) = stop_signal();

    let run = tokio::spawn(agent.run(ARGS, signal));

    tokio::time::sleep(Duration::from_millis(7_500)).await;
    stop.stop();
    let summary = run.await.expect("agent task panicked")?;

    assert_eq!(summary.published, 2);
    let on_error: Vec<String> = captured
        .lines()
        .into_iter()
        .filter(|line| line.contains(" : onError : id1 : "))
        .collect();
    assert_eq!(on_error.len(), 1);
    assert!(on_error[0].contains("\"temperature\" value 200 is outside"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn activation_failure_is_fatal_and_closes_once() {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    endpoint.fail_activation("network unreachable");
    let (agent, captured) = agent(&endpoint);
    let (_stop, signal) = stop_signal();

    let err = agent.run(ARGS, signal).await.unwrap_err();

    assert!(matches!(err, Error::Activation { .. }));
    assert_eq!(endpoint.close_count(), 1);
    assert!(endpoint.updates("id1").is_empty());

    let output = captured.contents();
    assert!(output.contains(
        "activation of id1 failed.\n\tCaused by: device endpoint unavailable: network unreachable"
    ));
    assert!(output.contains("Usage: "));
}

#[tokio::test(start_paused = true)]
async fn publish_failure_is_fatal_and_closes_once() {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    endpoint.fail_updates_after(2, "connection reset");
    let (agent, captured) = agent(&endpoint);
    let (_stop, signal) = stop_signal();

    let err = agent.run(ARGS, signal).await.unwrap_err();

    assert!(matches!(err, Error::Publish { .. }));
    assert_eq!(
        temperatures(&endpoint),
        vec![AttributeValue::Integer(25), AttributeValue::Integer(26)]
    );
    assert_eq!(endpoint.close_count(), 1);

    // The failing periodic reading was already printed when the send failed.
    let output = captured.contents();
    let set_lines: Vec<&str> = output
        .lines()
        .filter(|line| line.contains(" : Set : "))
        .collect();
    assert_eq!(set_lines.len(), 3);
    assert!(set_lines[2].ends_with(" : id1 : Set : \"temperature\"=26"));

    let failure = output
        .find("failed to set attributes on id1.\n\tCaused by: device endpoint unavailable: connection reset")
        .expect("fatal error should be printed");
    let last_set = output.rfind(" : Set : ").expect("set lines printed");
    assert!(last_set < failure);
}

#[tokio::test]
async fn rejected_credentials_leave_nothing_to_close() {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, _captured) = agent(&endpoint);
    let (_stop, signal) = stop_signal();

    let err = agent
        .run(["sensor-agent", "id1", "wrong"], signal)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }));
    assert_eq!(endpoint.connection_count(), 0);
    assert_eq!(endpoint.close_count(), 0);
}

#[tokio::test]
async fn unreachable_endpoint_is_fatal() {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    endpoint.fail_connect("no route to host");
    let (agent, captured) = agent(&endpoint);
    let (_stop, signal) = stop_signal();

    let err = agent.run(ARGS, signal).await.unwrap_err();

    assert!(matches!(err, Error::Unavailable(_)));
    assert!(captured
        .contents()
        .contains("device endpoint unavailable: no route to host"));
}

#[tokio::test(start_paused = true)]
async fn under_framework_has_no_keypress_prompt() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, captured) = agent(&endpoint);
    let (stop, signal) = stop_signal();
    stop.stop();

    agent.run(ARGS, signal).await?;

    let output = captured.contents();
    assert!(output.contains("Created virtual sensor id1"));
    assert!(!output.contains("Press enter to exit."));
    Ok(())
}

fn interactive_agent(
    endpoint: &SimulatedEndpoint,
    input: impl io::BufRead + Send + 'static,
) -> (SensorAgent<SimulatedEndpoint, ScriptedSensor>, Captured) {
    // ---
    let (console, captured) = Console::capture();
    let config = AgentConfig::default().with_program_name("sensor-agent");
    let agent = SensorAgent::new(config, endpoint.clone(), ScriptedSensor::default())
        .with_console(console)
        .with_keypress_input(input);
    (agent, captured)
}

#[tokio::test]
async fn enter_on_keypress_input_stops_the_agent() -> Result<()> {
    // ---
    // Arrange
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, captured) = interactive_agent(&endpoint, b"\n".as_slice());
    let (_stop, signal) = stop_signal();

    // ---
    // Act
    // ---
    let summary = tokio::time::timeout(Duration::from_secs(3), agent.run(ARGS, signal))
        .await
        .expect("keypress should stop the agent before the first interval")?;

    // ---
    // Assert
    // ---
    assert_eq!(summary.published, 1);
    assert_eq!(endpoint.close_count(), 1);
    assert!(captured.contents().contains("\tPress enter to exit."));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn end_of_keypress_input_keeps_running() -> Result<()> {
    // ---
    let endpoint = SimulatedEndpoint::new().provision("id1", "secret1");
    let (agent, captured) = interactive_agent(&endpoint, io::empty());
    let (stop, signal) = stop_signal();

    let run = tokio::spawn(agent.run(ARGS, signal));

    tokio::time::sleep(Duration::from_millis(7_500)).await;
    stop.stop();
    let summary = run.await.expect("agent task panicked")?;

    assert_eq!(summary.published, 2);
    assert_eq!(endpoint.close_count(), 1);

    let output = captured.contents();
    let prompt = output.find("\tPress enter to exit.").expect("prompt printed");
    let created = output.find("Created virtual sensor id1").expect("device created");
    assert!(created < prompt);
    Ok(())
}
