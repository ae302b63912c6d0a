use callflow::config::Config;
use callflow::domain::account::{AccountSnapshot, RegistrationState};
use callflow::domain::call::{CallSnapshot, CallState, CoreEvent, GlobalState, UserAction};
use callflow::domain::shared::value_objects::SipAddress;
use callflow::infrastructure::metrics::init_metrics;
use callflow::infrastructure::simulated::{SimulatedPlatform, StaticProbe};
use callflow::Orchestrator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: defaults, optional TOML file, CALLFLOW__* environment
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting callflow orchestration core");
    info!("Configuration loaded: {:?}", config);

    let metrics = init_metrics()?;

    let platform = SimulatedPlatform::new("example.com");
    let orchestrator = Orchestrator::start(
        &config,
        Arc::new(StaticProbe::default()),
        platform.collaborators(),
        platform.clone(),
    );

    demo_call_lifecycle(&orchestrator).await?;

    // Give the loop a moment to drain before reporting
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = orchestrator.snapshot();
    info!("Snapshot: {}", serde_json::to_string(&snapshot)?);

    orchestrator.shutdown().await;

    for interaction in platform.interactions() {
        info!("Engine saw: {:?}", interaction);
    }
    info!("Metrics:\n{}", metrics.render());

    Ok(())
}

async fn demo_call_lifecycle(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    info!("=== Call Lifecycle Demo ===");
    let publisher = orchestrator.publisher();

    publisher.publish(CoreEvent::GlobalStateChanged {
        state: GlobalState::On,
        message: "Core started".to_string(),
    });

    let identity = SipAddress::parse("sip:me@example.com")?;
    publisher.publish(CoreEvent::RegistrationChanged {
        account: AccountSnapshot::new(identity, true),
        state: RegistrationState::Ok,
        message: "Registration successful".to_string(),
    });

    // Incoming call answered by the user
    let remote = SipAddress::parse("\"Alice\" <sip:alice@example.com>")?;
    let call = CallSnapshot::incoming(remote);
    let id = call.id;
    publisher.call_state_changed(call.clone(), CallState::IncomingReceived, 1);
    publisher.user_action(UserAction::Answer(id));
    publisher.call_state_changed(call.clone(), CallState::Connected, 1);
    publisher.call_state_changed(call.clone(), CallState::StreamsRunning, 1);
    info!("Call {} answered", id);

    publisher.user_action(UserAction::TerminateCurrentOrAll);
    publisher.call_state_changed(call.clone(), CallState::End, 0);
    publisher.call_state_changed(call, CallState::Released, 0);
    publisher.publish(CoreEvent::LastCallEnded {
        microphone_enabled: false,
    });
    info!("Call {} ended", id);

    // Outgoing call to a bare username
    publisher.user_action(UserAction::StartCall {
        address: "bob".to_string(),
    });

    publisher.publish(CoreEvent::AppBackground);
    Ok(())
}
