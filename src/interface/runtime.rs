//! Orchestrator runtime
//!
//! Composition root: resolves platform capabilities, builds the state
//! machine, the bus, the executor and the export worker, and runs the
//! single consumer loop. Readers follow the machine through a `watch`
//! channel of [`OrchestratorSnapshot`]s.

use crate::application::call_state_machine::{CallStateMachine, OrchestratorSnapshot};
use crate::config::Config;
use crate::domain::call::{Command, CoreEvent};
use crate::domain::capability::{PlatformCapabilities, PlatformProbe};
use crate::domain::shared::events::EventEnvelope;
use crate::infrastructure::event_bus::{EventBus, EventPublisher};
use crate::infrastructure::executor::CommandExecutor;
use crate::infrastructure::media_export::MediaExportWorker;
use crate::infrastructure::ports::{Collaborators, MediaStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub struct Orchestrator {
    publisher: EventPublisher,
    capabilities: PlatformCapabilities,
    snapshots: watch::Receiver<OrchestratorSnapshot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    consumer: JoinHandle<()>,
    export_worker: JoinHandle<()>,
}

impl Orchestrator {
    /// Wire everything up and start the consumer loop. Must be called from
    /// within a tokio runtime.
    pub fn start(
        config: &Config,
        probe: Arc<dyn PlatformProbe>,
        collaborators: Collaborators,
        media_store: Arc<dyn MediaStore>,
    ) -> Self {
        let prefs = Arc::new(config.preferences.clone());
        let capabilities = PlatformCapabilities::resolve(&prefs, &config.platform);
        info!(
            "Starting orchestrator (telecom: {:?}, phone state: {:?})",
            capabilities.telecom, capabilities.phone_state
        );

        let (publisher, bus) = EventBus::new();
        let (exports, export_worker) = MediaExportWorker::spawn(media_store);
        let executor = CommandExecutor::new(collaborators, publisher.clone(), exports);
        let machine = CallStateMachine::new(prefs.clone(), capabilities, probe);

        let (snapshot_tx, snapshots) = watch::channel(machine.snapshot());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let startup = if prefs.keep_service_alive {
            info!("Keep alive service is enabled, starting foreground notification");
            vec![Command::StartForegroundNotification]
        } else {
            Vec::new()
        };

        let consumer = tokio::spawn(run(
            ConsumerLoop {
                machine,
                executor,
                snapshot_tx,
            },
            bus,
            startup,
            shutdown_rx,
        ));

        Self {
            publisher,
            capabilities,
            snapshots,
            shutdown_tx: Some(shutdown_tx),
            consumer,
            export_worker,
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    pub fn publish(&self, event: CoreEvent) -> bool {
        self.publisher.publish(event)
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> OrchestratorSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorSnapshot> {
        self.snapshots.clone()
    }

    /// Ask the core to drop the foreground notification after `delay` if
    /// the default account is registered by then
    pub fn check_foreground_notification_after(&self, delay: Duration) -> JoinHandle<()> {
        let publisher = self.publisher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Checking if foreground notification can be removed");
            publisher.publish(CoreEvent::ForegroundCheckDue);
        })
    }

    /// Process what is already queued, stop the consumer, then let the
    /// export worker drain
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.consumer).await {
            error!("Consumer task failed: {}", e);
        }
        if let Err(e) = (&mut self.export_worker).await {
            error!("Export worker failed: {}", e);
        }
        info!("Orchestrator stopped");
    }
}

struct ConsumerLoop {
    machine: CallStateMachine,
    executor: CommandExecutor,
    snapshot_tx: watch::Sender<OrchestratorSnapshot>,
}

impl ConsumerLoop {
    async fn process(&mut self, envelope: EventEnvelope<CoreEvent>) {
        debug!(
            "Event {} ({}) waited {}ms in queue",
            envelope.metadata.event_type,
            envelope.metadata.event_id,
            envelope.queued_for(Utc::now()).num_milliseconds()
        );
        let commands = self.machine.on_event(envelope.into_event());
        self.executor.execute_all(commands).await;
        self.snapshot_tx.send_replace(self.machine.snapshot());
    }
}

async fn run(
    mut consumer: ConsumerLoop,
    mut bus: EventBus,
    startup: Vec<Command>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    consumer.executor.execute_all(startup).await;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                bus.close();
                while let Some(envelope) = bus.try_next() {
                    consumer.process(envelope).await;
                }
                break;
            }
            envelope = bus.next() => match envelope {
                Some(envelope) => consumer.process(envelope).await,
                None => break,
            },
        }
    }

    consumer.executor.shutdown();
    info!("Event consumer stopped");
}
