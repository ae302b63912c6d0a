//! Command executor
//!
//! Runs the commands produced for one event, in order. Engine and
//! collaborator failures stop here: they are logged and counted, and the
//! next command still runs.

use crate::domain::call::{Command, CoreEvent, UserMessage};
use crate::domain::shared::error::{DomainError, EngineError, EngineResult};
use crate::domain::shared::value_objects::{CallId, SipAddress};
use crate::infrastructure::event_bus::EventPublisher;
use crate::infrastructure::media_export::MediaExportQueue;
use crate::infrastructure::metrics;
use crate::infrastructure::ports::Collaborators;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct CommandExecutor {
    collaborators: Collaborators,
    publisher: EventPublisher,
    exports: MediaExportQueue,
    auto_answer_timers: HashMap<CallId, JoinHandle<()>>,
}

impl CommandExecutor {
    pub fn new(
        collaborators: Collaborators,
        publisher: EventPublisher,
        exports: MediaExportQueue,
    ) -> Self {
        Self {
            collaborators,
            publisher,
            exports,
            auto_answer_timers: HashMap::new(),
        }
    }

    pub async fn execute_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.execute(command).await;
        }
    }

    pub async fn execute(&mut self, command: Command) {
        let name = command.name();
        debug!("Executing command {}", name);

        match self.dispatch(command).await {
            Ok(()) => metrics::record_command_executed(name),
            Err(e) => {
                error!("Command {} failed: {}", name, e);
                metrics::record_command_failed(name);
            }
        }
    }

    /// Number of auto-answer timers still waiting
    pub fn pending_timers(&self) -> usize {
        self.auto_answer_timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Abort every outstanding timer
    pub fn shutdown(&mut self) {
        for (call, handle) in self.auto_answer_timers.drain() {
            debug!("Aborting auto-answer timer for call {}", call);
            handle.abort();
        }
    }

    async fn dispatch(&mut self, command: Command) -> EngineResult<()> {
        let engine = self.collaborators.engine.clone();

        match command {
            Command::Accept { call, params } => {
                match engine.accept(call, Some(params)).await {
                    Err(EngineError::ParamsUnavailable) => {
                        warn!("No call params for call {}, accepting with defaults", call);
                        engine.accept(call, None).await
                    }
                    other => other,
                }
            }
            Command::Decline { call, reason } => engine.decline(call, reason).await,
            Command::Redirect { call, target } => {
                let address = self.interpret(&target)?;
                engine.redirect(call, address).await
            }
            Command::Terminate { call } => engine.terminate(call).await,
            Command::TerminateAll => engine.terminate_all().await,
            Command::Transfer { call, target } => {
                let address = self.interpret(&target)?;
                engine.transfer(call, address).await
            }
            Command::Invite { target, params } => match engine.interpret_address(&target) {
                Some(address) => {
                    let call = engine.invite(address, params).await?;
                    info!("Outgoing call {} started to {}", call, target);
                    Ok(())
                }
                None => {
                    error!("Failed to parse {}, abort outgoing call", target);
                    self.emit(UserMessage::NetworkUnreachable);
                    Ok(())
                }
            },
            Command::StartRecording { call } => engine.start_recording(call).await,
            Command::RouteAudio { call, route } => engine.route_audio(call, route).await,
            Command::AnswerVideoUpdate { call, accept } => {
                engine.answer_video_update(call, accept).await
            }
            Command::ShowUi(screen) => self.collaborators.navigator.show(screen),
            Command::EmitUserMessage(message) => {
                self.emit(message);
                Ok(())
            }
            Command::ScheduleAutoAnswer { call, delay } => {
                self.schedule_auto_answer(call, delay);
                Ok(())
            }
            Command::CancelAutoAnswer { call } => {
                self.cancel_auto_answer(&call);
                Ok(())
            }
            Command::StartForegroundNotification => {
                self.collaborators.notifications.start_foreground();
                Ok(())
            }
            Command::StopForegroundNotification => {
                self.collaborators.notifications.stop_foreground_if_possible();
                Ok(())
            }
            Command::EnableMicrophone => engine.set_microphone_enabled(true).await,
            Command::DisableVideo => engine.disable_video().await,
            Command::SetPresence(presence) => engine.set_presence(presence).await,
            Command::ExportAttachment(attachment) => self.exports.enqueue(attachment),
        }
    }

    fn interpret(&self, target: &str) -> EngineResult<SipAddress> {
        self.collaborators
            .engine
            .interpret_address(target)
            .ok_or_else(|| EngineError::Rejected(DomainError::InvalidAddress(target.to_string()).to_string()))
    }

    fn emit(&self, message: UserMessage) {
        info!("Showing user message: {}", message);
        metrics::record_user_message(&message);
        self.collaborators.messages.emit(message);
    }

    fn schedule_auto_answer(&mut self, call: CallId, delay: Duration) {
        self.auto_answer_timers.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = self.auto_answer_timers.remove(&call) {
            previous.abort();
        }

        let publisher = self.publisher.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publisher.publish(CoreEvent::AutoAnswerDue { call });
        });
        self.auto_answer_timers.insert(call, handle);
    }

    fn cancel_auto_answer(&mut self, call: &CallId) {
        if let Some(handle) = self.auto_answer_timers.remove(call) {
            info!("Auto answer timer for call {} cancelled", call);
            handle.abort();
        }
    }
}

impl Drop for CommandExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::{AnswerParams, AudioRoute, Reason, Screen, VideoDecision};
    use crate::domain::message::Attachment;
    use crate::domain::shared::value_objects::RoomId;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::media_export::MediaExportWorker;
    use crate::infrastructure::ports::{
        MockMediaStore, MockNavigator, MockNotificationManager, MockSipEngine, MockUserMessageSink,
        SipEngine,
    };
    use mockall::predicate::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Harness {
        engine: MockSipEngine,
        navigator: MockNavigator,
        notifications: MockNotificationManager,
        messages: MockUserMessageSink,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                engine: MockSipEngine::new(),
                navigator: MockNavigator::new(),
                notifications: MockNotificationManager::new(),
                messages: MockUserMessageSink::new(),
            }
        }

        fn build(self) -> (CommandExecutor, EventBus) {
            let (publisher, bus) = EventBus::new();
            let (exports, _worker) = MediaExportWorker::new(Arc::new(MockMediaStore::new()));
            let engine: Arc<dyn SipEngine> = Arc::new(self.engine);
            let collaborators = Collaborators {
                engine,
                navigator: Arc::new(self.navigator),
                notifications: Arc::new(self.notifications),
                messages: Arc::new(self.messages),
            };
            (CommandExecutor::new(collaborators, publisher, exports), bus)
        }
    }

    fn answer_params() -> AnswerParams {
        AnswerParams {
            record_file: PathBuf::from("recordings/alice_01-01-2024-10-00-00.mkv"),
            low_bandwidth: false,
            video: VideoDecision::unchanged(),
        }
    }

    #[tokio::test]
    async fn test_accept_falls_back_without_params() {
        let call = CallId::new();
        let mut harness = Harness::new();
        let mut seq = mockall::Sequence::new();
        harness
            .engine
            .expect_accept()
            .withf(move |c, params| *c == call && params.is_some())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(EngineError::ParamsUnavailable));
        harness
            .engine
            .expect_accept()
            .withf(move |c, params| *c == call && params.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let (mut executor, _bus) = harness.build();
        executor
            .execute(Command::Accept {
                call,
                params: answer_params(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_commands() {
        let call = CallId::new();
        let mut harness = Harness::new();
        harness
            .engine
            .expect_decline()
            .with(eq(call), eq(Reason::Busy))
            .times(1)
            .returning(|c, _| Err(EngineError::CallNotFound(c)));
        harness
            .engine
            .expect_route_audio()
            .with(eq(call), eq(AudioRoute::Speaker))
            .times(1)
            .returning(|_, _| Ok(()));
        harness
            .navigator
            .expect_show()
            .with(eq(Screen::Calling(call)))
            .times(1)
            .returning(|_| Err(EngineError::Unavailable("no activity".to_string())));

        let (mut executor, _bus) = harness.build();
        executor
            .execute_all(vec![
                Command::Decline {
                    call,
                    reason: Reason::Busy,
                },
                Command::ShowUi(Screen::Calling(call)),
                Command::RouteAudio {
                    call,
                    route: AudioRoute::Speaker,
                },
            ])
            .await;
    }

    #[tokio::test]
    async fn test_invite_with_uninterpretable_target() {
        let mut harness = Harness::new();
        harness.engine.expect_interpret_address().returning(|_| None);
        harness.engine.expect_invite().never();
        harness
            .messages
            .expect_emit()
            .with(eq(UserMessage::NetworkUnreachable))
            .times(1)
            .return_const(());

        let (mut executor, _bus) = harness.build();
        executor
            .execute(Command::Invite {
                target: "???".to_string(),
                params: crate::domain::call::CallParams {
                    record_file: PathBuf::from("recordings/x.mkv"),
                    low_bandwidth: false,
                    early_media_sending: false,
                },
            })
            .await;
    }

    #[tokio::test]
    async fn test_redirect_interprets_target() {
        let call = CallId::new();
        let voicemail = SipAddress::parse("sip:voicemail@example.com").unwrap();
        let expected = voicemail.clone();

        let mut harness = Harness::new();
        harness
            .engine
            .expect_interpret_address()
            .withf(|raw| raw == "voicemail")
            .returning(move |_| Some(voicemail.clone()));
        harness
            .engine
            .expect_redirect()
            .withf(move |c, target| *c == call && *target == expected)
            .times(1)
            .returning(|_, _| Ok(()));

        let (mut executor, _bus) = harness.build();
        executor
            .execute(Command::Redirect {
                call,
                target: "voicemail".to_string(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_foreground_and_microphone_commands() {
        let mut harness = Harness::new();
        harness.notifications.expect_start_foreground().times(1).return_const(());
        harness
            .notifications
            .expect_stop_foreground_if_possible()
            .times(1)
            .return_const(());
        harness
            .engine
            .expect_set_microphone_enabled()
            .with(eq(true))
            .times(1)
            .returning(|_| Ok(()));

        let (mut executor, _bus) = harness.build();
        executor
            .execute_all(vec![
                Command::StartForegroundNotification,
                Command::EnableMicrophone,
                Command::StopForegroundNotification,
            ])
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_answer_timer_publishes_event() {
        let call = CallId::new();
        let (mut executor, mut bus) = Harness::new().build();

        executor
            .execute(Command::ScheduleAutoAnswer {
                call,
                delay: Duration::from_secs(3),
            })
            .await;
        assert_eq!(executor.pending_timers(), 1);

        let envelope = bus.next().await.unwrap();
        assert_eq!(envelope.event, CoreEvent::AutoAnswerDue { call });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let call = CallId::new();
        let (mut executor, mut bus) = Harness::new().build();

        executor
            .execute(Command::ScheduleAutoAnswer {
                call,
                delay: Duration::from_secs(3),
            })
            .await;
        executor.execute(Command::CancelAutoAnswer { call }).await;
        // Cancelling twice is fine
        executor.execute(Command::CancelAutoAnswer { call }).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(bus.try_next().is_none());
        assert_eq!(executor.pending_timers(), 0);
    }

    #[tokio::test]
    async fn test_export_reaches_queue() {
        let (publisher, _bus) = EventBus::new();
        let mut store = MockMediaStore::new();
        store
            .expect_export()
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("/pictures/photo.png")));
        let (exports, worker) = MediaExportWorker::new(Arc::new(store));

        let collaborators = Collaborators {
            engine: Arc::new(MockSipEngine::new()),
            navigator: Arc::new(MockNavigator::new()),
            notifications: Arc::new(MockNotificationManager::new()),
            messages: Arc::new(MockUserMessageSink::new()),
        };
        let mut executor = CommandExecutor::new(collaborators, publisher, exports);
        executor
            .execute(Command::ExportAttachment(Attachment {
                room: RoomId::new("room-1"),
                message_id: "msg-1".to_string(),
                name: "photo.png".to_string(),
                path: PathBuf::from("/tmp/photo.png"),
            }))
            .await;
        drop(executor);

        worker.run().await;
    }
}
