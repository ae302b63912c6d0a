//! Call state machine
//!
//! Single entry point for everything the SIP engine and the platform
//! report. Each event is turned into an ordered list of commands; the
//! machine itself never talks to the engine.
//!
//! The machine is owned by the event-bus consumer and mutated through
//! `&mut self` only, so call records and the current call are never
//! touched concurrently. Readers get [`OrchestratorSnapshot`] copies.

use crate::application::call_controller::CallController;
use crate::application::call_table::CallTable;
use crate::application::registration_watcher::RegistrationWatcher;
use crate::config::CallPreferences;
use crate::domain::call::{
    AudioRoute, CallView, CallDirection, CallSnapshot, CallState, Command, CoreEvent, GlobalState,
    Presence, Reason, Screen, UserMessage,
};
use crate::domain::capability::{PlatformCapabilities, PlatformProbe, TelecomStatus};
use crate::domain::message::{Attachment, ChatMessage};
use crate::domain::policy;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, RoomId};
use crate::infrastructure::metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Immutable copy of the machine state for UI and notification readers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorSnapshot {
    pub calls: Vec<CallView>,
    pub current_call: Option<CallId>,
    pub default_account_registered: bool,
}

pub struct CallStateMachine {
    prefs: Arc<CallPreferences>,
    capabilities: PlatformCapabilities,
    probe: Arc<dyn PlatformProbe>,
    controller: CallController,
    registrations: RegistrationWatcher,
    calls: CallTable,
}

impl CallStateMachine {
    pub fn new(
        prefs: Arc<CallPreferences>,
        capabilities: PlatformCapabilities,
        probe: Arc<dyn PlatformProbe>,
    ) -> Self {
        Self {
            controller: CallController::new(prefs.clone(), probe.clone()),
            prefs,
            capabilities,
            probe,
            registrations: RegistrationWatcher::new(),
            calls: CallTable::new(),
        }
    }

    /// Process one event and return the commands to execute, in order
    pub fn on_event(&mut self, event: CoreEvent) -> Vec<Command> {
        let event_type = event.event_type();
        debug!("Processing event {}", event_type);
        metrics::record_event_processed(event_type);

        let result = match event {
            CoreEvent::GlobalStateChanged { state, message } => {
                Ok(self.on_global_state_changed(state, &message))
            }
            CoreEvent::RegistrationChanged {
                account,
                state,
                message,
            } => Ok(self
                .registrations
                .on_registration_changed(account, state, &message)),
            CoreEvent::CallStateChanged {
                call,
                state,
                message,
                calls_count,
            } => self.on_call_state_changed(call, state, &message, calls_count),
            CoreEvent::AutoAnswerDue { call } => self.on_auto_answer_due(&call),
            CoreEvent::PushNotificationReceived { payload } => {
                info!("Push notification received: {:?}", payload);
                Ok(Vec::new())
            }
            CoreEvent::MessagesReceived { room, messages } => {
                Ok(self.on_messages_received(&room, &messages))
            }
            CoreEvent::LastCallEnded { microphone_enabled } => {
                Ok(self.on_last_call_ended(microphone_enabled))
            }
            CoreEvent::AppForeground => Ok(self.on_app_visibility(true)),
            CoreEvent::AppBackground => Ok(self.on_app_visibility(false)),
            CoreEvent::ForegroundCheckDue => Ok(self.registrations.on_foreground_check()),
            CoreEvent::User(action) => Ok(self.controller.handle(action, &self.calls)),
        };

        let commands = result.unwrap_or_else(|e| {
            warn!("Dropping {} event: {}", event_type, e);
            Vec::new()
        });
        metrics::update_tracked_calls(self.calls.len());
        commands
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            calls: self.calls.iter().map(|record| record.view()).collect(),
            current_call: self.calls.current_id(),
            default_account_registered: self.registrations.is_default_account_registered(),
        }
    }

    pub fn calls(&self) -> &CallTable {
        &self.calls
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    fn on_global_state_changed(&self, state: GlobalState, message: &str) -> Vec<Command> {
        info!("Global state changed [{:?}] {}", state, message);
        if state == GlobalState::On && self.prefs.disable_video {
            warn!("Video has been disabled in app, disabling it as well in the Core");
            return vec![Command::DisableVideo];
        }
        Vec::new()
    }

    fn on_call_state_changed(
        &mut self,
        call: CallSnapshot,
        state: CallState,
        message: &str,
        calls_count: usize,
    ) -> Result<Vec<Command>> {
        let id = call.id;
        info!("Call {} state changed [{}] {}", id, state, message);

        if state == CallState::Released && !self.calls.contains(&id) {
            return Err(DomainError::unknown_call(&id));
        }

        let mut commands = Vec::new();

        // Leaving the ringing states cancels a pending auto-answer
        if !policy::is_auto_answer_eligible(state) {
            if let Some(record) = self.calls.get_mut(&id) {
                if record.take_pending_auto_answer().is_some() {
                    debug!("Cancelling pending auto-answer for call {}", id);
                    commands.push(Command::CancelAutoAnswer { call: id });
                }
            }
        }

        let gsm_conflict = state.is_incoming() && self.gsm_conflict();
        let record = self.calls.upsert(call);

        match state {
            CallState::IncomingReceived | CallState::IncomingEarlyMedia => {
                if gsm_conflict {
                    if record.take_pending_auto_answer().is_some() {
                        debug!("Cancelling pending auto-answer for declined call {}", id);
                        commands.push(Command::CancelAutoAnswer { call: id });
                    }
                    metrics::record_call_declined(Reason::Busy);
                    commands.push(Command::Decline {
                        call: id,
                        reason: Reason::Busy,
                    });
                } else {
                    if self.prefs.prevent_interface_from_showing_up {
                        warn!("We were asked to not show the incoming call screen");
                    } else {
                        commands.push(Command::ShowUi(Screen::Incoming(id)));
                    }

                    if let Some(delay) = policy::auto_answer_delay(&self.prefs) {
                        if delay.is_zero() {
                            if record.claim_auto_answer() {
                                warn!("Auto answering call {} immediately", id);
                                metrics::record_auto_answer();
                                commands.push(self.controller.accept(record.snapshot()));
                            }
                        } else if record.schedule_auto_answer(Instant::now() + delay) {
                            info!(
                                "Scheduling auto answering of call {} in {} milliseconds",
                                id,
                                delay.as_millis()
                            );
                            commands.push(Command::ScheduleAutoAnswer { call: id, delay });
                        }
                    }
                }
            }
            CallState::OutgoingProgress => {
                // Conference calls wait for Connected before showing anything
                if !record.snapshot().has_conference_info {
                    if self.prefs.prevent_interface_from_showing_up {
                        warn!("We were asked to not show the outgoing call screen");
                    } else {
                        commands.push(Command::ShowUi(Screen::Outgoing(id)));
                    }
                }

                if calls_count == 1 && self.prefs.route_audio_to_bluetooth_if_available {
                    commands.push(Command::RouteAudio {
                        call: id,
                        route: AudioRoute::Bluetooth,
                    });
                }
            }
            CallState::Connected => {
                if self.prefs.prevent_interface_from_showing_up {
                    warn!("We were asked to not show the call screen");
                } else {
                    commands.push(Command::ShowUi(Screen::Calling(id)));
                }
            }
            CallState::StreamsRunning => {
                if record.claim_first_streams(state) {
                    // Later simultaneous calls keep whatever route is active
                    if calls_count == 1 {
                        info!("First call going into StreamsRunning state for the first time, trying to route audio to headset or bluetooth if available");
                        if self.probe.is_headset_available() {
                            commands.push(Command::RouteAudio {
                                call: id,
                                route: AudioRoute::Headset,
                            });
                        } else if self.prefs.route_audio_to_bluetooth_if_available
                            && self.probe.is_bluetooth_available()
                        {
                            commands.push(Command::RouteAudio {
                                call: id,
                                route: AudioRoute::Bluetooth,
                            });
                        }
                    }

                    let snapshot = record.snapshot();
                    if self.prefs.automatically_start_call_recording
                        && !snapshot.is_recording
                        && !snapshot.is_conference
                    {
                        info!("We were asked to start the call recording automatically");
                        commands.push(Command::StartRecording { call: id });
                    }
                }
            }
            CallState::Error => {
                let error_info = &record.snapshot().error_info;
                warn!(
                    "Call error reason is {} / {} / {}",
                    error_info.protocol_code, error_info.reason, error_info.phrase
                );
                metrics::record_call_error(error_info.reason);
                commands.push(Command::EmitUserMessage(policy::error_to_message(error_info)));
            }
            CallState::End => {
                let snapshot = record.snapshot();
                if snapshot.direction == CallDirection::Outgoing
                    && snapshot.error_info.reason == Reason::Declined
                    && calls_count == 0
                {
                    info!("Call has been declined");
                    commands.push(Command::EmitUserMessage(UserMessage::CallDeclined));
                }
            }
            CallState::Idle | CallState::Released => {}
        }

        record.observe(state);

        if state.is_established() {
            self.calls.set_current(id, state);
        } else {
            self.calls.release_current(&id);
        }

        if state == CallState::Released {
            debug!("Dropping projection of released call {}", id);
            self.calls.remove(&id);
        }

        Ok(commands)
    }

    fn on_auto_answer_due(&mut self, id: &CallId) -> Result<Vec<Command>> {
        let record = self
            .calls
            .get_mut(id)
            .ok_or_else(|| DomainError::unknown_call(id))?;

        if record.take_pending_auto_answer().is_none() {
            debug!("Auto-answer for call {} was cancelled", id);
            return Ok(Vec::new());
        }

        if !policy::is_auto_answer_eligible(record.last_state()) {
            debug!(
                "Call {} is {} and no longer eligible for auto-answer",
                id,
                record.last_state()
            );
            return Ok(Vec::new());
        }

        if !record.claim_auto_answer() {
            return Ok(Vec::new());
        }

        warn!("Auto answering call {}", id);
        metrics::record_auto_answer();
        Ok(vec![self.controller.accept(record.snapshot())])
    }

    fn on_messages_received(&self, room: &RoomId, messages: &[ChatMessage]) -> Vec<Command> {
        // Without auto download the user-initiated download path exports files
        if !self.prefs.auto_download_enabled {
            return Vec::new();
        }

        let mut commands = Vec::new();
        for message in messages.iter().filter(|m| m.has_file()) {
            if message.is_ephemeral {
                warn!("Do not make ephemeral file(s) public");
                continue;
            }
            if self.prefs.vfs_enabled {
                warn!("[VFS] Do not make received file(s) public when VFS is enabled");
                continue;
            }
            if !self.prefs.make_public_media_files_downloaded {
                warn!("Making received files public setting disabled");
                continue;
            }
            if !self.probe.has_storage_permission() {
                error!(
                    "{}",
                    DomainError::PermissionDenied(
                        "can't make file public without WRITE_EXTERNAL_STORAGE".to_string()
                    )
                );
                continue;
            }

            for content in message.contents.iter().filter(|c| c.is_exportable()) {
                if let Some(attachment) = Attachment::from_content(room, message, content) {
                    info!("Trying to export file [{}] to MediaStore", attachment.name);
                    commands.push(Command::ExportAttachment(attachment));
                }
            }
        }
        commands
    }

    fn on_last_call_ended(&self, microphone_enabled: bool) -> Vec<Command> {
        info!("Last call has ended");
        if !microphone_enabled {
            warn!("Mic was muted in Core, enabling it back for next call");
            return vec![Command::EnableMicrophone];
        }
        Vec::new()
    }

    fn on_app_visibility(&self, foreground: bool) -> Vec<Command> {
        if !self.prefs.publish_presence {
            return Vec::new();
        }

        if foreground {
            info!("App is in foreground, PUBLISHING presence as Online");
            vec![Command::SetPresence(Presence::Online)]
        } else {
            // Offline rather than Busy so the server can aggregate other devices
            info!("App is in background, un-PUBLISHING presence info");
            vec![Command::SetPresence(Presence::Offline)]
        }
    }

    fn gsm_conflict(&self) -> bool {
        let uses_telecom = self.capabilities.telecom.is_supported();
        let telecom = if uses_telecom {
            self.probe.telecom_status()
        } else {
            TelecomStatus::default()
        };
        let gsm_call_active = !uses_telecom
            && self.capabilities.phone_state.is_supported()
            && self.probe.is_gsm_call_active();

        let reject = policy::should_reject_for_gsm_conflict(uses_telecom, gsm_call_active, telecom);
        if reject {
            if uses_telecom {
                warn!("Refusing the call with reason busy because Telecom Manager will reject the call");
            } else {
                warn!("Refusing the call with reason busy because a GSM call is active");
            }
        }
        reject
    }
}
