//! In-memory engine and platform
//!
//! Records every request it receives instead of talking to a real SIP
//! stack. Used by the demo binary and the integration tests.

use crate::domain::call::{
    AnswerParams, AudioRoute, CallParams, Presence, Reason, Screen, UserMessage,
};
use crate::domain::capability::{PlatformProbe, TelecomStatus};
use crate::domain::message::{Attachment, MediaKind};
use crate::domain::shared::error::{EngineError, EngineResult};
use crate::domain::shared::value_objects::{CallId, SipAddress};
use crate::infrastructure::ports::{
    Collaborators, MediaStore, Navigator, NotificationManager, SipEngine, UserMessageSink,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// One request received by the simulated platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    Accept { call: CallId, with_params: bool },
    Decline { call: CallId, reason: Reason },
    Redirect { call: CallId, target: SipAddress },
    Terminate { call: CallId },
    TerminateAll,
    Transfer { call: CallId, target: SipAddress },
    Invite { call: CallId, target: SipAddress },
    StartRecording { call: CallId },
    RouteAudio { call: CallId, route: AudioRoute },
    AnswerVideoUpdate { call: CallId, accept: bool },
    MicrophoneEnabled(bool),
    VideoDisabled,
    Presence(Presence),
    Show(Screen),
    ForegroundStarted,
    ForegroundStopped,
    Message(UserMessage),
    Exported { name: String, kind: MediaKind },
}

pub struct SimulatedPlatform {
    domain: String,
    interactions: Mutex<Vec<Interaction>>,
    foreground: AtomicBool,
    params_unavailable: AtomicBool,
}

impl SimulatedPlatform {
    /// `domain` completes bare usernames, like an account's SIP domain
    pub fn new(domain: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            domain: domain.into(),
            interactions: Mutex::new(Vec::new()),
            foreground: AtomicBool::new(false),
            params_unavailable: AtomicBool::new(false),
        })
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            engine: self.clone(),
            navigator: self.clone(),
            notifications: self.clone(),
            messages: self.clone(),
        }
    }

    /// Make the next accepts with params fail, as an engine without call
    /// params would
    pub fn set_params_unavailable(&self, unavailable: bool) {
        self.params_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().clone()
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn record(&self, interaction: Interaction) {
        info!("[Simulated] {:?}", interaction);
        self.lock().push(interaction);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Interaction>> {
        self.interactions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl SipEngine for SimulatedPlatform {
    async fn accept(&self, call: CallId, params: Option<AnswerParams>) -> EngineResult<()> {
        if params.is_some() && self.params_unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::ParamsUnavailable);
        }
        self.record(Interaction::Accept {
            call,
            with_params: params.is_some(),
        });
        Ok(())
    }

    async fn decline(&self, call: CallId, reason: Reason) -> EngineResult<()> {
        self.record(Interaction::Decline { call, reason });
        Ok(())
    }

    async fn redirect(&self, call: CallId, target: SipAddress) -> EngineResult<()> {
        self.record(Interaction::Redirect { call, target });
        Ok(())
    }

    async fn terminate(&self, call: CallId) -> EngineResult<()> {
        self.record(Interaction::Terminate { call });
        Ok(())
    }

    async fn terminate_all(&self) -> EngineResult<()> {
        self.record(Interaction::TerminateAll);
        Ok(())
    }

    async fn transfer(&self, call: CallId, target: SipAddress) -> EngineResult<()> {
        self.record(Interaction::Transfer { call, target });
        Ok(())
    }

    async fn invite(&self, target: SipAddress, _params: CallParams) -> EngineResult<CallId> {
        let call = CallId::new();
        self.record(Interaction::Invite { call, target });
        Ok(call)
    }

    async fn start_recording(&self, call: CallId) -> EngineResult<()> {
        self.record(Interaction::StartRecording { call });
        Ok(())
    }

    async fn route_audio(&self, call: CallId, route: AudioRoute) -> EngineResult<()> {
        self.record(Interaction::RouteAudio { call, route });
        Ok(())
    }

    async fn answer_video_update(&self, call: CallId, accept: bool) -> EngineResult<()> {
        self.record(Interaction::AnswerVideoUpdate { call, accept });
        Ok(())
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> EngineResult<()> {
        self.record(Interaction::MicrophoneEnabled(enabled));
        Ok(())
    }

    async fn disable_video(&self) -> EngineResult<()> {
        self.record(Interaction::VideoDisabled);
        Ok(())
    }

    async fn set_presence(&self, presence: Presence) -> EngineResult<()> {
        self.record(Interaction::Presence(presence));
        Ok(())
    }

    fn interpret_address(&self, raw: &str) -> Option<SipAddress> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains(char::is_whitespace) {
            return None;
        }
        if raw.starts_with("sip:") || raw.starts_with("sips:") || raw.contains('<') {
            return SipAddress::parse(raw).ok();
        }
        if raw.contains('@') {
            return SipAddress::parse(&format!("sip:{}", raw)).ok();
        }
        SipAddress::parse(&format!("sip:{}@{}", raw, self.domain)).ok()
    }
}

impl Navigator for SimulatedPlatform {
    fn show(&self, screen: Screen) -> EngineResult<()> {
        self.record(Interaction::Show(screen));
        Ok(())
    }
}

impl NotificationManager for SimulatedPlatform {
    fn start_foreground(&self) {
        if !self.foreground.swap(true, Ordering::SeqCst) {
            self.record(Interaction::ForegroundStarted);
        }
    }

    fn stop_foreground_if_possible(&self) {
        if self.foreground.swap(false, Ordering::SeqCst) {
            self.record(Interaction::ForegroundStopped);
        }
    }
}

impl UserMessageSink for SimulatedPlatform {
    fn emit(&self, message: UserMessage) {
        self.record(Interaction::Message(message));
    }
}

#[async_trait::async_trait]
impl MediaStore for SimulatedPlatform {
    async fn export(&self, attachment: &Attachment, kind: MediaKind) -> EngineResult<PathBuf> {
        self.record(Interaction::Exported {
            name: attachment.name.clone(),
            kind,
        });
        let collection = match kind {
            MediaKind::Image => "Pictures",
            MediaKind::Video => "Movies",
            MediaKind::Audio => "Music",
            MediaKind::Other => {
                return Err(EngineError::Rejected(format!(
                    "no collection for {}",
                    attachment.name
                )))
            }
        };
        Ok(PathBuf::from(collection).join(&attachment.name))
    }
}

/// Platform probe with fixed answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticProbe {
    pub gsm_call_active: bool,
    pub telecom: TelecomStatus,
    pub headset_available: bool,
    pub bluetooth_available: bool,
    pub low_bandwidth: bool,
    pub network_reachable: bool,
    pub storage_permission: bool,
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self {
            gsm_call_active: false,
            telecom: TelecomStatus::default(),
            headset_available: false,
            bluetooth_available: false,
            low_bandwidth: false,
            network_reachable: true,
            storage_permission: true,
        }
    }
}

impl PlatformProbe for StaticProbe {
    fn is_gsm_call_active(&self) -> bool {
        self.gsm_call_active
    }

    fn telecom_status(&self) -> TelecomStatus {
        self.telecom
    }

    fn is_headset_available(&self) -> bool {
        self.headset_available
    }

    fn is_bluetooth_available(&self) -> bool {
        self.bluetooth_available
    }

    fn has_low_bandwidth(&self) -> bool {
        self.low_bandwidth
    }

    fn is_network_reachable(&self) -> bool {
        self.network_reachable
    }

    fn has_storage_permission(&self) -> bool {
        self.storage_permission
    }
}
