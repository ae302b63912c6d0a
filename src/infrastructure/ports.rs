//! Ports to the SIP engine and platform collaborators
//!
//! The core never holds an engine call object. Everything is addressed by
//! [`CallId`] and executed through these traits.

use crate::domain::call::{AnswerParams, AudioRoute, CallParams, Presence, Reason, Screen, UserMessage};
use crate::domain::message::{Attachment, MediaKind};
use crate::domain::shared::error::EngineResult;
use crate::domain::shared::value_objects::{CallId, SipAddress};
use std::path::PathBuf;
use std::sync::Arc;

/// The SIP engine that owns calls, accounts and media
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SipEngine: Send + Sync {
    /// Accept an incoming call. `None` accepts with engine defaults.
    async fn accept(&self, call: CallId, params: Option<AnswerParams>) -> EngineResult<()>;

    async fn decline(&self, call: CallId, reason: Reason) -> EngineResult<()>;

    async fn redirect(&self, call: CallId, target: SipAddress) -> EngineResult<()>;

    async fn terminate(&self, call: CallId) -> EngineResult<()>;

    async fn terminate_all(&self) -> EngineResult<()>;

    async fn transfer(&self, call: CallId, target: SipAddress) -> EngineResult<()>;

    /// Place an outgoing call and return the id the engine assigned
    async fn invite(&self, target: SipAddress, params: CallParams) -> EngineResult<CallId>;

    async fn start_recording(&self, call: CallId) -> EngineResult<()>;

    async fn route_audio(&self, call: CallId, route: AudioRoute) -> EngineResult<()>;

    async fn answer_video_update(&self, call: CallId, accept: bool) -> EngineResult<()>;

    async fn set_microphone_enabled(&self, enabled: bool) -> EngineResult<()>;

    async fn disable_video(&self) -> EngineResult<()>;

    async fn set_presence(&self, presence: Presence) -> EngineResult<()>;

    /// Turn user input (a username, a phone number, a full URI) into an
    /// address using the default account's domain
    fn interpret_address(&self, raw: &str) -> Option<SipAddress>;
}

/// Shows call screens
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn show(&self, screen: Screen) -> EngineResult<()>;
}

/// Keeps the process alive while calls or registrations need it
#[cfg_attr(test, mockall::automock)]
pub trait NotificationManager: Send + Sync {
    fn start_foreground(&self);

    /// Idempotent; does nothing while a call still needs the service
    fn stop_foreground_if_possible(&self);
}

#[cfg_attr(test, mockall::automock)]
pub trait UserMessageSink: Send + Sync {
    fn emit(&self, message: UserMessage);
}

/// Public media collections (pictures, movies, music)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Copy the attachment into the collection for `kind` and return where it landed
    async fn export(&self, attachment: &Attachment, kind: MediaKind) -> EngineResult<PathBuf>;
}

/// Collaborators the command executor talks to
#[derive(Clone)]
pub struct Collaborators {
    pub engine: Arc<dyn SipEngine>,
    pub navigator: Arc<dyn Navigator>,
    pub notifications: Arc<dyn NotificationManager>,
    pub messages: Arc<dyn UserMessageSink>,
}
