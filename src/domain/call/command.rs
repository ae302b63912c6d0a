//! Commands issued by the orchestration core
//!
//! The core never forces a call state. It only asks the engine and the
//! platform collaborators to do things, in order, and the engine may or may
//! not honor them.

use crate::domain::call::value_object::{AudioRoute, MediaDirection, Reason, Screen};
use crate::domain::message::Attachment;
use crate::domain::shared::value_objects::CallId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Video settings to apply when answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDecision {
    pub enable_video: bool,
    /// `None` leaves the engine default untouched
    pub direction: Option<MediaDirection>,
}

impl VideoDecision {
    pub fn unchanged() -> Self {
        Self {
            enable_video: false,
            direction: None,
        }
    }
}

/// Parameters used to accept an incoming call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerParams {
    pub record_file: PathBuf,
    pub low_bandwidth: bool,
    pub video: VideoDecision,
}

/// Parameters used to place an outgoing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallParams {
    pub record_file: PathBuf,
    pub low_bandwidth: bool,
    pub early_media_sending: bool,
}

/// Presence published for the default account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Online,
    Offline,
}

/// Message shown to the user as a toast
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserMessage {
    UserBusy,
    IoError,
    IncompatibleMedia,
    UserNotFound,
    ServerTimeout,
    TemporarilyUnavailable,
    CallDeclined,
    NetworkUnreachable,
    Generic { protocol_code: u16, phrase: String },
}

impl UserMessage {
    /// Stable key for localisation lookups
    pub fn key(&self) -> &'static str {
        match self {
            UserMessage::UserBusy => "call_error_user_busy",
            UserMessage::IoError => "call_error_io_error",
            UserMessage::IncompatibleMedia => "call_error_incompatible_media_params",
            UserMessage::UserNotFound => "call_error_user_not_found",
            UserMessage::ServerTimeout => "call_error_server_timeout",
            UserMessage::TemporarilyUnavailable => "call_error_temporarily_unavailable",
            UserMessage::CallDeclined => "call_error_declined",
            UserMessage::NetworkUnreachable => "call_error_network_unreachable",
            UserMessage::Generic { .. } => "call_error_generic",
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserMessage::UserBusy => f.write_str("user busy"),
            UserMessage::IoError => f.write_str("io error"),
            UserMessage::IncompatibleMedia => f.write_str("incompatible media"),
            UserMessage::UserNotFound => f.write_str("user not found"),
            UserMessage::ServerTimeout => f.write_str("server timeout"),
            UserMessage::TemporarilyUnavailable => f.write_str("temporarily unavailable"),
            UserMessage::CallDeclined => f.write_str("call declined"),
            UserMessage::NetworkUnreachable => f.write_str("network unreachable"),
            UserMessage::Generic {
                protocol_code,
                phrase,
            } => write!(f, "call error: {} / {}", protocol_code, phrase),
        }
    }
}

/// Command to execute against the engine or a platform collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Accept { call: CallId, params: AnswerParams },
    Decline { call: CallId, reason: Reason },
    /// Target is a raw address, interpreted by the engine
    Redirect { call: CallId, target: String },
    Terminate { call: CallId },
    TerminateAll,
    Transfer { call: CallId, target: String },
    Invite { target: String, params: CallParams },
    StartRecording { call: CallId },
    RouteAudio { call: CallId, route: AudioRoute },
    AnswerVideoUpdate { call: CallId, accept: bool },
    ShowUi(Screen),
    EmitUserMessage(UserMessage),
    ScheduleAutoAnswer { call: CallId, delay: Duration },
    CancelAutoAnswer { call: CallId },
    StartForegroundNotification,
    StopForegroundNotification,
    EnableMicrophone,
    DisableVideo,
    SetPresence(Presence),
    ExportAttachment(Attachment),
}

impl Command {
    /// Short name used in logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            Command::Accept { .. } => "accept",
            Command::Decline { .. } => "decline",
            Command::Redirect { .. } => "redirect",
            Command::Terminate { .. } => "terminate",
            Command::TerminateAll => "terminate_all",
            Command::Transfer { .. } => "transfer",
            Command::Invite { .. } => "invite",
            Command::StartRecording { .. } => "start_recording",
            Command::RouteAudio { .. } => "route_audio",
            Command::AnswerVideoUpdate { .. } => "answer_video_update",
            Command::ShowUi(_) => "show_ui",
            Command::EmitUserMessage(_) => "emit_user_message",
            Command::ScheduleAutoAnswer { .. } => "schedule_auto_answer",
            Command::CancelAutoAnswer { .. } => "cancel_auto_answer",
            Command::StartForegroundNotification => "start_foreground_notification",
            Command::StopForegroundNotification => "stop_foreground_notification",
            Command::EnableMicrophone => "enable_microphone",
            Command::DisableVideo => "disable_video",
            Command::SetPresence(_) => "set_presence",
            Command::ExportAttachment(_) => "export_attachment",
        }
    }
}
