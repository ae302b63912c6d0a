//! Call value objects

use crate::domain::shared::value_objects::CallId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    /// The remote party called us
    Incoming,
    /// We placed the call
    Outgoing,
}

/// Call state as reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    #[default]
    Idle,
    IncomingReceived,
    IncomingEarlyMedia,
    OutgoingProgress,
    Connected,
    StreamsRunning,
    End,
    Error,
    Released,
}

impl CallState {
    /// Ringing on our side, waiting for a local answer
    pub fn is_incoming(&self) -> bool {
        matches!(self, CallState::IncomingReceived | CallState::IncomingEarlyMedia)
    }

    /// Established with the remote party
    pub fn is_established(&self) -> bool {
        matches!(self, CallState::Connected | CallState::StreamsRunning)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::End | CallState::Error | CallState::Released)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CallState::Idle => "Idle",
            CallState::IncomingReceived => "IncomingReceived",
            CallState::IncomingEarlyMedia => "IncomingEarlyMedia",
            CallState::OutgoingProgress => "OutgoingProgress",
            CallState::Connected => "Connected",
            CallState::StreamsRunning => "StreamsRunning",
            CallState::End => "End",
            CallState::Error => "Error",
            CallState::Released => "Released",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason attached to a decline or to a call error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[default]
    None,
    Busy,
    Declined,
    IoError,
    NotAcceptable,
    NotFound,
    ServerTimeout,
    TemporarilyUnavailable,
    Unknown,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::None => "none",
            Reason::Busy => "busy",
            Reason::Declined => "declined",
            Reason::IoError => "io_error",
            Reason::NotAcceptable => "not_acceptable",
            Reason::NotFound => "not_found",
            Reason::ServerTimeout => "server_timeout",
            Reason::TemporarilyUnavailable => "temporarily_unavailable",
            Reason::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details the engine attaches to a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub reason: Reason,
    pub protocol_code: u16,
    pub phrase: String,
}

impl ErrorInfo {
    pub fn new(reason: Reason, protocol_code: u16, phrase: impl Into<String>) -> Self {
        Self {
            reason,
            protocol_code,
            phrase: phrase.into(),
        }
    }
}

/// Media direction for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaDirection {
    Inactive,
    SendOnly,
    RecvOnly,
    SendRecv,
}

/// Where call audio is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioRoute {
    Earpiece,
    Speaker,
    Headset,
    Bluetooth,
}

/// Screen the navigation collaborator should bring up. Carries only
/// identifiers so navigation never holds engine objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Incoming(CallId),
    Outgoing(CallId),
    Calling(CallId),
}
