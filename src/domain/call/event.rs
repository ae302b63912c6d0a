//! Events delivered from the SIP engine and the platform

use crate::domain::account::{AccountSnapshot, RegistrationState};
use crate::domain::call::entity::CallSnapshot;
use crate::domain::call::value_object::CallState;
use crate::domain::message::ChatMessage;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::value_objects::{CallId, RoomId};
use serde::{Deserialize, Serialize};

/// Engine global state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalState {
    Off,
    Startup,
    On,
    Shutdown,
    Configuring,
}

/// Something the user asked for through the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    Answer(CallId),
    Decline(CallId),
    Terminate(CallId),
    /// Transfer the current call to a raw address
    Transfer { target: String },
    /// Place a call to a raw address
    StartCall { address: String },
    TerminateCurrentOrAll,
    AnswerVideoUpdate { call: CallId, accept: bool },
    /// The remote asked for video and nobody answered in time
    VideoUpdateTimedOut(CallId),
}

/// Every event the orchestration core reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreEvent {
    GlobalStateChanged {
        state: GlobalState,
        message: String,
    },
    RegistrationChanged {
        account: AccountSnapshot,
        state: RegistrationState,
        message: String,
    },
    CallStateChanged {
        call: CallSnapshot,
        state: CallState,
        message: String,
        /// Number of calls the engine holds when the event fires
        calls_count: usize,
    },
    /// An auto-answer timer expired
    AutoAnswerDue {
        call: CallId,
    },
    PushNotificationReceived {
        payload: Option<String>,
    },
    MessagesReceived {
        room: RoomId,
        messages: Vec<ChatMessage>,
    },
    LastCallEnded {
        microphone_enabled: bool,
    },
    AppForeground,
    AppBackground,
    /// Delayed check whether the foreground notification can go away
    ForegroundCheckDue,
    User(UserAction),
}

impl DomainEvent for CoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CoreEvent::GlobalStateChanged { .. } => "core.global_state_changed",
            CoreEvent::RegistrationChanged { .. } => "account.registration_changed",
            CoreEvent::CallStateChanged { .. } => "call.state_changed",
            CoreEvent::AutoAnswerDue { .. } => "call.auto_answer_due",
            CoreEvent::PushNotificationReceived { .. } => "core.push_received",
            CoreEvent::MessagesReceived { .. } => "chat.messages_received",
            CoreEvent::LastCallEnded { .. } => "call.last_call_ended",
            CoreEvent::AppForeground => "app.foreground",
            CoreEvent::AppBackground => "app.background",
            CoreEvent::ForegroundCheckDue => "app.foreground_check_due",
            CoreEvent::User(_) => "user.action",
        }
    }
}

impl CoreEvent {
    /// Convenience constructor for call state changes
    pub fn call_state(call: CallSnapshot, state: CallState, calls_count: usize) -> Self {
        CoreEvent::CallStateChanged {
            call,
            state,
            message: String::new(),
            calls_count,
        }
    }
}
