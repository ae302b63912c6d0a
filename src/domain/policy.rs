//! Call policy engine
//!
//! Stateless decision functions. All of them are total: whatever the
//! inputs, they return a decision and never fail.

use crate::config::CallPreferences;
use crate::domain::call::command::{UserMessage, VideoDecision};
use crate::domain::call::value_object::{CallState, ErrorInfo, MediaDirection, Reason};
use crate::domain::capability::TelecomStatus;
use std::time::Duration;

/// Should an incoming call be declined because the phone is already busy
/// with a cellular or platform-managed call?
///
/// Without telecom integration the native cellular call state decides.
/// With it, the cellular state is not trustworthy (the platform fakes
/// calls) and the telecom service's own verdict is used instead.
pub fn should_reject_for_gsm_conflict(
    uses_telecom_api: bool,
    gsm_call_active: bool,
    telecom: TelecomStatus,
) -> bool {
    if uses_telecom_api {
        !telecom.incoming_call_permitted || telecom.in_managed_call
    } else {
        gsm_call_active
    }
}

/// `None` when auto-answer is off, otherwise the delay (zero = immediately)
pub fn auto_answer_delay(prefs: &CallPreferences) -> Option<Duration> {
    prefs
        .auto_answer_enabled
        .then(|| prefs.auto_answer_delay())
}

/// Auto-answer only applies while the call is still ringing on our side
pub fn is_auto_answer_eligible(state: CallState) -> bool {
    state.is_incoming()
}

/// Map a call error to the message shown to the user
pub fn error_to_message(error: &ErrorInfo) -> UserMessage {
    match error.reason {
        Reason::Busy => UserMessage::UserBusy,
        Reason::IoError => UserMessage::IoError,
        Reason::NotAcceptable => UserMessage::IncompatibleMedia,
        Reason::NotFound => UserMessage::UserNotFound,
        Reason::ServerTimeout => UserMessage::ServerTimeout,
        Reason::TemporarilyUnavailable => UserMessage::TemporarilyUnavailable,
        _ => UserMessage::Generic {
            protocol_code: error.protocol_code,
            phrase: error.phrase.clone(),
        },
    }
}

/// Incoming group calls must not start in the audio-only layout
pub fn should_enable_video_for_group_answer(
    was_conference: bool,
    auto_initiate: bool,
) -> VideoDecision {
    if !was_conference {
        return VideoDecision::unchanged();
    }

    let direction = if auto_initiate {
        MediaDirection::SendRecv
    } else {
        MediaDirection::RecvOnly
    };

    VideoDecision {
        enable_video: true,
        direction: Some(direction),
    }
}

/// Reason used when the user declines: busy while another call is up
pub fn decline_reason(calls_count: usize) -> Reason {
    if calls_count > 1 {
        Reason::Busy
    } else {
        Reason::Declined
    }
}
