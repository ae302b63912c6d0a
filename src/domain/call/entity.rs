//! Call entities

use crate::domain::call::value_object::{CallDirection, ErrorInfo};
use crate::domain::shared::value_objects::{CallId, SipAddress};
use serde::{Deserialize, Serialize};

/// Read-only projection of an engine call, carried by every call event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub id: CallId,
    pub direction: CallDirection,
    pub remote: SipAddress,
    /// The call is part of a conference right now
    pub is_conference: bool,
    /// The call log says this call was a conference
    pub was_conference: bool,
    /// The engine knows conference information for the remote address
    pub has_conference_info: bool,
    pub is_recording: bool,
    pub error_info: ErrorInfo,
}

impl CallSnapshot {
    pub fn new(id: CallId, direction: CallDirection, remote: SipAddress) -> Self {
        Self {
            id,
            direction,
            remote,
            is_conference: false,
            was_conference: false,
            has_conference_info: false,
            is_recording: false,
            error_info: ErrorInfo::default(),
        }
    }

    pub fn incoming(remote: SipAddress) -> Self {
        Self::new(CallId::new(), CallDirection::Incoming, remote)
    }

    pub fn outgoing(remote: SipAddress) -> Self {
        Self::new(CallId::new(), CallDirection::Outgoing, remote)
    }

    pub fn with_error(mut self, error_info: ErrorInfo) -> Self {
        self.error_info = error_info;
        self
    }

    pub fn with_conference(mut self, is_conference: bool) -> Self {
        self.is_conference = is_conference;
        self
    }

    pub fn with_recording(mut self, is_recording: bool) -> Self {
        self.is_recording = is_recording;
        self
    }
}
