//! Call record - the core's own view of one engine call
//!
//! The engine owns the call. The record keeps the latest projection the
//! engine handed us plus the fields only the orchestration core cares
//! about: the state of the previously processed event, the pending
//! auto-answer, and whether first-media side effects already ran.

use crate::domain::call::entity::CallSnapshot;
use crate::domain::call::value_object::{CallDirection, CallState};
use crate::domain::shared::value_objects::CallId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Auto-answer waiting for its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAutoAnswer {
    pub call: CallId,
    pub deadline: Instant,
}

/// Per-call record owned by the call state machine
#[derive(Debug, Clone)]
pub struct CallRecord {
    snapshot: CallSnapshot,
    /// State of the last processed event for this call
    last_state: CallState,
    pending_auto_answer: Option<PendingAutoAnswer>,
    auto_answer_issued: bool,
    streams_handled: bool,
    first_seen_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn new(snapshot: CallSnapshot) -> Self {
        Self {
            snapshot,
            last_state: CallState::Idle,
            pending_auto_answer: None,
            auto_answer_issued: false,
            streams_handled: false,
            first_seen_at: Utc::now(),
        }
    }

    /// Replace the engine projection with a fresher one
    pub fn refresh(&mut self, snapshot: CallSnapshot) {
        self.snapshot = snapshot;
    }

    /// Remember the state of the event just processed
    pub fn observe(&mut self, state: CallState) {
        self.last_state = state;
    }

    /// Record a pending auto-answer. Returns false when this call already
    /// has one pending or was already auto-answered.
    pub fn schedule_auto_answer(&mut self, deadline: Instant) -> bool {
        if self.pending_auto_answer.is_some() || self.auto_answer_issued {
            return false;
        }
        self.pending_auto_answer = Some(PendingAutoAnswer {
            call: self.snapshot.id,
            deadline,
        });
        true
    }

    /// Remove the pending auto-answer, if any
    pub fn take_pending_auto_answer(&mut self) -> Option<PendingAutoAnswer> {
        self.pending_auto_answer.take()
    }

    /// Claim the single auto-answer this call is allowed. Returns false if
    /// it was already claimed.
    pub fn claim_auto_answer(&mut self) -> bool {
        if self.auto_answer_issued {
            return false;
        }
        self.auto_answer_issued = true;
        true
    }

    /// True exactly once: on the first StreamsRunning that directly
    /// follows Connected.
    pub fn claim_first_streams(&mut self, new_state: CallState) -> bool {
        if new_state != CallState::StreamsRunning
            || self.last_state != CallState::Connected
            || self.streams_handled
        {
            return false;
        }
        self.streams_handled = true;
        true
    }

    pub fn id(&self) -> &CallId {
        &self.snapshot.id
    }

    pub fn snapshot(&self) -> &CallSnapshot {
        &self.snapshot
    }

    pub fn last_state(&self) -> CallState {
        self.last_state
    }

    pub fn direction(&self) -> CallDirection {
        self.snapshot.direction
    }

    pub fn pending_auto_answer(&self) -> Option<&PendingAutoAnswer> {
        self.pending_auto_answer.as_ref()
    }

    pub fn first_seen_at(&self) -> &DateTime<Utc> {
        &self.first_seen_at
    }

    pub fn view(&self) -> CallView {
        CallView {
            id: self.snapshot.id,
            direction: self.snapshot.direction,
            remote: self.snapshot.remote.uri_only(),
            state: self.last_state,
            is_recording: self.snapshot.is_recording,
            is_conference: self.snapshot.is_conference,
            auto_answer_pending: self.pending_auto_answer.is_some(),
            first_seen_at: self.first_seen_at,
        }
    }
}

/// Immutable view handed to UI and notification readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallView {
    pub id: CallId,
    pub direction: CallDirection,
    pub remote: String,
    pub state: CallState,
    pub is_recording: bool,
    pub is_conference: bool,
    pub auto_answer_pending: bool,
    pub first_seen_at: DateTime<Utc>,
}
