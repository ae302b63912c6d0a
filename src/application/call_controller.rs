//! User-initiated call operations
//!
//! User actions travel through the same event bus as engine events, so
//! they are handled in order with everything else and see the same call
//! table.

use crate::application::call_table::CallTable;
use crate::config::CallPreferences;
use crate::domain::call::{
    AnswerParams, CallParams, CallSnapshot, Command, UserAction, UserMessage,
};
use crate::domain::capability::PlatformProbe;
use crate::domain::policy;
use crate::domain::recording;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, SipAddress};
use chrono::Local;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct CallController {
    prefs: Arc<CallPreferences>,
    probe: Arc<dyn PlatformProbe>,
}

impl CallController {
    pub fn new(prefs: Arc<CallPreferences>, probe: Arc<dyn PlatformProbe>) -> Self {
        Self { prefs, probe }
    }

    pub fn handle(&self, action: UserAction, calls: &CallTable) -> Vec<Command> {
        let result = match action {
            UserAction::Answer(call) => self.answer(&call, calls),
            UserAction::Decline(call) => self.decline(&call, calls),
            UserAction::Terminate(call) => self.terminate(&call, calls),
            UserAction::Transfer { target } => Ok(self.transfer(&target, calls)),
            UserAction::StartCall { address } => Ok(self.start_call(&address)),
            UserAction::TerminateCurrentOrAll => Ok(self.terminate_current_or_all(calls)),
            UserAction::AnswerVideoUpdate { call, accept } => {
                self.answer_video_update(&call, accept, calls)
            }
            UserAction::VideoUpdateTimedOut(call) => {
                warn!("Video update request timed out for call {}, declining", call);
                self.answer_video_update(&call, false, calls)
            }
        };

        result.unwrap_or_else(|e| {
            warn!("Dropping user action: {}", e);
            Vec::new()
        })
    }

    /// Parameters used when accepting `call`
    pub fn answer_params(&self, call: &CallSnapshot) -> AnswerParams {
        let low_bandwidth = self.probe.has_low_bandwidth();
        if low_bandwidth {
            warn!("Enabling low bandwidth mode!");
        }

        let video = policy::should_enable_video_for_group_answer(
            call.was_conference,
            self.prefs.video_auto_initiate,
        );
        if video.enable_video {
            info!("Enabling video on call params to prevent audio-only layout when answering");
        }

        let now = Local::now();
        let dir = &self.prefs.recordings_dir;
        let record_file = if call.is_conference {
            recording::file_path_for_conference(dir, call.remote.display_name(), &now)
        } else {
            recording::file_path_for_address(dir, &call.remote, &now)
        };

        AnswerParams {
            record_file,
            low_bandwidth,
            video,
        }
    }

    pub fn accept(&self, call: &CallSnapshot) -> Command {
        info!("Answering call {}", call.id);
        Command::Accept {
            call: call.id,
            params: self.answer_params(call),
        }
    }

    fn answer(&self, id: &CallId, calls: &CallTable) -> Result<Vec<Command>> {
        let record = calls.get(id).ok_or_else(|| DomainError::unknown_call(id))?;
        Ok(vec![self.accept(record.snapshot())])
    }

    fn decline(&self, id: &CallId, calls: &CallTable) -> Result<Vec<Command>> {
        if !calls.contains(id) {
            return Err(DomainError::unknown_call(id));
        }

        if self.prefs.redirect_declined_call_to_voicemail {
            if let Some(voicemail) = self.prefs.voicemail_uri.as_deref() {
                info!("Redirecting call {} to voice mail URI: {}", id, voicemail);
                return Ok(vec![Command::Redirect {
                    call: *id,
                    target: voicemail.to_string(),
                }]);
            }
        }

        let reason = policy::decline_reason(calls.active_len());
        info!("Declining call [{}] with reason [{}]", id, reason);
        Ok(vec![Command::Decline { call: *id, reason }])
    }

    fn terminate(&self, id: &CallId, calls: &CallTable) -> Result<Vec<Command>> {
        if !calls.contains(id) {
            return Err(DomainError::unknown_call(id));
        }
        info!("Terminating call {}", id);
        Ok(vec![Command::Terminate { call: *id }])
    }

    fn transfer(&self, target: &str, calls: &CallTable) -> Vec<Command> {
        match calls.current_or_first() {
            Some(record) => {
                info!("Transferring current call to {}", target);
                vec![Command::Transfer {
                    call: *record.id(),
                    target: target.trim().to_string(),
                }]
            }
            None => {
                error!("Couldn't find a call to transfer");
                Vec::new()
            }
        }
    }

    fn start_call(&self, address: &str) -> Vec<Command> {
        let target = address.trim();
        if target.is_empty() {
            error!("Empty address, abort outgoing call");
            return vec![Command::EmitUserMessage(UserMessage::NetworkUnreachable)];
        }

        if !self.probe.is_network_reachable() {
            error!("Network unreachable, abort outgoing call");
            return vec![Command::EmitUserMessage(UserMessage::NetworkUnreachable)];
        }

        vec![Command::Invite {
            target: target.to_string(),
            params: self.call_params(target),
        }]
    }

    fn call_params(&self, target: &str) -> CallParams {
        let low_bandwidth = self.probe.has_low_bandwidth();
        if low_bandwidth {
            warn!("Enabling low bandwidth mode!");
        }

        let now = Local::now();
        let record_file = match SipAddress::parse(target) {
            Ok(address) => {
                recording::file_path_for_address(&self.prefs.recordings_dir, &address, &now)
            }
            Err(_) => recording::file_path_for_name(&self.prefs.recordings_dir, target, &now),
        };

        CallParams {
            record_file,
            low_bandwidth,
            early_media_sending: self.prefs.send_early_media,
        }
    }

    fn terminate_current_or_all(&self, calls: &CallTable) -> Vec<Command> {
        match calls.current() {
            Some(record) => vec![Command::Terminate { call: *record.id() }],
            None => vec![Command::TerminateAll],
        }
    }

    fn answer_video_update(
        &self,
        id: &CallId,
        accept: bool,
        calls: &CallTable,
    ) -> Result<Vec<Command>> {
        if !calls.contains(id) {
            return Err(DomainError::unknown_call(id));
        }
        Ok(vec![Command::AnswerVideoUpdate { call: *id, accept }])
    }
}
