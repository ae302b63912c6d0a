//! Call bounded context - projections of engine calls and the commands the
//! core issues about them

pub mod aggregate;
pub mod command;
pub mod entity;
pub mod event;
pub mod value_object;

pub use aggregate::{CallRecord, CallView, PendingAutoAnswer};
pub use command::{
    AnswerParams, CallParams, Command, Presence, UserMessage, VideoDecision,
};
pub use entity::CallSnapshot;
pub use event::{CoreEvent, GlobalState, UserAction};
pub use value_object::{
    AudioRoute, CallDirection, CallState, ErrorInfo, MediaDirection, Reason, Screen,
};
