//! Callflow - call-state orchestration core for a SIP softphone
//!
//! Engine, platform and user events go through a single ordered event bus
//! into a state machine that decides what to do, as commands, according
//! to user preferences and platform capabilities. A command executor
//! carries the commands out against the SIP engine and the platform.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use application::{CallStateMachine, OrchestratorSnapshot};
pub use config::Config;
pub use domain::shared::error::{DomainError, EngineError};
pub use domain::shared::result::Result;
pub use interface::Orchestrator;
