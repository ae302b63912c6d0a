//! Application layer - turns engine and user events into commands
//!
//! Everything here is synchronous and side-effect free apart from logging
//! and metrics. Commands are executed by the infrastructure layer.

pub mod call_controller;
pub mod call_state_machine;
pub mod call_table;
pub mod registration_watcher;

pub use call_controller::CallController;
pub use call_state_machine::{CallStateMachine, OrchestratorSnapshot};
pub use call_table::CallTable;
pub use registration_watcher::RegistrationWatcher;
