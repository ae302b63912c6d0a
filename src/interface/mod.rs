//! Interface layer - What the host application talks to
//!
//! This layer handles:
//! - Wiring the state machine, bus and executor together
//! - Publishing snapshots to readers

pub mod runtime;

pub use runtime::Orchestrator;
