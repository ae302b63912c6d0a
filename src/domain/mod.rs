//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Projections of engine calls and accounts
//! - Value objects shared by events and commands
//! - The call policy engine: pure decision functions
//! - Ports for platform capabilities

pub mod account;
pub mod call;
pub mod capability;
pub mod message;
pub mod policy;
pub mod recording;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, EngineError, Result};
