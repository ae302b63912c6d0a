//! Domain errors

use crate::domain::shared::value_objects::CallId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Engine or account misconfigured. Reported once, never fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Busy, timeout, unreachable: the call proceeds to End.
    #[error("Transient call error: {0}")]
    TransientCall(String),

    /// A platform permission is missing and the feature is disabled.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An event referenced a call or account the core does not know.
    #[error("Unexpected engine state: {0}")]
    UnexpectedEngineState(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl DomainError {
    pub fn unknown_call(id: &CallId) -> Self {
        DomainError::UnexpectedEngineState(format!("unknown call {}", id))
    }
}

/// Failure reported by the SIP engine or a platform collaborator while
/// executing a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Call not found: {0}")]
    CallNotFound(CallId),

    #[error("Call params unavailable")]
    ParamsUnavailable,

    #[error("Rejected by engine: {0}")]
    Rejected(String),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::Configuration("recordings dir is empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: recordings dir is empty");

        let id = CallId::new();
        let err = DomainError::unknown_call(&id);
        assert_eq!(err.to_string(), format!("Unexpected engine state: unknown call {}", id));
    }
}
