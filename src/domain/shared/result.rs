//! Domain result type

use super::error::DomainError;

/// Result of a core operation that can fail with a [`DomainError`]
pub type Result<T> = std::result::Result<T, DomainError>;
