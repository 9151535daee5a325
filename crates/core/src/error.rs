//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only deterministic failures belong here (bad input, duplicate ids, missing
/// records, permission checks). Storage failures have their own error types
/// in the infra crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected before any state was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation collides with existing state (e.g. duplicate id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The acting user lacks the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// True for errors caused by caller input rather than by stored state.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidId(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = DomainError::validation("template name is required");
        assert_eq!(err.to_string(), "validation failed: template name is required");
    }

    #[test]
    fn validation_classification() {
        assert!(DomainError::validation("x").is_validation());
        assert!(DomainError::invalid_id("x").is_validation());
        assert!(!DomainError::conflict("x").is_validation());
        assert!(!DomainError::not_found("x").is_validation());
    }
}
