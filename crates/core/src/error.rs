//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure is recovered at the HTTP boundary and surfaced to the caller
/// as a human-readable message; none of these are fatal to the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identity already exists (registry add with a taken id).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A lookup on an unknown identity (get/edit/delete).
    #[error("not found: {0}")]
    NotFound(String),

    /// The movement validator rejected a candidate movement
    /// (insufficient stock, missing/duplicate endpoints, non-positive quantity).
    #[error("invalid movement: {0}")]
    InvalidMovement(String),

    /// Malformed numeric input at the boundary (e.g. a non-integer quantity).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A registry field failed validation (e.g. empty id or name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store failed. Infrastructure concern, not a caller mistake.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn duplicate_key(msg: impl Into<String>) -> Self {
        Self::DuplicateKey(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_movement(msg: impl Into<String>) -> Self {
        Self::InvalidMovement(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
