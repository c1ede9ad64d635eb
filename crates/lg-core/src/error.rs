//! # AppError
//!
//! Centralized error handling for the Lumen-Gallery ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all lg-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Gallery, Image, membership)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty title, duplicate image in set)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or invalid session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (e.g., not the owner, not admin)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referential conflict (e.g., image not owned by caller, cover image
    /// outside membership, duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the NotFound variant.
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }

    /// Wraps an infrastructure error. Used by adapters that cannot implement
    /// `From` for foreign error types.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for Lumen-Gallery logic.
pub type Result<T> = std::result::Result<T, AppError>;
