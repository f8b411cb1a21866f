//! Core error types.

use thiserror::Error;

/// Errors raised while constructing core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An identifier is not safe to use as a storage path component.
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        /// Which identifier was rejected (`session id`, `gate id`).
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
