//! Rate limiter error types.

use thiserror::Error;

/// Errors that can occur in the rate limiter.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Storage error.
    #[error("rate limiter storage error: {0}")]
    StorageError(#[from] tether_storage::StorageError),

    /// A limit of zero calls was requested.
    #[error("invalid limit for endpoint {endpoint}: calls per window must be at least 1")]
    InvalidLimit {
        /// The endpoint being configured.
        endpoint: String,
    },
}

/// Result type for rate limiter operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;
