//! Circuit breaker error types.

use thiserror::Error;

/// Errors that can occur while reading or persisting breaker state.
///
/// Persistence failures are always surfaced: breaker state gates whether
/// the agent loop may run, so it must never silently diverge from disk.
#[derive(Debug, Error)]
pub enum BreakerError {
    /// Storage error.
    #[error("breaker storage error: {0}")]
    StorageError(#[from] tether_storage::StorageError),
}

/// Result type for breaker operations.
pub type BreakerResult<T> = Result<T, BreakerError>;
