//! Runtime error types.

use thiserror::Error;

/// Errors that can occur while wiring or driving governance.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] tether_config::ConfigError),

    /// The data directory could not be prepared.
    #[error("Data directory error at {path}: {source}")]
    DataDirError {
        /// The directory involved.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `secret_source = "env"` but no secret was supplied.
    #[error("No audit secret: set {var} or change audit.secret_source")]
    MissingSecret {
        /// The variable that was expected.
        var: &'static str,
    },

    /// Secret or signing error.
    #[error("Crypto error: {0}")]
    CryptoError(#[from] tether_crypto::CryptoError),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(#[from] tether_storage::StorageError),

    /// Audit error.
    #[error("Audit error: {0}")]
    AuditError(#[from] tether_audit::AuditError),

    /// Circuit breaker error.
    #[error("Circuit breaker error: {0}")]
    BreakerError(#[from] tether_breaker::BreakerError),

    /// Rate limiter error.
    #[error("Rate limiter error: {0}")]
    RateLimitError(#[from] tether_ratelimit::RateLimitError),

    /// Approval gate error.
    #[error("Approval error: {0}")]
    ApprovalError(#[from] tether_approval::ApprovalError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
