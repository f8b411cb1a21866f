//! Crypto error types.

use thiserror::Error;

/// Errors that can occur during canonicalization or secret handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A value could not be converted to canonical JSON.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// The supplied secret is unusable.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// Reading or writing the key file failed.
    #[error("key file error: {0}")]
    KeyFile(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
