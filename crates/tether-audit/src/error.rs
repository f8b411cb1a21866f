use thiserror::Error;

/// Failure to record or sign audit data.
///
/// Verification outcomes (tampered lines, bad signatures) are not errors;
/// they are reported through [`crate::SessionVerification`] and
/// [`crate::SignedLoad`].
#[derive(Debug, Error)]
pub enum AuditError {
    /// The event log or a signed artifact could not be read or written.
    #[error("audit storage: {0}")]
    Storage(#[from] tether_storage::StorageError),

    /// An event or artifact could not be turned into JSON.
    #[error("cannot encode audit record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Sealing the envelope failed.
    #[error("cannot sign audit record: {0}")]
    Signing(#[from] tether_crypto::CryptoError),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
