//! Approval error types.

use crate::gate::GateStatus;

/// Errors that can occur while managing approval gates.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// No readable gate exists under this id.
    #[error("gate not found: {gate_id}")]
    GateNotFound {
        /// The gate that was looked up.
        gate_id: String,
    },

    /// The gate has already left `PENDING_APPROVAL`.
    #[error("gate {gate_id} is already {status}")]
    AlreadyResolved {
        /// The gate being resolved.
        gate_id: String,
        /// Its terminal status.
        status: GateStatus,
    },

    /// The gate file failed signature verification and was quarantined.
    #[error("gate {gate_id} failed signature verification")]
    Tampered {
        /// The gate that failed.
        gate_id: String,
    },

    /// A gate id is not a safe path component.
    #[error("invalid gate id: {0}")]
    InvalidGateId(#[from] tether_core::CoreError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tether_storage::StorageError),

    /// Signing or audit log error.
    #[error("audit error: {0}")]
    Audit(#[from] tether_audit::AuditError),
}

impl ApprovalError {
    /// Whether the gate simply does not exist, as opposed to an I/O,
    /// integrity or state error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GateNotFound { .. })
    }
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
