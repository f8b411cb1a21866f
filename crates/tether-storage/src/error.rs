//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or loading session state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("i/o error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for writing.
    #[error("serialization error at {path}: {message}")]
    Serialization {
        /// The destination file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The advisory lock could not be acquired.
    #[error("failed to lock {path}: {message}")]
    Lock {
        /// The lock file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
