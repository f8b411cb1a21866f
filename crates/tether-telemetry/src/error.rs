//! Errors raised while installing the log subscriber.

use std::path::PathBuf;

use thiserror::Error;

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A level or directive does not parse as an `EnvFilter` directive.
    #[error("invalid log directive '{directive}': {message}")]
    InvalidDirective {
        /// The offending directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A format name is not one of pretty, compact, json, full.
    #[error("unknown log format '{0}' (expected pretty, compact, json or full)")]
    UnknownFormat(String),

    /// The log directory could not be created.
    #[error("cannot create log directory {path}: {source}")]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("log subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
