use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or a named file is missing.
    #[error("cannot read config {}: {source}", path.display())]
    Unreadable {
        /// File that was requested.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the loader accepts.
    #[error("config {} is {size} bytes (limit {limit})", path.display())]
    TooLarge {
        /// Offending file.
        path: PathBuf,
        /// Size on disk.
        size: u64,
        /// Accepted maximum.
        limit: u64,
    },

    /// The file is not valid TOML for the config schema.
    #[error("malformed config {}: {source}", path.display())]
    Malformed {
        /// Offending file.
        path: PathBuf,
        /// TOML error with position.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or inconsistent with another.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        /// Dotted field path, e.g. `rate_limits.window_secs`.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
