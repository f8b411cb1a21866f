//! Configuration for the tether governance layer.
//!
//! A single [`Config`] read from one optional TOML file, overlaid with
//! `TETHER_*` environment variables, then validated.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tether_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("window: {}s", resolved.config.rate_limits.window_secs);
//! ```
//!
//! # Environment
//!
//! | Variable | Effect |
//! |---|---|
//! | `TETHER_CONFIG` | config file to load |
//! | `TETHER_DATA_DIR` | sets `data_dir` |
//! | `TETHER_AUDIT_SECRET` | sets `audit.secret` |
//! | `TETHER_LOG_LEVEL` | sets `logging.level` |
//! | `TETHER_GATE_TTL_SECS` | sets `approval.gate_ttl_secs` |
//!
//! This crate has no dependencies on other tether crates. Conversion into
//! component settings happens in `tether-runtime`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable overlay.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration from `explicit` (or `TETHER_CONFIG`) and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or
    /// the final configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load_with(explicit, env::process_env)
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
