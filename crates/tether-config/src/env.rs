//! Environment variable overlay.
//!
//! Environment values override the file. Lookups go through a closure so
//! callers (and tests) decide where variables come from.

use std::path::PathBuf;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Relocates the data root.
pub const DATA_DIR_VAR: &str = "TETHER_DATA_DIR";
/// Fixes the audit signing secret.
pub const AUDIT_SECRET_VAR: &str = "TETHER_AUDIT_SECRET";
/// Names the config file to load.
pub const CONFIG_PATH_VAR: &str = "TETHER_CONFIG";
/// Overrides `logging.level`.
pub const LOG_LEVEL_VAR: &str = "TETHER_LOG_LEVEL";
/// Overrides `approval.gate_ttl_secs`.
pub const GATE_TTL_VAR: &str = "TETHER_GATE_TTL_SECS";

/// Read a variable from the process environment, treating blank as unset.
#[must_use]
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Overlay the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::Invalid`] if a numeric variable does
    /// not parse.
    pub fn apply_env(&mut self) -> ConfigResult<usize> {
        self.apply_env_with(process_env)
    }

    /// Overlay variables resolved through `lookup`. Returns how many
    /// variables were applied.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::Invalid`] if a numeric variable does
    /// not parse.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> ConfigResult<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied: usize = 0;

        if let Some(dir) = lookup(DATA_DIR_VAR) {
            self.data_dir = Some(PathBuf::from(dir));
            applied = applied.saturating_add(1);
        }
        if let Some(secret) = lookup(AUDIT_SECRET_VAR) {
            self.audit.secret = Some(secret);
            applied = applied.saturating_add(1);
        }
        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            self.logging.level = level;
            applied = applied.saturating_add(1);
        }
        if let Some(raw) = lookup(GATE_TTL_VAR) {
            let ttl = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    field: "approval.gate_ttl_secs".to_owned(),
                    message: format!("{GATE_TTL_VAR}='{raw}' is not a number of seconds: {e}"),
                })?;
            self.approval.gate_ttl_secs = Some(ttl);
            applied = applied.saturating_add(1);
        }

        if applied > 0 {
            debug!(count = applied, "applied environment overrides");
        }
        Ok(applied)
    }
}
