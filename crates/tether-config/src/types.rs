//! Configuration types.
//!
//! Every section implements [`Default`] with the production defaults, so a
//! missing file, a missing section or a bare `[section]` header all yield a
//! working configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the governance layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data root. Defaults to `./tether_data` when unset.
    pub data_dir: Option<PathBuf>,
    /// Audit signing.
    pub audit: AuditSection,
    /// Circuit breaker thresholds.
    pub breaker: BreakerSection,
    /// Rate limiter window and per-endpoint limits.
    pub rate_limits: RateLimitsSection,
    /// Approval gate behaviour.
    pub approval: ApprovalSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// AuditSection
// ---------------------------------------------------------------------------

/// Where the audit signing secret comes from when none is configured inline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    /// Only the `TETHER_AUDIT_SECRET` environment variable; fail without it.
    Env,
    /// `<data_dir>/keys/audit.key`, created on first use.
    #[default]
    KeyFile,
    /// A random secret that lives as long as the process.
    Ephemeral,
}

/// Audit signing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// Inline signing secret. Prefer the environment or the key file.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Fallback source when `secret` is unset.
    pub secret_source: SecretSource,
    /// Name recorded in every signature stamp.
    pub signer: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            secret: None,
            secret_source: SecretSource::KeyFile,
            signer: "TETHER_v1".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// BreakerSection
// ---------------------------------------------------------------------------

/// Circuit breaker thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSection {
    /// Consecutive turns without progress before the circuit opens.
    pub no_progress_threshold: u32,
    /// Consecutive identical errors before the circuit opens.
    pub same_error_threshold: u32,
    /// Turns without progress that push a closed circuit to half-open.
    pub half_open_threshold: u32,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            no_progress_threshold: 3,
            same_error_threshold: 5,
            half_open_threshold: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// RateLimitsSection
// ---------------------------------------------------------------------------

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitsSection {
    /// Length of the trailing window in seconds.
    pub window_secs: u64,
    /// Limit for endpoints without an explicit entry.
    pub default_calls_per_hour: u32,
    /// Per-endpoint limits applied where a session has none yet.
    pub endpoints: BTreeMap<String, u32>,
}

impl Default for RateLimitsSection {
    fn default() -> Self {
        let endpoints = [
            ("deepsearch", 10),
            ("web_fetch", 20),
            ("web_search", 15),
            ("llm_call", 100),
            ("codebase_grep", 50),
            ("file_read", 200),
        ]
        .into_iter()
        .map(|(name, limit)| (name.to_owned(), limit))
        .collect();

        Self {
            window_secs: 3600,
            default_calls_per_hour: 100,
            endpoints,
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Approval gate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Seconds a pending gate waits before it expires. Unset means never.
    pub gate_ttl_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["tether_approval=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
