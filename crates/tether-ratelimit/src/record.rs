//! Call records, the persisted call log and limiter decisions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Window length used when none is configured (one hour).
pub const DEFAULT_WINDOW_SECS: u64 = 3600;

/// Limit applied to endpoints without an explicit one.
pub const DEFAULT_CALLS_PER_HOUR: u32 = 100;

/// Limits for the common agent tools.
#[must_use]
pub fn default_tool_limits() -> BTreeMap<String, u32> {
    [
        ("deepsearch", 10),
        ("web_fetch", 20),
        ("web_search", 15),
        ("llm_call", 100),
        ("codebase_grep", 50),
        ("file_read", 200),
    ]
    .into_iter()
    .map(|(endpoint, limit)| (endpoint.to_string(), limit))
    .collect()
}

fn default_endpoint() -> String {
    "default".to_string()
}

fn default_agent() -> String {
    "unknown".to_string()
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// When the call was made (epoch seconds).
    pub timestamp: f64,
    /// Endpoint called.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Agent that made the call.
    #[serde(default = "default_agent")]
    pub agent: String,
}

/// Contents of `calls.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    /// Calls still inside the window when last saved.
    #[serde(default)]
    pub calls: Vec<CallRecord>,
    /// Window the log was pruned against.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

fn default_window() -> u64 {
    DEFAULT_WINDOW_SECS
}

impl CallLog {
    pub(crate) fn empty(window_seconds: u64) -> Self {
        Self {
            calls: Vec::new(),
            window_seconds,
        }
    }

    /// Drop calls at or before `cutoff`.
    pub(crate) fn prune(&mut self, cutoff: f64) {
        self.calls.retain(|c| c.timestamp > cutoff);
    }

    /// Calls to `endpoint` after `cutoff`.
    pub(crate) fn in_window<'a>(
        &'a self,
        endpoint: &'a str,
        cutoff: f64,
    ) -> impl Iterator<Item = &'a CallRecord> + 'a {
        self.calls
            .iter()
            .filter(move |c| c.endpoint == endpoint && c.timestamp > cutoff)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RateDecision {
    /// The call may proceed.
    Allowed,
    /// The endpoint is at its limit.
    Limited {
        /// Seconds until the oldest call in the window ages out.
        retry_after_secs: u64,
    },
}

impl RateDecision {
    /// Check if the call may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for RateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Limited { retry_after_secs } => {
                write!(f, "rate limited, retry in {retry_after_secs}s")
            },
        }
    }
}

/// Usage snapshot for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    /// Endpoint name.
    pub endpoint: String,
    /// Calls inside the window.
    pub calls_used: u32,
    /// Calls left before the limit.
    pub calls_remaining: u32,
    /// Configured or default limit.
    pub limit: u32,
    /// Seconds until a call slot could free (0 if callable now).
    pub seconds_until_available: u64,
    /// Whether a call is allowed now.
    pub can_call: bool,
}
