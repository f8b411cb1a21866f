//! Risk assessment for agent actions.
//!
//! The default table, in order:
//!
//! | Action | Risk |
//! |---|---|
//! | `code_change` touching a file whose name contains `config` or `secret` | critical |
//! | any other `code_change` | high |
//! | `external_api` with a mutating method (`POST`, `PUT`, `PATCH`, `DELETE`) | critical |
//! | `phase_transition` | high |
//! | `synthesize_research`, `finalize_plan` | medium |
//! | anything else | low |

use serde_json::Value;
use std::fmt;
use tether_core::RiskLevel;

/// Action type names understood by [`DefaultRiskPolicy`].
pub mod action_types {
    /// Modifying source files. Details: `{"files": [..]}`.
    pub const CODE_CHANGE: &str = "code_change";
    /// Calling an external API. Details: `{"method": "POST", ..}`.
    pub const EXTERNAL_API: &str = "external_api";
    /// Moving the workflow to another phase.
    pub const PHASE_TRANSITION: &str = "phase_transition";
    /// Condensing research into findings.
    pub const SYNTHESIZE_RESEARCH: &str = "synthesize_research";
    /// Locking in an implementation plan.
    pub const FINALIZE_PLAN: &str = "finalize_plan";
}

/// Maps an action to a risk level.
///
/// Implement this to replace the default table wholesale.
pub trait RiskPolicy: Send + Sync + fmt::Debug {
    /// Assess an action.
    fn assess(&self, action_type: &str, details: &Value) -> RiskLevel;
}

/// The built-in rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRiskPolicy;

const SENSITIVE_FILE_MARKERS: &[&str] = &["config", "secret"];
const MUTATING_METHODS: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

impl RiskPolicy for DefaultRiskPolicy {
    fn assess(&self, action_type: &str, details: &Value) -> RiskLevel {
        match action_type {
            action_types::CODE_CHANGE => {
                if touches_sensitive_file(details) {
                    RiskLevel::Critical
                } else {
                    RiskLevel::High
                }
            },
            action_types::EXTERNAL_API if is_mutating(details) => RiskLevel::Critical,
            action_types::PHASE_TRANSITION => RiskLevel::High,
            action_types::SYNTHESIZE_RESEARCH | action_types::FINALIZE_PLAN => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

fn touches_sensitive_file(details: &Value) -> bool {
    details
        .get("files")
        .and_then(Value::as_array)
        .is_some_and(|files| {
            files.iter().filter_map(Value::as_str).any(|file| {
                let lower = file.to_lowercase();
                SENSITIVE_FILE_MARKERS.iter().any(|m| lower.contains(m))
            })
        })
}

fn is_mutating(details: &Value) -> bool {
    details
        .get("method")
        .and_then(Value::as_str)
        .is_some_and(|method| {
            MUTATING_METHODS
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method.trim()))
        })
}
