//! Gate records and requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tether_core::{GateId, RiskLevel, SessionId};

/// Lifecycle of a gate.
///
/// `PENDING_APPROVAL` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateStatus {
    /// Waiting for a human.
    #[serde(rename = "PENDING_APPROVAL")]
    Pending,
    /// Approved; the action may proceed.
    #[serde(rename = "APPROVED")]
    Approved,
    /// Rejected; the action stays blocked until asked again.
    #[serde(rename = "REJECTED")]
    Rejected,
    /// Not resolved before its deadline.
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl GateStatus {
    /// The persisted token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Whether the gate has been resolved one way or another.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted approval gate (the signed artifact of a gate file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate identifier.
    pub gate_id: GateId,
    /// Owning session.
    pub session_id: SessionId,
    /// Workflow phase that raised the gate.
    pub phase: String,
    /// What the human is asked to approve.
    pub description: String,
    /// Assessed risk.
    pub risk_level: RiskLevel,
    /// Action details shown to the reviewer.
    #[serde(default)]
    pub details: Value,
    /// Agents involved in the action.
    #[serde(default)]
    pub agents_involved: Vec<String>,
    /// Artifacts the action touches.
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Current status.
    pub status: GateStatus,
    /// Creation time (epoch seconds).
    pub created_at: f64,
    /// Resolution time (epoch seconds).
    #[serde(default)]
    pub resolved_at: Option<f64>,
    /// Reviewer feedback.
    #[serde(default)]
    pub feedback: Option<Value>,
    /// Why the gate was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Deadline after which a pending gate expires (epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<f64>,
}

impl Gate {
    /// Whether the gate is still waiting for a human.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == GateStatus::Pending
    }

    /// Whether the gate has been approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == GateStatus::Approved
    }

    pub(crate) fn is_past_deadline(&self, now: f64) -> bool {
        self.is_pending() && self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Parameters for a new gate.
#[derive(Debug, Clone)]
pub struct NewGate {
    /// Gate identifier.
    pub gate_id: GateId,
    /// Workflow phase.
    pub phase: String,
    /// What the human is asked to approve.
    pub description: String,
    /// Assessed risk.
    pub risk: RiskLevel,
    /// Action details.
    pub details: Value,
    /// Agents involved.
    pub agents_involved: Vec<String>,
    /// Artifacts touched.
    pub artifacts: Vec<String>,
}

impl NewGate {
    /// Start a gate with empty details, agents and artifacts.
    #[must_use]
    pub fn new(
        gate_id: GateId,
        phase: impl Into<String>,
        description: impl Into<String>,
        risk: RiskLevel,
    ) -> Self {
        Self {
            gate_id,
            phase: phase.into(),
            description: description.into(),
            risk,
            details: Value::Object(serde_json::Map::new()),
            agents_involved: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Set the action details.
    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Set the agents involved.
    #[must_use]
    pub fn agents_involved(mut self, agents: Vec<String>) -> Self {
        self.agents_involved = agents;
        self
    }

    /// Set the artifacts touched.
    #[must_use]
    pub fn artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

/// A risk-bearing action submitted to [`check_and_gate`](crate::GateManager::check_and_gate).
#[derive(Debug, Clone)]
pub struct GateRequest {
    /// Stable id for this action; repeated checks reuse the same gate.
    pub gate_id: GateId,
    /// Action type fed to the risk policy.
    pub action_type: String,
    /// Workflow phase.
    pub phase: String,
    /// What the human is asked to approve.
    pub description: String,
    /// Action details fed to the risk policy and stored on the gate.
    pub details: Value,
}

impl GateRequest {
    /// Describe an action with empty details.
    #[must_use]
    pub fn new(
        gate_id: GateId,
        action_type: impl Into<String>,
        phase: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            gate_id,
            action_type: action_type.into(),
            phase: phase.into(),
            description: description.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the action details.
    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Outcome of [`check_and_gate`](crate::GateManager::check_and_gate).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateCheck {
    /// The action may proceed: low or medium risk, or already approved.
    Proceed {
        /// Assessed risk.
        risk: RiskLevel,
    },
    /// The action must wait for a pending gate.
    Blocked {
        /// Assessed risk.
        risk: RiskLevel,
        /// Gate status.
        status: GateStatus,
        /// The gate.
        gate: Box<Gate>,
        /// Human-readable explanation.
        message: String,
    },
}

impl GateCheck {
    /// Whether the action may proceed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Proceed { .. })
    }

    /// Assessed risk.
    #[must_use]
    pub fn risk(&self) -> RiskLevel {
        match self {
            Self::Proceed { risk } | Self::Blocked { risk, .. } => *risk,
        }
    }

    /// The gate, if the action was gated.
    #[must_use]
    pub fn gate(&self) -> Option<&Gate> {
        match self {
            Self::Proceed { .. } => None,
            Self::Blocked { gate, .. } => Some(&**gate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_tokens() {
        assert_eq!(
            serde_json::to_value(GateStatus::Pending).unwrap(),
            json!("PENDING_APPROVAL")
        );
        assert_eq!(
            serde_json::from_value::<GateStatus>(json!("EXPIRED")).unwrap(),
            GateStatus::Expired
        );
        assert!(!GateStatus::Pending.is_terminal());
        assert!(GateStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_gate_reads_minimal_artifact() {
        let gate: Gate = serde_json::from_value(json!({
            "gate_id": "plan-review",
            "session_id": "s1",
            "phase": "plan",
            "description": "Review plan",
            "risk_level": "high",
            "status": "PENDING_APPROVAL",
            "created_at": 10.0,
            "resolved_at": null,
            "feedback": null
        }))
        .unwrap();

        assert!(gate.is_pending());
        assert_eq!(gate.risk_level, RiskLevel::High);
        assert!(gate.agents_involved.is_empty());
        assert!(!gate.is_past_deadline(1e12));
    }

    #[test]
    fn test_deadline() {
        let mut gate: Gate = serde_json::from_value(json!({
            "gate_id": "g", "session_id": "s", "phase": "p", "description": "d",
            "risk_level": "critical", "status": "PENDING_APPROVAL", "created_at": 0.0,
            "expires_at": 100.0
        }))
        .unwrap();
        assert!(!gate.is_past_deadline(99.0));
        assert!(gate.is_past_deadline(100.0));
        gate.status = GateStatus::Approved;
        assert!(!gate.is_past_deadline(100.0));
    }
}
