//! Audit event types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type names emitted by tether itself.
///
/// Callers may log any other event type string.
pub mod event_types {
    /// A governed turn finished and was reported to the circuit breaker.
    pub const TURN_COMPLETED: &str = "turn_completed";
    /// An approval gate was created.
    pub const GATE_CREATED: &str = "gate_created";
    /// An approval gate was approved.
    pub const GATE_APPROVED: &str = "gate_approved";
    /// An approval gate was rejected.
    pub const GATE_REJECTED: &str = "gate_rejected";
    /// An approval gate passed its TTL while pending.
    pub const GATE_EXPIRED: &str = "gate_expired";
}

/// The signed payload of one audit log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Kind of event (decision, tool call, phase transition, ...).
    pub event_type: String,
    /// Agent or persona that produced the event.
    pub agent: String,
    /// Workflow phase at the time of the event.
    pub phase: String,
    /// Event-specific payload.
    #[serde(default)]
    pub details: Value,
    /// Tools invoked.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Skills applied.
    #[serde(default)]
    pub skills_applied: Vec<String>,
    /// When the event was logged (epoch seconds).
    pub timestamp: f64,
}

/// An event waiting to be timestamped, signed and appended.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub(crate) event_type: String,
    pub(crate) agent: String,
    pub(crate) phase: String,
    pub(crate) details: Value,
    pub(crate) tools_used: Vec<String>,
    pub(crate) skills_applied: Vec<String>,
}

impl EventDraft {
    /// Start a draft with empty details, tools and skills.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        agent: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            agent: agent.into(),
            phase: phase.into(),
            details: Value::Object(serde_json::Map::new()),
            tools_used: Vec::new(),
            skills_applied: Vec::new(),
        }
    }

    /// Set the event details.
    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Insert one field into the details, turning non-object details into
    /// an object first.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        if !self.details.is_object() {
            self.details = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.details {
            map.insert(key.into(), value);
        }
        self
    }

    /// Set the tools used.
    #[must_use]
    pub fn tools_used<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools_used = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set the skills applied.
    #[must_use]
    pub fn skills_applied<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills_applied = skills.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn stamp(self, timestamp: f64) -> AuditEvent {
        AuditEvent {
            event_type: self.event_type,
            agent: self.agent,
            phase: self.phase,
            details: self.details,
            tools_used: self.tools_used,
            skills_applied: self.skills_applied,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_merges_into_object() {
        let event = EventDraft::new("turn_completed", "coder", "implement")
            .details(json!({ "summary": "ok" }))
            .detail("turn", json!(3))
            .stamp(1.0);
        assert_eq!(event.details, json!({ "summary": "ok", "turn": 3 }));
    }

    #[test]
    fn test_detail_replaces_non_object() {
        let event = EventDraft::new("x", "a", "p")
            .details(json!("free text"))
            .detail("k", json!(true))
            .stamp(1.0);
        assert_eq!(event.details, json!({ "k": true }));
    }
}
