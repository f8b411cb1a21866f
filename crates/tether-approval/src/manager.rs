//! The gate manager.

use serde_json::{Value, json};
use std::sync::Arc;
use tether_audit::{AuditTrail, EventDraft, SignedLoad, event_types};
use tether_core::{GateId, RiskLevel, SessionId};
use tether_storage::{Namespace, SessionStore};
use tracing::{debug, info, warn};

use crate::error::{ApprovalError, ApprovalResult};
use crate::gate::{Gate, GateCheck, GateRequest, GateStatus, NewGate};
use crate::risk::{DefaultRiskPolicy, RiskPolicy};

/// Storage component name for gate state.
pub const HITL_COMPONENT: &str = "hitl";

/// Directory holding gate files inside the session namespace.
pub const GATES_DIR: &str = "gates";

/// File suffix of a gate file.
pub const GATE_SUFFIX: &str = ".gate.json";

/// Agent name recorded on gate audit events.
const HITL_AGENT: &str = "hitl";

enum Slot {
    Missing,
    Tampered,
    Found(Gate),
}

/// Creates, resolves and queries the approval gates of one session.
///
/// Gates are persisted through the audit trail's signing helper, one file
/// per gate id. Every read verifies the signature; a gate that fails is
/// quarantined and treated as absent, so a hand-edited `APPROVED` never
/// unblocks an action.
#[derive(Debug, Clone)]
pub struct GateManager {
    gates: Namespace,
    session: SessionId,
    audit: AuditTrail,
    policy: Arc<dyn RiskPolicy>,
    ttl_secs: Option<u64>,
}

impl GateManager {
    /// Open the gate manager for a session with the default risk policy and
    /// no expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate directory cannot be created.
    pub fn open(
        store: &SessionStore,
        session: &SessionId,
        audit: AuditTrail,
    ) -> ApprovalResult<Self> {
        let gates = store.namespace(HITL_COMPONENT, session)?.child(GATES_DIR)?;
        Ok(Self {
            gates,
            session: session.clone(),
            audit,
            policy: Arc::new(DefaultRiskPolicy),
            ttl_secs: None,
        })
    }

    /// Replace the risk policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn RiskPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Expire pending gates this many seconds after creation.
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: Option<u64>) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Session this manager governs.
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Assess the risk of an action with the configured policy.
    #[must_use]
    pub fn assess_risk(&self, action_type: &str, details: &Value) -> RiskLevel {
        self.policy.assess(action_type, details)
    }

    /// Create (or overwrite) a pending gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate cannot be signed or saved.
    pub fn create_gate(&self, new: NewGate) -> ApprovalResult<Gate> {
        let _guard = self.gates.lock()?;
        self.create_locked(new)
    }

    /// Load a gate.
    ///
    /// Missing, unreadable and tampered gates all read as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error only on I/O failure.
    pub fn get_gate(&self, gate_id: &GateId) -> ApprovalResult<Option<Gate>> {
        let _guard = self.gates.lock()?;
        Ok(match self.read_locked(gate_id)? {
            Slot::Found(gate) => Some(gate),
            Slot::Missing | Slot::Tampered => None,
        })
    }

    /// Whether a gate exists and is approved.
    ///
    /// # Errors
    ///
    /// Returns an error only on I/O failure.
    pub fn is_gate_approved(&self, gate_id: &GateId) -> ApprovalResult<bool> {
        Ok(self.get_gate(gate_id)?.is_some_and(|g| g.is_approved()))
    }

    /// Whether a gate exists and is pending.
    ///
    /// # Errors
    ///
    /// Returns an error only on I/O failure.
    pub fn is_gate_pending(&self, gate_id: &GateId) -> ApprovalResult<bool> {
        Ok(self.get_gate(gate_id)?.is_some_and(|g| g.is_pending()))
    }

    /// Approve a pending gate.
    ///
    /// # Errors
    ///
    /// - [`ApprovalError::GateNotFound`] if no readable gate exists
    /// - [`ApprovalError::Tampered`] if the gate failed verification
    /// - [`ApprovalError::AlreadyResolved`] if it is not pending
    /// - storage or signing errors
    pub fn approve_gate(&self, gate_id: &GateId, feedback: Option<Value>) -> ApprovalResult<Gate> {
        self.resolve(gate_id, GateStatus::Approved, None, feedback)
    }

    /// Reject a pending gate.
    ///
    /// # Errors
    ///
    /// As for [`approve_gate`](Self::approve_gate).
    pub fn reject_gate(
        &self,
        gate_id: &GateId,
        reason: &str,
        feedback: Option<Value>,
    ) -> ApprovalResult<Gate> {
        self.resolve(gate_id, GateStatus::Rejected, Some(reason), feedback)
    }

    /// Every readable gate of the session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate directory cannot be listed.
    pub fn list_gates(&self) -> ApprovalResult<Vec<Gate>> {
        let _guard = self.gates.lock()?;
        let mut gates = Vec::new();
        for key in self.gates.list_keys(GATE_SUFFIX)? {
            let Some(id) = key
                .strip_suffix(GATE_SUFFIX)
                .and_then(|raw| GateId::new(raw).ok())
            else {
                debug!(session = %self.session, key = %key, "skipping gate file with invalid id");
                continue;
            };
            match self.read_locked(&id) {
                Ok(Slot::Found(gate)) => gates.push(gate),
                Ok(Slot::Missing | Slot::Tampered) => {},
                Err(e) => {
                    warn!(session = %self.session, gate_id = %id, error = %e, "skipping unreadable gate");
                },
            }
        }
        gates.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        Ok(gates)
    }

    /// Pending gates of the session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate directory cannot be listed.
    pub fn pending_gates(&self) -> ApprovalResult<Vec<Gate>> {
        Ok(self
            .list_gates()?
            .into_iter()
            .filter(Gate::is_pending)
            .collect())
    }

    /// Delete every gate of the session. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a gate file cannot be removed.
    pub fn clear_gates(&self) -> ApprovalResult<usize> {
        let _guard = self.gates.lock()?;
        let mut removed: usize = 0;
        for key in self.gates.list_keys(GATE_SUFFIX)? {
            if self.gates.remove(&key)? {
                removed = removed.saturating_add(1);
            }
        }
        info!(session = %self.session, removed, "gates cleared");
        Ok(removed)
    }

    /// Gate a risk-bearing action.
    ///
    /// Low and medium risk proceed without a gate. High and critical risk
    /// proceed only once the gate is approved. Until then the same pending
    /// gate is returned on every call. A rejected, expired or missing gate
    /// is replaced by a fresh pending one, so the operator is asked again.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate cannot be read, signed or saved.
    pub fn check_and_gate(&self, request: &GateRequest) -> ApprovalResult<GateCheck> {
        let risk = self.assess_risk(&request.action_type, &request.details);
        if !risk.requires_approval() {
            return Ok(GateCheck::Proceed { risk });
        }

        let _guard = self.gates.lock()?;
        let existing = match self.read_locked(&request.gate_id)? {
            Slot::Found(gate) => Some(gate),
            Slot::Missing | Slot::Tampered => None,
        };

        let gate = match existing {
            Some(gate) if gate.is_approved() => return Ok(GateCheck::Proceed { risk }),
            Some(gate) if gate.status == GateStatus::Pending => gate,
            _ => self.create_locked(
                NewGate::new(
                    request.gate_id.clone(),
                    request.phase.clone(),
                    request.description.clone(),
                    risk,
                )
                .details(request.details.clone()),
            )?,
        };

        let message = format!(
            "Action '{}' requires human approval (risk: {risk})",
            gate.gate_id
        );
        Ok(GateCheck::Blocked {
            risk,
            status: gate.status,
            gate: Box::new(gate),
            message,
        })
    }

    fn create_locked(&self, new: NewGate) -> ApprovalResult<Gate> {
        let now = self.now();
        let gate = Gate {
            gate_id: new.gate_id,
            session_id: self.session.clone(),
            phase: new.phase,
            description: new.description,
            risk_level: new.risk,
            details: new.details,
            agents_involved: new.agents_involved,
            artifacts: new.artifacts,
            status: GateStatus::Pending,
            created_at: now,
            resolved_at: None,
            feedback: None,
            rejection_reason: None,
            expires_at: self.ttl_secs.map(|ttl| now + secs_f64(ttl)),
        };

        self.audit
            .sign_and_save(&self.gates, &gate_key(&gate.gate_id), &gate, None)?;
        info!(
            session = %self.session,
            gate_id = %gate.gate_id,
            risk = %gate.risk_level,
            "approval gate created"
        );
        self.record(event_types::GATE_CREATED, &gate);
        Ok(gate)
    }

    fn resolve(
        &self,
        gate_id: &GateId,
        status: GateStatus,
        reason: Option<&str>,
        feedback: Option<Value>,
    ) -> ApprovalResult<Gate> {
        let _guard = self.gates.lock()?;
        let mut gate = match self.read_locked(gate_id)? {
            Slot::Found(gate) => gate,
            Slot::Missing => {
                return Err(ApprovalError::GateNotFound {
                    gate_id: gate_id.to_string(),
                });
            },
            Slot::Tampered => {
                return Err(ApprovalError::Tampered {
                    gate_id: gate_id.to_string(),
                });
            },
        };

        if gate.status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved {
                gate_id: gate_id.to_string(),
                status: gate.status,
            });
        }

        gate.status = status;
        gate.resolved_at = Some(self.now());
        gate.feedback = feedback;
        gate.rejection_reason = reason.map(str::to_string);

        let action = match status {
            GateStatus::Approved => "approved",
            _ => "rejected",
        };
        self.audit.sign_and_save(
            &self.gates,
            &gate_key(gate_id),
            &gate,
            Some(json!({ "action": action })),
        )?;

        info!(session = %self.session, gate_id = %gate_id, status = %status, "approval gate resolved");
        let event = match status {
            GateStatus::Approved => event_types::GATE_APPROVED,
            _ => event_types::GATE_REJECTED,
        };
        self.record(event, &gate);
        Ok(gate)
    }

    /// Read and verify a gate. Caller holds the gate lock.
    fn read_locked(&self, gate_id: &GateId) -> ApprovalResult<Slot> {
        let key = gate_key(gate_id);
        let envelope = match self.audit.load_signed(&self.gates, &key)? {
            SignedLoad::Verified(envelope) => envelope,
            SignedLoad::Missing | SignedLoad::Corrupt { .. } => return Ok(Slot::Missing),
            SignedLoad::Tampered(_) => {
                let moved = self.gates.quarantine(&key)?;
                warn!(
                    session = %self.session,
                    gate_id = %gate_id,
                    preserved = %moved.display(),
                    "gate failed signature verification, quarantined"
                );
                return Ok(Slot::Tampered);
            },
        };

        let mut gate: Gate = match envelope.artifact_as() {
            Ok(gate) => gate,
            Err(e) => {
                warn!(session = %self.session, gate_id = %gate_id, error = %e, "signed gate has an unexpected shape");
                return Ok(Slot::Missing);
            },
        };

        let now = self.now();
        if gate.is_past_deadline(now) {
            gate.status = GateStatus::Expired;
            gate.resolved_at = Some(now);
            self.audit.sign_and_save(
                &self.gates,
                &key,
                &gate,
                Some(json!({ "action": "expired" })),
            )?;
            info!(session = %self.session, gate_id = %gate_id, "approval gate expired");
            self.record(event_types::GATE_EXPIRED, &gate);
        }
        Ok(Slot::Found(gate))
    }

    fn record(&self, event_type: &str, gate: &Gate) {
        let draft = EventDraft::new(event_type, HITL_AGENT, gate.phase.clone()).details(json!({
            "gate_id": gate.gate_id,
            "risk_level": gate.risk_level,
            "status": gate.status,
            "description": gate.description,
            "feedback": gate.feedback,
            "rejection_reason": gate.rejection_reason,
        }));
        if let Err(e) = self.audit.log_event(&self.session, draft) {
            warn!(session = %self.session, gate_id = %gate.gate_id, error = %e, "failed to audit gate event");
        }
    }

    fn now(&self) -> f64 {
        self.audit.signer().clock().now_epoch()
    }
}

fn gate_key(gate_id: &GateId) -> String {
    format!("{gate_id}{GATE_SUFFIX}")
}

#[allow(clippy::cast_precision_loss)]
fn secs_f64(secs: u64) -> f64 {
    secs as f64
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
