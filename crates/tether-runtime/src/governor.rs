//! The per-turn facade an orchestrator drives.

use serde::Serialize;
use serde_json::json;
use std::fmt;
use tether_approval::{GateCheck, GateManager, GateRequest};
use tether_audit::{AuditEvent, AuditTrail, EventDraft, event_types};
use tether_breaker::{CircuitBreaker, TurnResult};
use tether_core::SessionId;
use tether_ratelimit::{RateDecision, RateLimiter};
use tracing::{debug, info, warn};

use crate::error::RuntimeResult;

/// Whether the orchestrator may run (or keep running) the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TurnDecision {
    /// Run the next turn.
    Proceed,
    /// Stop: the circuit is open.
    Halted {
        /// Why the circuit opened.
        reason: String,
    },
}

impl TurnDecision {
    /// Whether the loop may continue.
    #[must_use]
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

impl fmt::Display for TurnDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("proceed"),
            Self::Halted { reason } => write!(f, "halted: {reason}"),
        }
    }
}

/// Governance for one session.
///
/// Call order per turn:
///
/// 1. [`begin_turn`](Self::begin_turn); stop on [`TurnDecision::Halted`]
/// 2. [`before_call`](Self::before_call) before each external call
/// 3. [`gate_action`](Self::gate_action) before each risk-bearing action
/// 4. [`finish_turn`](Self::finish_turn) with what the turn achieved
#[derive(Debug, Clone)]
pub struct SessionGovernor {
    session: SessionId,
    breaker: CircuitBreaker,
    limiter: RateLimiter,
    gates: GateManager,
    audit: AuditTrail,
}

impl SessionGovernor {
    pub(crate) fn new(
        session: SessionId,
        breaker: CircuitBreaker,
        limiter: RateLimiter,
        gates: GateManager,
        audit: AuditTrail,
    ) -> Self {
        Self {
            session,
            breaker,
            limiter,
            gates,
            audit,
        }
    }

    /// Session this governor governs.
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// The session's circuit breaker.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The session's rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The session's gate manager.
    #[must_use]
    pub fn gates(&self) -> &GateManager {
        &self.gates
    }

    /// The shared audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Ask whether the next turn may run.
    ///
    /// A `context` that differs from the one the circuit opened under
    /// closes it again.
    ///
    /// # Errors
    ///
    /// Returns an error if breaker state cannot be read or persisted.
    pub fn begin_turn(&self, context: Option<&str>) -> RuntimeResult<TurnDecision> {
        if self.breaker.can_execute(context)? {
            return Ok(TurnDecision::Proceed);
        }
        let reason = self.breaker.snapshot()?.reason;
        info!(session = %self.session, reason = %reason, "turn halted by open circuit");
        Ok(TurnDecision::Halted { reason })
    }

    /// Check and record an external call in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if limiter state cannot be read or persisted.
    pub fn before_call(&self, endpoint: &str, agent: &str) -> RuntimeResult<RateDecision> {
        Ok(self.limiter.try_acquire(endpoint, agent)?)
    }

    /// Gate a risk-bearing action.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate cannot be read, signed or saved.
    pub fn gate_action(&self, request: &GateRequest) -> RuntimeResult<GateCheck> {
        let check = self.gates.check_and_gate(request)?;
        debug!(
            session = %self.session,
            gate_id = %request.gate_id,
            action = %request.action_type,
            risk = %check.risk(),
            proceed = check.is_ok(),
            "action gated"
        );
        Ok(check)
    }

    /// Record a finished turn and log a `turn_completed` audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if breaker state or the audit event cannot be
    /// persisted.
    pub fn finish_turn(
        &self,
        result: &TurnResult,
        context: Option<&str>,
        agent: &str,
        phase: &str,
    ) -> RuntimeResult<TurnDecision> {
        self.finish_turn_with(
            result,
            context,
            EventDraft::new(event_types::TURN_COMPLETED, agent, phase),
        )
    }

    /// Like [`finish_turn`](Self::finish_turn), with a caller-built event
    /// draft (for tools used and skills applied). Turn fields are merged
    /// into the draft's details.
    ///
    /// # Errors
    ///
    /// Returns an error if breaker state or the audit event cannot be
    /// persisted.
    pub fn finish_turn_with(
        &self,
        result: &TurnResult,
        context: Option<&str>,
        draft: EventDraft,
    ) -> RuntimeResult<TurnDecision> {
        let may_continue = self.breaker.record_turn_result(result, context)?;
        let snapshot = self.breaker.snapshot()?;

        let draft = draft
            .detail("turn", json!(result))
            .detail("circuit_state", json!(snapshot.state));
        self.audit.log_event(&self.session, draft)?;

        if may_continue {
            Ok(TurnDecision::Proceed)
        } else {
            warn!(
                session = %self.session,
                turn = result.turn_number,
                reason = %snapshot.reason,
                "loop must stop"
            );
            Ok(TurnDecision::Halted {
                reason: snapshot.reason,
            })
        }
    }

    /// Recent audit events for prompt assembly, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log exists but cannot be read.
    pub fn history_for_context(&self, limit: usize) -> RuntimeResult<Vec<AuditEvent>> {
        Ok(self.audit.recent_events(&self.session, limit)?)
    }
}

#[cfg(test)]
#[path = "governor_tests.rs"]
mod tests;
