//! The persistent circuit breaker.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tether_core::{SessionId, SharedClock, SystemClock};
use tether_storage::{LoadOutcome, Namespace, SessionStore};
use tracing::{debug, info, warn};

use crate::error::BreakerResult;
use crate::state::{
    BreakerState, BreakerStatus, BreakerThresholds, CircuitState, TransitionRecord, TurnResult,
};

/// Storage component name for breaker state.
pub const BREAKER_COMPONENT: &str = "circuit_breaker";

/// Current state file.
pub const STATE_KEY: &str = "state.json";

/// Transition history file.
pub const HISTORY_KEY: &str = "history.json";

/// Fingerprint a context string (SHA-256 hex).
#[must_use]
pub fn context_hash(context: &str) -> String {
    hex::encode(Sha256::digest(context.as_bytes()))
}

/// Circuit breaker bound to one session.
///
/// Holds no cached state: each call reads `state.json`, and each mutation
/// runs under the session lock, so several instances for the same session
/// (in one or many processes) agree.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    ns: Namespace,
    session: SessionId,
    thresholds: BreakerThresholds,
    clock: SharedClock,
}

impl CircuitBreaker {
    /// Open the breaker for a session with default thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace or initial state cannot be written.
    pub fn open(store: &SessionStore, session: &SessionId) -> BreakerResult<Self> {
        Self::open_with(
            store,
            session,
            BreakerThresholds::default(),
            SystemClock::shared(),
        )
    }

    /// Open the breaker with explicit thresholds and clock.
    ///
    /// This is the get-or-create step: a missing or corrupt `state.json` is
    /// replaced by a fresh `CLOSED` state, and a missing `history.json` by an
    /// empty array.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace or initial state cannot be written.
    pub fn open_with(
        store: &SessionStore,
        session: &SessionId,
        thresholds: BreakerThresholds,
        clock: SharedClock,
    ) -> BreakerResult<Self> {
        let breaker = Self {
            ns: store.namespace(BREAKER_COMPONENT, session)?,
            session: session.clone(),
            thresholds,
            clock,
        };

        let _guard = breaker.ns.lock()?;
        breaker.load_or_init()?;
        if !breaker.ns.exists(HISTORY_KEY) {
            breaker
                .ns
                .save_json(HISTORY_KEY, &Vec::<TransitionRecord>::new())?;
        }
        Ok(breaker)
    }

    /// Session this breaker governs.
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Thresholds in use.
    #[must_use]
    pub fn thresholds(&self) -> &BreakerThresholds {
        &self.thresholds
    }

    /// Current persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or a replacement written.
    pub fn snapshot(&self) -> BreakerResult<BreakerState> {
        self.load_or_init()
    }

    /// Current circuit state.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or a replacement written.
    pub fn state(&self) -> BreakerResult<CircuitState> {
        Ok(self.snapshot()?.state)
    }

    /// Whether the next turn may run.
    ///
    /// When the circuit is `OPEN` and a non-empty `context` is given whose
    /// fingerprint differs from the stored one, the situation is treated as
    /// changed: the breaker resets, stores the new fingerprint and allows
    /// execution.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or persisted.
    pub fn can_execute(&self, context: Option<&str>) -> BreakerResult<bool> {
        let Some(context) = context.filter(|c| !c.is_empty()) else {
            return Ok(self.state()? != CircuitState::Open);
        };

        let _guard = self.ns.lock()?;
        let current = self.load_or_init()?;
        if current.state != CircuitState::Open {
            return Ok(true);
        }

        let fingerprint = context_hash(context);
        if fingerprint == current.context_hash {
            return Ok(false);
        }

        info!(session = %self.session, "context changed while open, resetting breaker");
        self.reset_locked(current, "Context change detected", Some(fingerprint))?;
        Ok(true)
    }

    /// Record the outcome of a turn.
    ///
    /// Returns `true` if execution may continue (the resulting state is not
    /// `OPEN`). A non-empty `context` replaces the stored fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or persisted. The caller
    /// must not continue the loop on error.
    pub fn record_turn_result(
        &self,
        result: &TurnResult,
        context: Option<&str>,
    ) -> BreakerResult<bool> {
        let _guard = self.ns.lock()?;
        let mut state = self.load_or_init()?;

        if let Some(context) = context.filter(|c| !c.is_empty()) {
            state.context_hash = context_hash(context);
        }

        let from = state.state;
        let transition = state.apply_turn(result, &self.thresholds);

        if let Some((to, reason)) = transition {
            if to == CircuitState::Open {
                state.total_opens = state.total_opens.saturating_add(1);
                warn!(
                    session = %self.session,
                    turn = result.turn_number,
                    reason = %reason,
                    "circuit opened"
                );
            } else {
                info!(
                    session = %self.session,
                    turn = result.turn_number,
                    from = %from,
                    to = %to,
                    reason = %reason,
                    "circuit state changed"
                );
            }
            state.state = to;
            state.last_change = self.clock.now();
            state.reason.clone_from(&reason);
            self.ns.save_json(STATE_KEY, &state)?;
            self.append_history(TransitionRecord {
                timestamp: state.last_change,
                turn: result.turn_number,
                from_state: from,
                to_state: to,
                reason,
            })?;
        } else {
            self.ns.save_json(STATE_KEY, &state)?;
        }

        debug!(
            session = %self.session,
            turn = result.turn_number,
            state = %state.state,
            no_progress = state.consecutive_no_progress,
            same_error = state.consecutive_same_error,
            "turn recorded"
        );
        Ok(state.state != CircuitState::Open)
    }

    /// Unconditionally close the circuit and zero the streak counters.
    ///
    /// A transition is recorded only if the circuit was not already closed.
    /// `total_opens` survives resets.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or persisted.
    pub fn reset(&self, reason: &str) -> BreakerResult<()> {
        let _guard = self.ns.lock()?;
        let current = self.load_or_init()?;
        self.reset_locked(current, reason, None)
    }

    /// Operator view of the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or a replacement written.
    pub fn status(&self) -> BreakerResult<BreakerStatus> {
        Ok(BreakerStatus::from(&self.snapshot()?))
    }

    /// The most recent `limit` transitions, oldest first.
    ///
    /// Entries that do not parse are skipped; an unreadable history file
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be locked or the history
    /// file exists but cannot be read.
    pub fn history(&self, limit: usize) -> BreakerResult<Vec<TransitionRecord>> {
        // A non-array history file is quarantined on read.
        let _guard = self.ns.lock()?;
        let mut records = self.load_history()?;
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
        Ok(records)
    }

    fn reset_locked(
        &self,
        current: BreakerState,
        reason: &str,
        fingerprint: Option<String>,
    ) -> BreakerResult<()> {
        let now = self.clock.now();
        let mut next = BreakerState::fresh(now);
        next.reason = reason.to_string();
        next.context_hash = fingerprint.unwrap_or_default();
        self.ns.save_json(STATE_KEY, &next)?;

        if current.state != CircuitState::Closed {
            info!(session = %self.session, from = %current.state, reason, "circuit reset");
            self.append_history(TransitionRecord {
                timestamp: now,
                turn: current.current_turn,
                from_state: current.state,
                to_state: CircuitState::Closed,
                reason: reason.to_string(),
            })?;
        }
        Ok(())
    }

    fn load_or_init(&self) -> BreakerResult<BreakerState> {
        match self.ns.load_json::<BreakerState>(STATE_KEY)? {
            LoadOutcome::Loaded(state) => Ok(state),
            LoadOutcome::Missing => {
                let state = BreakerState::fresh(self.clock.now());
                self.ns.save_json(STATE_KEY, &state)?;
                Ok(state)
            },
            LoadOutcome::Corrupt { .. } => {
                warn!(session = %self.session, "breaker state corrupt, starting closed");
                let state = BreakerState::fresh(self.clock.now());
                self.ns.save_json(STATE_KEY, &state)?;
                Ok(state)
            },
        }
    }

    fn load_raw_history(&self) -> BreakerResult<Vec<Value>> {
        match self.ns.load_json(HISTORY_KEY)? {
            LoadOutcome::Loaded(Value::Array(items)) => Ok(items),
            LoadOutcome::Loaded(_) => {
                let moved = self.ns.quarantine(HISTORY_KEY)?;
                warn!(
                    session = %self.session,
                    preserved = %moved.display(),
                    "breaker history is not an array, quarantined"
                );
                Ok(Vec::new())
            },
            LoadOutcome::Missing | LoadOutcome::Corrupt { .. } => Ok(Vec::new()),
        }
    }

    fn load_history(&self) -> BreakerResult<Vec<TransitionRecord>> {
        Ok(self
            .load_raw_history()?
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(session = %self.session, error = %e, "skipping malformed transition record");
                    None
                },
            })
            .collect())
    }

    fn append_history(&self, record: TransitionRecord) -> BreakerResult<()> {
        let mut history = self.load_raw_history()?;
        let record = serde_json::to_value(record).map_err(|e| {
            tether_storage::StorageError::Serialization {
                path: self.ns.path(HISTORY_KEY),
                message: e.to_string(),
            }
        })?;
        history.push(record);
        self.ns.save_json(HISTORY_KEY, &history)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
