//! Breaker state, turn results and transition records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Circuit state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation.
    #[default]
    Closed,
    /// Monitoring after turns without progress.
    HalfOpen,
    /// Execution halted.
    Open,
}

impl CircuitState {
    /// The persisted token (`CLOSED`, `HALF_OPEN`, `OPEN`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::HalfOpen => "HALF_OPEN",
            Self::Open => "OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts at which the breaker changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerThresholds {
    /// Turns without progress before opening.
    pub no_progress: u32,
    /// Consecutive error turns before opening.
    pub same_error: u32,
    /// Turns without progress before monitoring.
    pub half_open: u32,
}

impl Default for BreakerThresholds {
    fn default() -> Self {
        Self {
            no_progress: 3,
            same_error: 5,
            half_open: 2,
        }
    }
}

/// What one agent turn achieved, as judged by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Turn number.
    pub turn_number: u64,
    /// Artifacts produced this turn.
    #[serde(default)]
    pub artifacts_produced: u32,
    /// Whether the turn hit errors.
    #[serde(default)]
    pub has_errors: bool,
    /// Fingerprint of the error, if any.
    ///
    /// Recorded for callers; the breaker only counts consecutive error turns.
    #[serde(default)]
    pub error_signature: Option<String>,
    /// Whether the turn surfaced new information.
    #[serde(default)]
    pub new_information: bool,
}

impl TurnResult {
    /// A turn with no artifacts, no errors and no new information.
    #[must_use]
    pub fn new(turn_number: u64) -> Self {
        Self {
            turn_number,
            ..Self::default()
        }
    }

    /// Set the number of artifacts produced.
    #[must_use]
    pub fn with_artifacts(mut self, count: u32) -> Self {
        self.artifacts_produced = count;
        self
    }

    /// Mark the turn as having surfaced new information.
    #[must_use]
    pub fn with_new_information(mut self) -> Self {
        self.new_information = true;
        self
    }

    /// Mark the turn as failed with the given error fingerprint.
    #[must_use]
    pub fn with_error(mut self, signature: impl Into<String>) -> Self {
        self.has_errors = true;
        self.error_signature = Some(signature.into());
        self
    }

    /// Whether the turn made progress.
    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.artifacts_produced > 0 || self.new_information
    }
}

/// Persisted breaker state for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerState {
    /// Current state.
    pub state: CircuitState,
    /// When the state last changed.
    pub last_change: DateTime<Utc>,
    /// Consecutive turns without progress.
    pub consecutive_no_progress: u32,
    /// Consecutive turns with errors.
    pub consecutive_same_error: u32,
    /// Last turn that made progress.
    pub last_progress_turn: u64,
    /// Times the circuit has opened.
    pub total_opens: u64,
    /// Reason for the last change.
    pub reason: String,
    /// Last turn recorded.
    pub current_turn: u64,
    /// SHA-256 hex of the last context seen, empty if none.
    pub context_hash: String,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::fresh(DateTime::UNIX_EPOCH)
    }
}

impl BreakerState {
    /// A closed state with zeroed counters.
    #[must_use]
    pub fn fresh(at: DateTime<Utc>) -> Self {
        Self {
            state: CircuitState::Closed,
            last_change: at,
            consecutive_no_progress: 0,
            consecutive_same_error: 0,
            last_progress_turn: 0,
            total_opens: 0,
            reason: String::new(),
            current_turn: 0,
            context_hash: String::new(),
        }
    }

    /// Update counters for a turn and decide the next state.
    ///
    /// Returns the new state and reason when a transition fires. Counters are
    /// updated first; the transition table is keyed on the state held before
    /// the turn.
    pub(crate) fn apply_turn(
        &mut self,
        result: &TurnResult,
        thresholds: &BreakerThresholds,
    ) -> Option<(CircuitState, String)> {
        let progress = result.has_progress();
        if progress {
            self.consecutive_no_progress = 0;
            self.last_progress_turn = result.turn_number;
        } else {
            self.consecutive_no_progress = self.consecutive_no_progress.saturating_add(1);
        }

        if result.has_errors {
            self.consecutive_same_error = self.consecutive_same_error.saturating_add(1);
        } else {
            self.consecutive_same_error = 0;
        }
        self.current_turn = result.turn_number;

        let stalled = self.consecutive_no_progress;
        match self.state {
            CircuitState::Closed if stalled >= thresholds.no_progress => Some((
                CircuitState::Open,
                format!("No progress in {stalled} consecutive turns"),
            )),
            CircuitState::Closed if self.consecutive_same_error >= thresholds.same_error => Some((
                CircuitState::Open,
                format!(
                    "Same error repeated {} times",
                    self.consecutive_same_error
                ),
            )),
            CircuitState::Closed if stalled >= thresholds.half_open => Some((
                CircuitState::HalfOpen,
                format!("Monitoring: {stalled} turns without progress"),
            )),
            CircuitState::HalfOpen if progress => Some((
                CircuitState::Closed,
                "Progress detected, circuit recovered".to_string(),
            )),
            CircuitState::HalfOpen if stalled >= thresholds.no_progress => Some((
                CircuitState::Open,
                format!("No recovery after {stalled} turns"),
            )),
            _ => None,
        }
    }
}

/// One immutable entry in the transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Turn that caused it (last recorded turn for resets).
    pub turn: u64,
    /// State before.
    pub from_state: CircuitState,
    /// State after.
    pub to_state: CircuitState,
    /// Why.
    pub reason: String,
}

/// Point-in-time view of a breaker for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStatus {
    /// Current state.
    pub state: CircuitState,
    /// Whether the next turn may run.
    pub can_execute: bool,
    /// Consecutive turns without progress.
    pub consecutive_no_progress: u32,
    /// Consecutive turns with errors.
    pub consecutive_same_error: u32,
    /// Last turn that made progress.
    pub last_progress_turn: u64,
    /// Last turn recorded.
    pub current_turn: u64,
    /// Times the circuit has opened.
    pub total_opens: u64,
    /// Reason for the last change.
    pub reason: String,
    /// When the state last changed.
    pub last_change: DateTime<Utc>,
}

impl From<&BreakerState> for BreakerStatus {
    fn from(state: &BreakerState) -> Self {
        Self {
            state: state.state,
            can_execute: state.state != CircuitState::Open,
            consecutive_no_progress: state.consecutive_no_progress,
            consecutive_same_error: state.consecutive_same_error,
            last_progress_turn: state.last_progress_turn,
            current_turn: state.current_turn,
            total_opens: state.total_opens,
            reason: state.reason.clone(),
            last_change: state.last_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: &mut BreakerState, result: &TurnResult) -> Option<CircuitState> {
        let next = state.apply_turn(result, &BreakerThresholds::default());
        if let Some((to, _)) = &next {
            state.state = *to;
        }
        next.map(|(to, _)| to)
    }

    #[test]
    fn test_state_tokens() {
        assert_eq!(
            serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
            "\"HALF_OPEN\""
        );
        assert_eq!(
            serde_json::from_str::<CircuitState>("\"OPEN\"").unwrap(),
            CircuitState::Open
        );
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn test_progress_detection() {
        assert!(!TurnResult::new(1).has_progress());
        assert!(TurnResult::new(1).with_artifacts(1).has_progress());
        assert!(TurnResult::new(1).with_new_information().has_progress());
        assert!(!TurnResult::new(1).with_error("E").has_progress());
    }

    #[test]
    fn test_stall_walks_closed_half_open_open() {
        let mut state = BreakerState::default();
        assert_eq!(run(&mut state, &TurnResult::new(1)), None);
        assert_eq!(run(&mut state, &TurnResult::new(2)), Some(CircuitState::HalfOpen));
        assert_eq!(run(&mut state, &TurnResult::new(3)), Some(CircuitState::Open));
        assert_eq!(state.consecutive_no_progress, 3);
        assert_eq!(state.current_turn, 3);
    }

    #[test]
    fn test_half_open_recovers_on_progress() {
        let mut state = BreakerState::default();
        run(&mut state, &TurnResult::new(1));
        run(&mut state, &TurnResult::new(2));
        assert_eq!(state.state, CircuitState::HalfOpen);

        assert_eq!(
            run(&mut state, &TurnResult::new(3).with_new_information()),
            Some(CircuitState::Closed)
        );
        assert_eq!(state.consecutive_no_progress, 0);
        assert_eq!(state.last_progress_turn, 3);
    }

    #[test]
    fn test_repeated_errors_with_progress_open_at_five() {
        let mut state = BreakerState::default();
        for turn in 1..=4 {
            let result = TurnResult::new(turn).with_artifacts(1).with_error("E");
            assert_eq!(run(&mut state, &result), None);
        }
        let result = TurnResult::new(5).with_artifacts(1).with_error("E");
        assert_eq!(run(&mut state, &result), Some(CircuitState::Open));
        assert_eq!(state.consecutive_same_error, 5);
    }

    #[test]
    fn test_clean_turn_resets_error_streak() {
        let mut state = BreakerState::default();
        for turn in 1..=4 {
            run(&mut state, &TurnResult::new(turn).with_artifacts(1).with_error("E"));
        }
        run(&mut state, &TurnResult::new(5).with_artifacts(1));
        assert_eq!(state.consecutive_same_error, 0);
        assert_eq!(state.state, CircuitState::Closed);
    }

    #[test]
    fn test_open_ignores_turns() {
        let mut state = BreakerState {
            state: CircuitState::Open,
            ..BreakerState::default()
        };
        assert_eq!(run(&mut state, &TurnResult::new(9).with_artifacts(3)), None);
        assert_eq!(state.state, CircuitState::Open);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = BreakerThresholds {
            no_progress: 5,
            same_error: 5,
            half_open: 4,
        };
        let mut state = BreakerState::default();
        for turn in 1..=3 {
            assert!(state.apply_turn(&TurnResult::new(turn), &thresholds).is_none());
        }
        let (to, _) = state.apply_turn(&TurnResult::new(4), &thresholds).unwrap();
        assert_eq!(to, CircuitState::HalfOpen);
    }

    #[test]
    fn test_state_tolerates_missing_fields() {
        let state: BreakerState = serde_json::from_str(r#"{"state": "HALF_OPEN"}"#).unwrap();
        assert_eq!(state.state, CircuitState::HalfOpen);
        assert_eq!(state.total_opens, 0);
    }
}
