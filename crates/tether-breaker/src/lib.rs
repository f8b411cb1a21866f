//! Tether Breaker - halts agent loops that stop making progress.
//!
//! A three-state machine driven by one [`TurnResult`] per agent turn:
//!
//! | From | To | When |
//! |---|---|---|
//! | `CLOSED` | `OPEN` | 3 turns without progress, or 5 consecutive turns with errors |
//! | `CLOSED` | `HALF_OPEN` | 2 turns without progress |
//! | `HALF_OPEN` | `CLOSED` | a turn with progress |
//! | `HALF_OPEN` | `OPEN` | 3 turns without progress |
//! | any | `CLOSED` | explicit reset, or a changed context while `OPEN` |
//!
//! State lives in `circuit_breaker/<session>/state.json`, transitions in
//! `history.json`. Every mutation takes the session lock and reloads state
//! from disk first.
//!
//! # Example
//!
//! ```
//! use tether_breaker::{CircuitBreaker, CircuitState, TurnResult};
//! use tether_core::SessionId;
//! use tether_storage::SessionStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SessionStore::new(dir.path());
//! let breaker = CircuitBreaker::open(&store, &SessionId::new("s1").unwrap()).unwrap();
//!
//! for turn in 1..=3 {
//!     breaker.record_turn_result(&TurnResult::new(turn), None).unwrap();
//! }
//! assert_eq!(breaker.state().unwrap(), CircuitState::Open);
//! assert!(!breaker.can_execute(None).unwrap());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod breaker;
mod error;
mod state;

pub use breaker::{BREAKER_COMPONENT, CircuitBreaker, HISTORY_KEY, STATE_KEY, context_hash};
pub use error::{BreakerError, BreakerResult};
pub use state::{
    BreakerState, BreakerStatus, BreakerThresholds, CircuitState, TransitionRecord, TurnResult,
};
