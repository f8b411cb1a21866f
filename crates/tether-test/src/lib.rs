//! Shared helpers for tether's tests.
//!
//! [`TestHarness`] owns a temporary data directory, a [`ManualClock`] and a
//! `Governance` built over both, so a test can open sessions, move time and
//! simulate a second process with [`TestHarness::reopen`]. The fixtures
//! build turn results and gate requests with sensible defaults.
//!
//! ```rust,ignore
//! use tether_test::{TestHarness, idle_turn};
//!
//! let harness = TestHarness::new();
//! let gov = harness.session("s1");
//! for turn in 1..=3 {
//!     gov.finish_turn(&idle_turn(turn), None, "coder", "implement").unwrap();
//! }
//! assert!(!gov.begin_turn(None).unwrap().is_proceed());
//! ```
//!
//! [`ManualClock`]: tether_core::ManualClock

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
