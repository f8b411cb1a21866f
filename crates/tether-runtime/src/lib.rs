//! Tether Runtime - the governance facade an agent orchestrator calls.
//!
//! [`Governance`] owns the data directory, the signing secret and the audit
//! trail. [`Governance::session`] opens a [`SessionGovernor`] that combines
//! the session's circuit breaker, rate limiter and gate manager:
//!
//! ```rust,no_run
//! use tether_breaker::TurnResult;
//! use tether_config::Config;
//! use tether_core::SessionId;
//! use tether_runtime::Governance;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?.config;
//! let governance = Governance::from_config(&config)?;
//! let governor = governance.session(&SessionId::new("run-42")?)?;
//!
//! let mut turn = 0;
//! while governor.begin_turn(None)?.is_proceed() {
//!     turn += 1;
//!     if governor.before_call("web_search", "researcher")?.is_allowed() {
//!         // ... call the tool ...
//!     }
//!     let result = TurnResult::new(turn).with_artifacts(1);
//!     if !governor.finish_turn(&result, None, "researcher", "research")?.is_proceed() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;

mod error;
mod governance;
mod governor;

pub use error::{RuntimeError, RuntimeResult};
pub use governance::{Governance, GovernanceOptions};
pub use governor::{SessionGovernor, TurnDecision};
