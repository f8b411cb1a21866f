//! Tether Core - shared types for the tether agent governance layer.
//!
//! This crate provides:
//! - [`SessionId`] and [`GateId`], validated identifiers that are safe to use
//!   as path components
//! - [`RiskLevel`] classification shared by the approval gate manager
//! - The [`Clock`] abstraction ([`SystemClock`], [`ManualClock`]) so window and
//!   expiry logic can be driven deterministically in tests
//! - [`TetherHome`], the resolved data root that every component persists under
//!
//! # Example
//!
//! ```
//! use tether_core::{RiskLevel, SessionId};
//!
//! let session = SessionId::new("s1").unwrap();
//! assert_eq!(session.as_str(), "s1");
//! assert!(RiskLevel::Critical.requires_approval());
//! assert!(SessionId::new("../escape").is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod clock;
pub mod dirs;
mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock, epoch_secs, from_epoch_secs};
pub use dirs::{DATA_DIR_ENV, TetherHome};
pub use error::{CoreError, CoreResult};
pub use types::{GateId, RiskLevel, SessionId};
