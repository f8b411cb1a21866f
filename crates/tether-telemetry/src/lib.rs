//! Tether Telemetry - logging setup for the governance layer.
//!
//! The governance crates only emit `tracing` events. This crate installs the
//! subscriber that renders them: level and per-crate directives through
//! `EnvFilter`, one of four formats, to stdout, stderr or a daily-rotated
//! file.
//!
//! # Example
//!
//! ```rust,no_run
//! use tether_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tether_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("tether_approval=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!(session = "s1", "governance ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
