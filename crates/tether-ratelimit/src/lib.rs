//! Tether Rate Limit - bounds call volume per named endpoint.
//!
//! Calls are counted inside a trailing window (one hour by default). Each
//! endpoint has its own limit, falling back to a default when unset. State
//! lives in `rate_limiter/<session>/calls.json` and `limits.json`.
//!
//! # Example
//!
//! ```
//! use tether_core::SessionId;
//! use tether_ratelimit::{RateDecision, RateLimiter};
//! use tether_storage::SessionStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SessionStore::new(dir.path());
//! let limiter = RateLimiter::open(&store, &SessionId::new("s1").unwrap()).unwrap();
//!
//! limiter.set_limit("deepsearch", 1).unwrap();
//! assert!(limiter.try_acquire("deepsearch", "researcher").unwrap().is_allowed());
//! assert!(matches!(
//!     limiter.try_acquire("deepsearch", "researcher").unwrap(),
//!     RateDecision::Limited { .. }
//! ));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod limiter;
mod record;

pub use error::{RateLimitError, RateLimitResult};
pub use limiter::{CALLS_KEY, LIMITS_KEY, LimiterSettings, RATE_LIMIT_COMPONENT, RateLimiter};
pub use record::{
    CallLog, CallRecord, DEFAULT_CALLS_PER_HOUR, DEFAULT_WINDOW_SECS, EndpointStatus,
    RateDecision, default_tool_limits,
};
