//! Wall-clock abstraction.
//!
//! Rate-limit windows, gate expiry and audit timestamps all read time through
//! [`Clock`] so tests can substitute a [`ManualClock`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as fractional Unix seconds.
    fn now_epoch(&self) -> f64 {
        epoch_secs(self.now())
    }
}

/// Shared, dynamically dispatched clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a shared handle to the system clock.
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use tether_core::{Clock, ManualClock};
///
/// let clock = ManualClock::at_epoch(1_000.0);
/// clock.advance(Duration::seconds(30));
/// assert!((clock.now_epoch() - 1_030.0).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a manual clock frozen at the given instant.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a manual clock frozen at the given Unix time.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    #[must_use]
    pub fn at_epoch(secs: f64) -> Self {
        Self::new(from_epoch_secs(secs).unwrap_or(DateTime::UNIX_EPOCH))
    }

    /// Move the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| {
            tracing::warn!("ManualClock lock poisoned, recovering");
            e.into_inner()
        });
        *now = now.checked_add_signed(by).unwrap_or(*now);
    }

    /// Jump the clock to an exact instant.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Convert an instant to fractional Unix seconds (microsecond precision).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Convert fractional Unix seconds back to an instant.
///
/// Returns `None` for non-finite or out-of-range values.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_micros(micros as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_roundtrip_keeps_microseconds() {
        let at = from_epoch_secs(1_700_000_000.25).unwrap();
        assert!((epoch_secs(at) - 1_700_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn test_from_epoch_rejects_non_finite() {
        assert!(from_epoch_secs(f64::NAN).is_none());
        assert!(from_epoch_secs(f64::INFINITY).is_none());
    }

    #[test]
    fn test_manual_clock_advance_and_set() {
        let clock = ManualClock::at_epoch(100.0);
        clock.advance(Duration::seconds(3600));
        assert!((clock.now_epoch() - 3700.0).abs() < 1e-6);

        clock.set(from_epoch_secs(5.0).unwrap());
        assert!((clock.now_epoch() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
