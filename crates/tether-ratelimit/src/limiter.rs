//! Sliding-window rate limiter.

use std::collections::{BTreeMap, BTreeSet};
use tether_core::{SessionId, SharedClock, SystemClock};
use tether_storage::{Namespace, SessionStore};
use tracing::{debug, info, warn};

use crate::error::{RateLimitError, RateLimitResult};
use crate::record::{
    CallLog, CallRecord, DEFAULT_CALLS_PER_HOUR, DEFAULT_WINDOW_SECS, EndpointStatus, RateDecision,
};

/// Storage component name for limiter state.
pub const RATE_LIMIT_COMPONENT: &str = "rate_limiter";

/// Call log file.
pub const CALLS_KEY: &str = "calls.json";

/// Per-endpoint limit file.
pub const LIMITS_KEY: &str = "limits.json";

/// Window and fallback limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSettings {
    /// Window length in seconds.
    pub window_secs: u64,
    /// Limit for endpoints without an explicit one.
    pub default_limit: u32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            default_limit: DEFAULT_CALLS_PER_HOUR,
        }
    }
}

/// Rate limiter bound to one session.
///
/// Like the circuit breaker it keeps no in-memory copy of the call log:
/// queries read `calls.json`, and updates run under the session lock.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    ns: Namespace,
    session: SessionId,
    settings: LimiterSettings,
    clock: SharedClock,
}

impl RateLimiter {
    /// Open the limiter for a session with the default window and limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be created.
    pub fn open(store: &SessionStore, session: &SessionId) -> RateLimitResult<Self> {
        Self::open_with(
            store,
            session,
            LimiterSettings::default(),
            SystemClock::shared(),
        )
    }

    /// Open the limiter with explicit settings and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be created.
    pub fn open_with(
        store: &SessionStore,
        session: &SessionId,
        settings: LimiterSettings,
        clock: SharedClock,
    ) -> RateLimitResult<Self> {
        Ok(Self {
            ns: store.namespace(RATE_LIMIT_COMPONENT, session)?,
            session: session.clone(),
            settings,
            clock,
        })
    }

    /// Apply `limits` to every endpoint that has no limit yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero or the limits cannot be saved.
    pub fn with_default_limits(self, limits: &BTreeMap<String, u32>) -> RateLimitResult<Self> {
        {
            let _guard = self.ns.lock()?;
            let mut current = self.load_limits()?;
            let mut changed = false;
            for (endpoint, limit) in limits {
                if !current.contains_key(endpoint) {
                    validate_limit(endpoint, *limit)?;
                    current.insert(endpoint.clone(), *limit);
                    changed = true;
                }
            }
            if changed {
                self.ns.save_json(LIMITS_KEY, &current)?;
            }
        }
        Ok(self)
    }

    /// Session this limiter governs.
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Window length in seconds.
    #[must_use]
    pub fn window_secs(&self) -> u64 {
        self.settings.window_secs
    }

    /// Set the limit for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidLimit`] for zero, or an error if the
    /// limits cannot be saved.
    pub fn set_limit(&self, endpoint: &str, calls_per_window: u32) -> RateLimitResult<()> {
        validate_limit(endpoint, calls_per_window)?;
        let _guard = self.ns.lock()?;
        let mut limits = self.load_limits()?;
        limits.insert(endpoint.to_string(), calls_per_window);
        self.ns.save_json(LIMITS_KEY, &limits)?;
        info!(session = %self.session, endpoint, limit = calls_per_window, "rate limit set");
        Ok(())
    }

    /// The limit for an endpoint (the default if unset).
    ///
    /// # Errors
    ///
    /// Returns an error if the limits file exists but cannot be read.
    pub fn get_limit(&self, endpoint: &str) -> RateLimitResult<u32> {
        Ok(self.limit_in(&self.load_limits()?, endpoint))
    }

    /// Whether a call to `endpoint` is allowed now.
    ///
    /// # Errors
    ///
    /// Returns an error if state exists but cannot be read.
    pub fn can_call(&self, endpoint: &str) -> RateLimitResult<bool> {
        Ok(self.check(endpoint)?.is_allowed())
    }

    /// Check an endpoint without recording a call.
    ///
    /// # Errors
    ///
    /// Returns an error if state exists but cannot be read.
    pub fn check(&self, endpoint: &str) -> RateLimitResult<RateDecision> {
        let limits = self.load_limits()?;
        let log = self.load_calls()?;
        Ok(self.decide(&log, self.limit_in(&limits, endpoint), endpoint))
    }

    /// Record a call to `endpoint` now.
    ///
    /// Calls that have aged out of the window are pruned before saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the call log cannot be read or saved.
    pub fn record_call(&self, endpoint: &str, agent: &str) -> RateLimitResult<()> {
        let _guard = self.ns.lock()?;
        let mut log = self.load_calls()?;
        self.push_call(&mut log, endpoint, agent)
    }

    /// Check and, if allowed, record a call under one lock.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or saved.
    pub fn try_acquire(&self, endpoint: &str, agent: &str) -> RateLimitResult<RateDecision> {
        let _guard = self.ns.lock()?;
        let limits = self.load_limits()?;
        let mut log = self.load_calls()?;
        let decision = self.decide(&log, self.limit_in(&limits, endpoint), endpoint);
        match decision {
            RateDecision::Allowed => self.push_call(&mut log, endpoint, agent)?,
            RateDecision::Limited { retry_after_secs } => {
                warn!(
                    session = %self.session,
                    endpoint,
                    agent,
                    retry_after_secs,
                    "call rate limited"
                );
            },
        }
        Ok(decision)
    }

    /// Seconds until `endpoint` may be called (0 if callable now).
    ///
    /// This is the time until the oldest call in the window ages out, rounded
    /// up to whole seconds. With several calls in the window it is when a slot
    /// could free, not when capacity is guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error if state exists but cannot be read.
    pub fn seconds_until_available(&self, endpoint: &str) -> RateLimitResult<u64> {
        Ok(match self.check(endpoint)? {
            RateDecision::Allowed => 0,
            RateDecision::Limited { retry_after_secs } => retry_after_secs,
        })
    }

    /// Usage snapshot for one endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if state exists but cannot be read.
    pub fn get_status(&self, endpoint: &str) -> RateLimitResult<EndpointStatus> {
        let limits = self.load_limits()?;
        let log = self.load_calls()?;
        Ok(self.status_in(&log, &limits, endpoint))
    }

    /// Usage snapshots for every known endpoint.
    ///
    /// Known endpoints are those with an explicit limit plus any with a
    /// recorded call.
    ///
    /// # Errors
    ///
    /// Returns an error if state exists but cannot be read.
    pub fn get_status_all(&self) -> RateLimitResult<BTreeMap<String, EndpointStatus>> {
        let limits = self.load_limits()?;
        let log = self.load_calls()?;
        let endpoints: BTreeSet<&str> = limits
            .keys()
            .map(String::as_str)
            .chain(log.calls.iter().map(|c| c.endpoint.as_str()))
            .collect();

        Ok(endpoints
            .into_iter()
            .map(|endpoint| {
                (
                    endpoint.to_string(),
                    self.status_in(&log, &limits, endpoint),
                )
            })
            .collect())
    }

    /// Clear call history for one endpoint, or all endpoints.
    ///
    /// Limits are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the call log cannot be read or saved.
    pub fn reset(&self, endpoint: Option<&str>) -> RateLimitResult<()> {
        let _guard = self.ns.lock()?;
        let mut log = self.load_calls()?;
        match endpoint {
            Some(endpoint) => log.calls.retain(|c| c.endpoint != endpoint),
            None => log.calls.clear(),
        }
        self.save_calls(&mut log)?;
        info!(session = %self.session, endpoint = endpoint.unwrap_or("*"), "call history reset");
        Ok(())
    }

    fn push_call(&self, log: &mut CallLog, endpoint: &str, agent: &str) -> RateLimitResult<()> {
        log.calls.push(CallRecord {
            timestamp: self.clock.now_epoch(),
            endpoint: endpoint.to_string(),
            agent: agent.to_string(),
        });
        self.save_calls(log)?;
        debug!(session = %self.session, endpoint, agent, "call recorded");
        Ok(())
    }

    fn save_calls(&self, log: &mut CallLog) -> RateLimitResult<()> {
        log.prune(self.cutoff());
        log.window_seconds = self.settings.window_secs;
        self.ns.save_json(CALLS_KEY, log)?;
        Ok(())
    }

    fn decide(&self, log: &CallLog, limit: u32, endpoint: &str) -> RateDecision {
        let now = self.clock.now_epoch();
        let cutoff = self.cutoff_at(now);
        let (used, oldest) = log
            .in_window(endpoint, cutoff)
            .fold((0u32, f64::INFINITY), |(n, oldest), c| {
                (n.saturating_add(1), oldest.min(c.timestamp))
            });

        if used < limit || !oldest.is_finite() {
            return RateDecision::Allowed;
        }
        RateDecision::Limited {
            retry_after_secs: whole_secs_until(oldest + window_f64(self.settings.window_secs), now),
        }
    }

    fn status_in(
        &self,
        log: &CallLog,
        limits: &BTreeMap<String, u32>,
        endpoint: &str,
    ) -> EndpointStatus {
        let limit = self.limit_in(limits, endpoint);
        let cutoff = self.cutoff();
        let used = u32::try_from(log.in_window(endpoint, cutoff).count()).unwrap_or(u32::MAX);
        let decision = self.decide(log, limit, endpoint);
        EndpointStatus {
            endpoint: endpoint.to_string(),
            calls_used: used,
            calls_remaining: limit.saturating_sub(used),
            limit,
            seconds_until_available: match decision {
                RateDecision::Allowed => 0,
                RateDecision::Limited { retry_after_secs } => retry_after_secs,
            },
            can_call: decision.is_allowed(),
        }
    }

    fn limit_in(&self, limits: &BTreeMap<String, u32>, endpoint: &str) -> u32 {
        limits
            .get(endpoint)
            .copied()
            .unwrap_or(self.settings.default_limit)
    }

    fn cutoff(&self) -> f64 {
        self.cutoff_at(self.clock.now_epoch())
    }

    fn cutoff_at(&self, now: f64) -> f64 {
        now - window_f64(self.settings.window_secs)
    }

    fn load_calls(&self) -> RateLimitResult<CallLog> {
        Ok(self
            .ns
            .load_json::<CallLog>(CALLS_KEY)?
            .into_option()
            .unwrap_or_else(|| CallLog::empty(self.settings.window_secs)))
    }

    fn load_limits(&self) -> RateLimitResult<BTreeMap<String, u32>> {
        Ok(self
            .ns
            .load_json::<BTreeMap<String, u32>>(LIMITS_KEY)?
            .into_option()
            .unwrap_or_default())
    }
}

fn validate_limit(endpoint: &str, limit: u32) -> RateLimitResult<()> {
    if limit == 0 {
        return Err(RateLimitError::InvalidLimit {
            endpoint: endpoint.to_string(),
        });
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn window_f64(secs: u64) -> f64 {
    secs as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_secs_until(at: f64, now: f64) -> u64 {
    let wait = (at - now).ceil();
    if wait <= 0.0 { 0 } else { wait as u64 }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
