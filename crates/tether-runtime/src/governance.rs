//! Process-wide governance wiring.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tether_approval::{DefaultRiskPolicy, GateManager, HITL_COMPONENT, RiskPolicy};
use tether_audit::{AUDIT_COMPONENT, AuditTrail};
use tether_breaker::{BREAKER_COMPONENT, BreakerThresholds, CircuitBreaker};
use tether_config::Config;
use tether_core::{SessionId, SharedClock, SystemClock, TetherHome};
use tether_crypto::{ArtifactSigner, AuditSecret, DEFAULT_SIGNER};
use tether_ratelimit::{LimiterSettings, RATE_LIMIT_COMPONENT, RateLimiter, default_tool_limits};
use tether_storage::SessionStore;
use tracing::info;

use crate::config_bridge;
use crate::error::{RuntimeError, RuntimeResult};
use crate::governor::SessionGovernor;

/// Settings shared by every session a [`Governance`] opens.
#[derive(Debug, Clone)]
pub struct GovernanceOptions {
    /// Circuit breaker thresholds.
    pub thresholds: BreakerThresholds,
    /// Rate limiter window and fallback limit.
    pub limiter: LimiterSettings,
    /// Per-endpoint limits applied where a session has none yet.
    pub endpoint_limits: BTreeMap<String, u32>,
    /// Pending gate lifetime. `None` disables expiry.
    pub gate_ttl_secs: Option<u64>,
    /// Name recorded in signature stamps.
    pub signer_name: String,
    /// Time source for every component.
    pub clock: SharedClock,
    /// Risk policy for gated actions.
    pub risk_policy: Arc<dyn RiskPolicy>,
}

impl Default for GovernanceOptions {
    fn default() -> Self {
        Self {
            thresholds: BreakerThresholds::default(),
            limiter: LimiterSettings::default(),
            endpoint_limits: default_tool_limits(),
            gate_ttl_secs: None,
            signer_name: DEFAULT_SIGNER.to_string(),
            clock: SystemClock::shared(),
            risk_policy: Arc::new(DefaultRiskPolicy),
        }
    }
}

/// Owns the store, the signer and the audit trail, and opens per-session
/// governors over them.
///
/// There is no process-global signer: every component a `Governance` opens
/// signs with the secret it was built with.
#[derive(Debug, Clone)]
pub struct Governance {
    home: TetherHome,
    store: SessionStore,
    audit: AuditTrail,
    options: GovernanceOptions,
}

impl Governance {
    /// Build from explicit parts.
    #[must_use]
    pub fn new(home: TetherHome, secret: AuditSecret, options: GovernanceOptions) -> Self {
        let store = SessionStore::new(home.root());
        let signer = ArtifactSigner::new(secret)
            .with_signer(options.signer_name.clone())
            .with_clock(options.clock.clone());
        let audit = AuditTrail::new(store.clone(), Arc::new(signer));
        Self {
            home,
            store,
            audit,
            options,
        }
    }

    /// Build from a loaded configuration: resolve the data directory,
    /// prepare it, and resolve the signing secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or no
    /// secret can be resolved.
    pub fn from_config(config: &Config) -> RuntimeResult<Self> {
        let home = TetherHome::resolve(config.data_dir.as_deref()).map_err(|e| {
            RuntimeError::DataDirError {
                path: ".".to_string(),
                source: e,
            }
        })?;
        home.ensure().map_err(|e| RuntimeError::DataDirError {
            path: home.root().display().to_string(),
            source: e,
        })?;

        let secret = config_bridge::resolve_secret(config, &home)?;
        info!(data_dir = %home.root().display(), "governance initialized");
        Ok(Self::new(home, secret, config_bridge::to_options(config)))
    }

    /// Data directory.
    #[must_use]
    pub fn home(&self) -> &TetherHome {
        &self.home
    }

    /// Session store rooted at the data directory.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Shared audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Settings applied to new sessions.
    #[must_use]
    pub fn options(&self) -> &GovernanceOptions {
        &self.options
    }

    /// Open (or resume) the governor for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if any component's state cannot be initialized.
    pub fn session(&self, session: &SessionId) -> RuntimeResult<SessionGovernor> {
        Ok(SessionGovernor::new(
            session.clone(),
            self.breaker(session)?,
            self.rate_limiter(session)?,
            self.gates(session)?,
            self.audit.clone(),
        ))
    }

    /// Open just the circuit breaker of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if breaker state cannot be initialized.
    pub fn breaker(&self, session: &SessionId) -> RuntimeResult<CircuitBreaker> {
        Ok(CircuitBreaker::open_with(
            &self.store,
            session,
            self.options.thresholds,
            self.options.clock.clone(),
        )?)
    }

    /// Open just the rate limiter of a session, with the configured
    /// endpoint limits applied where unset.
    ///
    /// # Errors
    ///
    /// Returns an error if limiter state cannot be initialized.
    pub fn rate_limiter(&self, session: &SessionId) -> RuntimeResult<RateLimiter> {
        Ok(RateLimiter::open_with(
            &self.store,
            session,
            self.options.limiter,
            self.options.clock.clone(),
        )?
        .with_default_limits(&self.options.endpoint_limits)?)
    }

    /// Open just the gate manager of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the gate directory cannot be created.
    pub fn gates(&self, session: &SessionId) -> RuntimeResult<GateManager> {
        Ok(GateManager::open(&self.store, session, self.audit.clone())?
            .with_policy(self.options.risk_policy.clone())
            .with_ttl(self.options.gate_ttl_secs))
    }

    /// Every session with state in any component, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a component directory cannot be read.
    pub fn known_sessions(&self) -> RuntimeResult<Vec<SessionId>> {
        let mut sessions = BTreeSet::new();
        for component in [
            BREAKER_COMPONENT,
            AUDIT_COMPONENT,
            RATE_LIMIT_COMPONENT,
            HITL_COMPONENT,
        ] {
            sessions.extend(self.store.sessions(component)?);
        }
        Ok(sessions.into_iter().collect())
    }
}
