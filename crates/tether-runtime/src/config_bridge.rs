//! Bridge from `tether_config::Config` to component settings.
//!
//! The config crate depends on no other tether crate. Conversion into the
//! breaker, limiter and signing types happens here, once, for both the CLI
//! and embedding orchestrators.

use tether_breaker::BreakerThresholds;
use tether_config::env::AUDIT_SECRET_VAR;
use tether_config::{Config, SecretSource};
use tether_core::TetherHome;
use tether_crypto::AuditSecret;
use tether_ratelimit::LimiterSettings;
use tracing::{debug, warn};

use crate::error::{RuntimeError, RuntimeResult};
use crate::governance::GovernanceOptions;

/// Convert `[breaker]` to [`BreakerThresholds`].
#[must_use]
pub fn to_thresholds(cfg: &Config) -> BreakerThresholds {
    BreakerThresholds {
        no_progress: cfg.breaker.no_progress_threshold,
        same_error: cfg.breaker.same_error_threshold,
        half_open: cfg.breaker.half_open_threshold,
    }
}

/// Convert `[rate_limits]` to [`LimiterSettings`].
#[must_use]
pub fn to_limiter_settings(cfg: &Config) -> LimiterSettings {
    LimiterSettings {
        window_secs: cfg.rate_limits.window_secs,
        default_limit: cfg.rate_limits.default_calls_per_hour,
    }
}

/// Convert the whole config to [`GovernanceOptions`] (system clock, default
/// risk policy).
#[must_use]
pub fn to_options(cfg: &Config) -> GovernanceOptions {
    GovernanceOptions {
        thresholds: to_thresholds(cfg),
        limiter: to_limiter_settings(cfg),
        endpoint_limits: cfg.rate_limits.endpoints.clone(),
        gate_ttl_secs: cfg.approval.gate_ttl_secs,
        signer_name: cfg.audit.signer.clone(),
        ..GovernanceOptions::default()
    }
}

/// Resolve the audit signing secret.
///
/// An inline `audit.secret` wins (the environment overlay has already
/// copied `TETHER_AUDIT_SECRET` into it). Otherwise `audit.secret_source`
/// decides: `env` fails, `key_file` loads or creates
/// `<data_dir>/keys/audit.key`, `ephemeral` generates a secret that dies
/// with the process.
///
/// # Errors
///
/// Returns an error if the secret is blank, the key file cannot be read or
/// created, or the environment source is selected without a secret.
pub fn resolve_secret(cfg: &Config, home: &TetherHome) -> RuntimeResult<AuditSecret> {
    if let Some(secret) = &cfg.audit.secret {
        debug!("using configured audit secret");
        return Ok(AuditSecret::new(secret.as_str())?);
    }

    match cfg.audit.secret_source {
        SecretSource::Env => Err(RuntimeError::MissingSecret {
            var: AUDIT_SECRET_VAR,
        }),
        SecretSource::KeyFile => {
            let path = home.audit_key_path();
            debug!(path = %path.display(), "using audit key file");
            Ok(AuditSecret::load_or_create(&path)?)
        },
        SecretSource::Ephemeral => {
            warn!(
                "using an ephemeral audit secret; signatures will not verify in other processes"
            );
            Ok(AuditSecret::generate())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_follow_config() {
        let mut cfg = Config::default();
        cfg.breaker.no_progress_threshold = 6;
        cfg.rate_limits.window_secs = 60;
        cfg.approval.gate_ttl_secs = Some(30);
        cfg.audit.signer = "ops".into();

        let options = to_options(&cfg);
        assert_eq!(options.thresholds.no_progress, 6);
        assert_eq!(options.thresholds.same_error, 5);
        assert_eq!(options.limiter.window_secs, 60);
        assert_eq!(options.limiter.default_limit, 100);
        assert_eq!(options.endpoint_limits["deepsearch"], 10);
        assert_eq!(options.gate_ttl_secs, Some(30));
        assert_eq!(options.signer_name, "ops");
    }

    #[test]
    fn test_inline_secret_wins() {
        let dir = tempfile::tempdir().unwrap();
        let home = TetherHome::from_path(dir.path());
        let mut cfg = Config::default();
        cfg.audit.secret = Some("inline".into());

        resolve_secret(&cfg, &home).unwrap();
        assert!(!home.audit_key_path().exists());
    }

    #[test]
    fn test_key_file_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let home = TetherHome::from_path(dir.path());
        home.ensure().unwrap();
        let cfg = Config::default();

        resolve_secret(&cfg, &home).unwrap();
        let first = std::fs::read_to_string(home.audit_key_path()).unwrap();
        resolve_secret(&cfg, &home).unwrap();
        let second = std::fs::read_to_string(home.audit_key_path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_env_source_requires_secret() {
        let dir = tempfile::tempdir().unwrap();
        let home = TetherHome::from_path(dir.path());
        let mut cfg = Config::default();
        cfg.audit.secret_source = SecretSource::Env;

        assert!(matches!(
            resolve_secret(&cfg, &home),
            Err(RuntimeError::MissingSecret { .. })
        ));
    }
}
