//! Configuration validation.
//!
//! Checks ranges and cross-field invariants after loading and the
//! environment overlay.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a loaded configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_audit(config)?;
    validate_breaker(config)?;
    validate_rate_limits(config)?;
    validate_approval(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_audit(config: &Config) -> ConfigResult<()> {
    let a = &config.audit;

    if a.signer.trim().is_empty() {
        return Err(invalid("audit.signer", "signer name must not be empty"));
    }

    if a.secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(invalid(
            "audit.secret",
            "secret must not be blank; remove it to use secret_source",
        ));
    }

    Ok(())
}

fn validate_breaker(config: &Config) -> ConfigResult<()> {
    let b = &config.breaker;

    for (field, value) in [
        ("breaker.no_progress_threshold", b.no_progress_threshold),
        ("breaker.same_error_threshold", b.same_error_threshold),
        ("breaker.half_open_threshold", b.half_open_threshold),
    ] {
        if value == 0 {
            return Err(invalid(field, "threshold must be at least 1"));
        }
    }

    if b.half_open_threshold >= b.no_progress_threshold {
        return Err(invalid(
            "breaker.half_open_threshold",
            format!(
                "half_open_threshold ({}) must be below no_progress_threshold ({})",
                b.half_open_threshold, b.no_progress_threshold
            ),
        ));
    }

    Ok(())
}

fn validate_rate_limits(config: &Config) -> ConfigResult<()> {
    let r = &config.rate_limits;

    if r.window_secs == 0 {
        return Err(invalid("rate_limits.window_secs", "window must be at least 1 second"));
    }

    if r.default_calls_per_hour == 0 {
        return Err(invalid(
            "rate_limits.default_calls_per_hour",
            "default limit must be at least 1",
        ));
    }

    if let Some((endpoint, _)) = r.endpoints.iter().find(|(_, limit)| **limit == 0) {
        return Err(invalid(
            format!("rate_limits.endpoints.{endpoint}"),
            "limit must be at least 1",
        ));
    }

    if let Some(endpoint) = r.endpoints.keys().find(|e| e.trim().is_empty()) {
        return Err(invalid(
            "rate_limits.endpoints",
            format!("endpoint name '{endpoint}' must not be blank"),
        ));
    }

    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    if config.approval.gate_ttl_secs == Some(0) {
        return Err(invalid(
            "approval.gate_ttl_secs",
            "ttl must be at least 1 second; remove it to disable expiry",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(config: &Config) -> String {
        match validate(config) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = Config::default();
        config.breaker.same_error_threshold = 0;
        assert_eq!(field_of(&config), "breaker.same_error_threshold");
    }

    #[test]
    fn test_half_open_must_precede_open() {
        let mut config = Config::default();
        config.breaker.half_open_threshold = 3;
        assert_eq!(field_of(&config), "breaker.half_open_threshold");
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = Config::default();
        config.rate_limits.window_secs = 0;
        assert_eq!(field_of(&config), "rate_limits.window_secs");

        let mut config = Config::default();
        config.rate_limits.endpoints.insert("web_fetch".into(), 0);
        assert_eq!(field_of(&config), "rate_limits.endpoints.web_fetch");
    }

    #[test]
    fn test_empty_signer_rejected() {
        let mut config = Config::default();
        config.audit.signer = "  ".into();
        assert_eq!(field_of(&config), "audit.signer");
    }

    #[test]
    fn test_logging_values() {
        let mut config = Config::default();
        config.logging.level = "WARN".into();
        validate(&config).unwrap();

        config.logging.format = "xml".into();
        assert_eq!(field_of(&config), "logging.format");
    }
}
