//! Bridge from `tether_config::Config` to CLI-local logging configuration.

use tether_config::Config;
use tether_telemetry::{LogConfig, LogFormat};

/// Logging for a command run: the `[logging]` section, compact by default
/// since command output shares the terminal, with `--verbose` forcing debug.
pub(crate) fn to_log_config(cfg: &Config, verbose: bool) -> LogConfig {
    let mut lc = LogConfig::from_section(&cfg.logging)
        .unwrap_or_else(|_| LogConfig::new(cfg.logging.level.clone()));
    if cfg.logging.format == "pretty" {
        lc = lc.with_format(LogFormat::Compact);
    }
    if verbose {
        "debug".clone_into(&mut lc.level);
    }
    lc
}

/// Logging when the config file itself could not be loaded.
pub(crate) fn fallback_log_config(verbose: bool) -> LogConfig {
    let level = if verbose { "debug" } else { "warn" };
    LogConfig::new(level).with_format(LogFormat::Compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        let cfg = Config::default();
        assert_eq!(to_log_config(&cfg, false).level, "info");
        assert_eq!(to_log_config(&cfg, true).level, "debug");
    }

    #[test]
    fn test_explicit_format_is_kept() {
        let mut cfg = Config::default();
        cfg.logging.format = "json".into();
        assert_eq!(to_log_config(&cfg, false).format, LogFormat::Json);
        assert_eq!(
            to_log_config(&Config::default(), false).format,
            LogFormat::Compact
        );
    }
}
