//! Subscriber construction.
//!
//! Every governance crate emits plain `tracing` events with structured
//! fields (`session`, `endpoint`, `gate_id`, ...). [`setup_logging`] decides
//! where they go and how they look.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self as tracing_fmt, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// How events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored, for a terminal.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
    /// `tracing-subscriber`'s default single-line format.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            _ => Err(TelemetryError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
            Self::Full => "full",
        })
    }
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error, so command output on stdout stays clean.
    #[default]
    Stderr,
    /// Daily-rotated files in this directory.
    File(PathBuf),
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Rendering.
    pub format: LogFormat,
    /// Destination.
    pub target: LogTarget,
    /// File name prefix when logging to files.
    pub file_prefix: String,
    /// Include timestamps.
    pub timestamps: bool,
    /// Emit ANSI colors.
    pub ansi: bool,
    /// Extra `EnvFilter` directives such as `tether_breaker=debug`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Pretty output to stderr at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Pretty,
            target: LogTarget::Stderr,
            file_prefix: "tether".to_string(),
            timestamps: true,
            ansi: true,
            directives: Vec::new(),
        }
    }

    /// Build from the `[logging]` section of a tether config file.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::UnknownFormat`] for an unknown format name.
    #[cfg(feature = "config")]
    pub fn from_section(section: &tether_config::LoggingSection) -> TelemetryResult<Self> {
        let mut config = Self::new(section.level.clone()).with_format(section.format.parse()?);
        config.directives.clone_from(&section.directives);
        Ok(config)
    }

    /// Use another format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Use another destination.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Write daily-rotated `<prefix>.<date>` files under `directory`,
    /// without colors.
    #[must_use]
    pub fn log_to_dir(mut self, directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.target = LogTarget::File(directory.into());
        self.file_prefix = prefix.into();
        self.ansi = false;
        self
    }

    /// Add an `EnvFilter` directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Leave timestamps out (useful under a supervisor that adds its own).
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Disable colors.
    #[must_use]
    pub fn plain(mut self) -> Self {
        self.ansi = false;
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |directive: &str, message: String| TelemetryError::InvalidDirective {
            directive: directive.to_string(),
            message,
        };

        let mut filter =
            EnvFilter::try_new(&self.level).map_err(|e| invalid(&self.level, e.to_string()))?;
        for directive in &self.directives {
            let parsed = directive
                .parse()
                .map_err(|e: tracing_subscriber::filter::ParseError| {
                    invalid(directive, e.to_string())
                })?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }

    fn fmt_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = tracing_fmt::layer().with_writer(writer).with_ansi(self.ansi);
        match (self.format, self.timestamps) {
            (LogFormat::Pretty, true) => layer.pretty().boxed(),
            (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
        }
    }
}

/// Install the process-wide subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if a directive is invalid, the log directory cannot be
/// created, or a subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => config.fmt_layer(std::io::stdout),
        LogTarget::Stderr => config.fmt_layer(std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDirectory {
                path: dir.clone(),
                source,
            })?;
            config.fmt_layer(RollingFileAppender::new(
                Rotation::DAILY,
                dir,
                &config.file_prefix,
            ))
        },
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}

/// [`setup_logging`] with [`LogConfig::default`].
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_write_pretty_to_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps && config.ansi);
    }

    #[test]
    fn test_file_target_drops_colors() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new("debug").log_to_dir(dir.path(), "governor");
        assert_eq!(config.target, LogTarget::File(dir.path().to_path_buf()));
        assert_eq!(config.file_prefix, "governor");
        assert!(!config.ansi);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" full ".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat(name)) if name == "xml"
        ));
        assert_eq!(LogFormat::Compact.to_string(), "compact");
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_directives_extend_the_filter() {
        let config = LogConfig::new("warn")
            .with_directive("tether_breaker=debug")
            .with_directive("tether_approval=trace");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_bad_directive_is_named() {
        let config = LogConfig::new("info").with_directive("[broken=");
        match config.env_filter() {
            Err(TelemetryError::InvalidDirective { directive, .. }) => {
                assert_eq!(directive, "[broken=");
            },
            other => panic!("expected invalid directive, got {other:?}"),
        }
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_section() {
        let section = tether_config::LoggingSection {
            level: "warn".into(),
            format: "json".into(),
            directives: vec!["tether_audit=debug".into()],
        };
        let config = LogConfig::from_section(&section).unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["tether_audit=debug"]);
    }
}
