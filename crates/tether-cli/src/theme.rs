//! Terminal styling for command output.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use tether_approval::GateStatus;
use tether_breaker::CircuitState;
use tether_core::RiskLevel;

/// How alarming a value is, which decides its color.
#[derive(Clone, Copy)]
enum Tone {
    Good,
    Caution,
    Bad,
    Alarm,
    Quiet,
}

fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Good => text.green(),
        Tone::Caution => text.yellow(),
        Tone::Bad => text.red(),
        Tone::Alarm => text.red().bold(),
        Tone::Quiet => text.dimmed(),
    }
}

/// Namespace for styling helpers.
pub(crate) struct Theme;

impl Theme {
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", paint("ok", Tone::Good))
    }

    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", paint("error:", Tone::Alarm), paint(text, Tone::Bad))
    }

    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", paint("warning:", Tone::Caution).bold(), paint(text, Tone::Caution))
    }

    pub(crate) fn info(text: &str) -> String {
        format!("{} {text}", "--".blue())
    }

    pub(crate) fn dimmed(text: &str) -> String {
        paint(text, Tone::Quiet).to_string()
    }

    pub(crate) fn separator() -> String {
        paint(&"-".repeat(56), Tone::Quiet).to_string()
    }

    /// `  key:   value`, keys padded so values line up.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        let label = format!("{key}:");
        format!("  {:<22}{value}", label.bold())
    }

    pub(crate) fn risk_level(level: RiskLevel) -> String {
        let tone = match level {
            RiskLevel::Low => Tone::Good,
            RiskLevel::Medium => Tone::Caution,
            RiskLevel::High => Tone::Bad,
            RiskLevel::Critical => Tone::Alarm,
        };
        paint(&level.to_string(), tone).to_string()
    }

    pub(crate) fn circuit_state(state: CircuitState) -> String {
        let tone = match state {
            CircuitState::Closed => Tone::Good,
            CircuitState::HalfOpen => Tone::Caution,
            CircuitState::Open => Tone::Alarm,
        };
        paint(state.as_str(), tone).to_string()
    }

    pub(crate) fn gate_status(status: GateStatus) -> String {
        let tone = match status {
            GateStatus::Pending => Tone::Caution,
            GateStatus::Approved => Tone::Good,
            GateStatus::Rejected => Tone::Bad,
            GateStatus::Expired => Tone::Quiet,
        };
        paint(status.as_str(), tone).to_string()
    }

    pub(crate) fn timestamp(at: &DateTime<Utc>) -> String {
        Self::dimmed(&at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }

    /// Epoch seconds as a timestamp, or the raw number if out of range.
    pub(crate) fn epoch(secs: f64) -> String {
        match tether_core::from_epoch_secs(secs) {
            Some(at) => Self::timestamp(&at),
            None => format!("{secs:.0}"),
        }
    }
}
