//! Tether CLI - the operator side of agent-loop governance.
//!
//! Orchestrators drive the governance layer in-process; operators use this
//! binary against the same data directory to approve or reject gates, reset
//! halted loops, adjust rate limits and verify the audit trail.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tether_config::{Config, ResolvedConfig};
use tether_core::{GateId, SessionId};
use tether_runtime::Governance;
use tracing::debug;

mod commands;
mod config_bridge;
mod formatter;
mod theme;

use commands::{audit, breaker, config, gate, rate, sessions};
use formatter::OutputFormat;

/// Tether - governance for autonomous agent loops
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $TETHER_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config and $TETHER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Session to act on (optional when only one session exists)
    #[arg(short, long, global = true)]
    session: Option<SessionId>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions with governance state
    Sessions,

    /// Inspect or reset the circuit breaker
    Breaker {
        #[command(subcommand)]
        command: BreakerCommands,
    },

    /// Inspect and tune rate limits
    Rate {
        #[command(subcommand)]
        command: RateCommands,
    },

    /// Review and resolve approval gates
    Gate {
        #[command(subcommand)]
        command: GateCommands,
    },

    /// Read and verify the audit trail
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },

    /// Show or validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum BreakerCommands {
    /// Show the current state and counters
    Status,
    /// Show recent state transitions
    History {
        /// Number of transitions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Close the circuit so the loop may run again
    Reset {
        /// Reason recorded in the transition history
        #[arg(long, default_value = "Manual reset by operator")]
        reason: String,
    },
}

#[derive(Subcommand)]
enum RateCommands {
    /// Show usage per endpoint
    Status {
        /// Only this endpoint
        endpoint: Option<String>,
    },
    /// Forget recorded calls (limits are kept)
    Reset {
        /// Only this endpoint
        endpoint: Option<String>,
    },
    /// Set the per-window limit for an endpoint
    SetLimit {
        /// Endpoint name
        endpoint: String,
        /// Calls allowed per window
        limit: u32,
    },
}

#[derive(Subcommand)]
enum GateCommands {
    /// List gates
    List {
        /// Only gates awaiting a decision
        #[arg(long)]
        pending: bool,
    },
    /// Show one gate in full
    Show {
        /// Gate ID
        gate_id: GateId,
    },
    /// Approve a pending gate
    Approve {
        /// Gate ID
        gate_id: GateId,
        /// Feedback for the agent (JSON, or plain text)
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Reject a pending gate
    Reject {
        /// Gate ID
        gate_id: GateId,
        /// Why the action is rejected
        #[arg(long)]
        reason: String,
        /// Feedback for the agent (JSON, or plain text)
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Delete every gate of the session
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    /// Show the most recent events
    Tail {
        /// Number of events to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Verify event signatures (all sessions unless --session is given)
    Verify,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate the configuration and exit
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Pretty
    };

    let loaded = Config::load(cli.config.as_deref());

    // Set up logging from config, with --verbose override.
    let log_config = match &loaded {
        Ok(resolved) => config_bridge::to_log_config(&resolved.config, cli.verbose),
        Err(_) => config_bridge::fallback_log_config(cli.verbose),
    };
    if let Err(e) = tether_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut resolved = loaded.context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        resolved.config.data_dir = Some(dir);
    }
    debug!(
        file = ?resolved.loaded_file,
        data_dir = ?resolved.config.data_dir,
        "configuration loaded"
    );

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => config::show_config(&resolved, format),
            ConfigCommands::Validate => config::validate_config(&resolved, format),
        },
        Commands::Sessions => sessions::list_sessions(&open_governance(&resolved)?, format),
        Commands::Breaker { command } => {
            let governance = open_governance(&resolved)?;
            let session = resolve_session(&governance, cli.session)?;
            handle_breaker(&governance, &session, command, format)
        },
        Commands::Rate { command } => {
            let governance = open_governance(&resolved)?;
            let session = resolve_session(&governance, cli.session)?;
            handle_rate(&governance, &session, command, format)
        },
        Commands::Gate { command } => {
            let governance = open_governance(&resolved)?;
            let session = resolve_session(&governance, cli.session)?;
            handle_gate(&governance, &session, command, format)
        },
        Commands::Audit { command } => {
            handle_audit(&open_governance(&resolved)?, cli.session, command, format)
        },
    }
}

fn open_governance(resolved: &ResolvedConfig) -> Result<Governance> {
    Governance::from_config(&resolved.config).context("Failed to open governance state")
}

/// Use the explicit session, or the only session on disk.
fn resolve_session(governance: &Governance, explicit: Option<SessionId>) -> Result<SessionId> {
    if let Some(session) = explicit {
        return Ok(session);
    }
    let known = governance.known_sessions()?;
    match known.as_slice() {
        [only] => {
            debug!(session = %only, "no --session given, using the only session on disk");
            Ok(only.clone())
        },
        [] => anyhow::bail!(
            "No sessions found under {}",
            governance.home().root().display()
        ),
        many => {
            let names: Vec<&str> = many.iter().map(SessionId::as_str).collect();
            anyhow::bail!(
                "Several sessions found ({}); pick one with --session",
                names.join(", ")
            )
        },
    }
}

fn handle_breaker(
    governance: &Governance,
    session: &SessionId,
    command: BreakerCommands,
    format: OutputFormat,
) -> Result<()> {
    let breaker = governance.breaker(session)?;
    match command {
        BreakerCommands::Status => breaker::show_status(&breaker, format),
        BreakerCommands::History { limit } => breaker::show_history(&breaker, limit, format),
        BreakerCommands::Reset { reason } => breaker::reset(&breaker, &reason, format),
    }
}

fn handle_rate(
    governance: &Governance,
    session: &SessionId,
    command: RateCommands,
    format: OutputFormat,
) -> Result<()> {
    let limiter = governance.rate_limiter(session)?;
    match command {
        RateCommands::Status { endpoint } => rate::show_status(&limiter, endpoint.as_deref(), format),
        RateCommands::Reset { endpoint } => rate::reset(&limiter, endpoint.as_deref(), format),
        RateCommands::SetLimit { endpoint, limit } => {
            rate::set_limit(&limiter, &endpoint, limit, format)
        },
    }
}

fn handle_gate(
    governance: &Governance,
    session: &SessionId,
    command: GateCommands,
    format: OutputFormat,
) -> Result<()> {
    let gates = governance.gates(session)?;
    match command {
        GateCommands::List { pending } => gate::list_gates(&gates, pending, format),
        GateCommands::Show { gate_id } => gate::show_gate(&gates, &gate_id, format),
        GateCommands::Approve { gate_id, feedback } => {
            gate::approve(&gates, &gate_id, feedback.as_deref(), format)
        },
        GateCommands::Reject {
            gate_id,
            reason,
            feedback,
        } => gate::reject(&gates, &gate_id, &reason, feedback.as_deref(), format),
        GateCommands::Clear { yes } => gate::clear(&gates, yes, format),
    }
}

fn handle_audit(
    governance: &Governance,
    session: Option<SessionId>,
    command: AuditCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AuditCommands::Tail { limit } => {
            let session = resolve_session(governance, session)?;
            audit::tail(governance.audit(), &session, limit, format)
        },
        AuditCommands::Verify => {
            let sessions = match session {
                Some(session) => vec![session],
                None => governance.known_sessions()?,
            };
            audit::verify(governance.audit(), &sessions, format)
        },
    }
}
