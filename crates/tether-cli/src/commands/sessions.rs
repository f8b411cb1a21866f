//! Sessions command - list sessions with governance state.

use colored::Colorize;
use serde::Serialize;
use tether_breaker::CircuitState;
use tether_core::SessionId;
use tether_runtime::Governance;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct SessionSummary {
    session: SessionId,
    circuit: CircuitState,
    current_turn: u64,
    pending_gates: usize,
}

/// List every session with state under the data directory.
pub(crate) fn list_sessions(governance: &Governance, format: OutputFormat) -> anyhow::Result<()> {
    let mut summaries = Vec::new();
    for session in governance.known_sessions()? {
        let status = governance.breaker(&session)?.status()?;
        let pending_gates = governance.gates(&session)?.pending_gates()?.len();
        summaries.push(SessionSummary {
            session,
            circuit: status.state,
            current_turn: status.current_turn,
            pending_gates,
        });
    }

    if format.is_json() {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!(
            "{}",
            Theme::info(&format!(
                "No sessions under {}",
                governance.home().root().display()
            ))
        );
        return Ok(());
    }

    println!("\n{}", Theme::header("Sessions"));
    println!(
        "{:<32} {:<12} {:>6} {:>8}",
        "SESSION".dimmed(),
        "CIRCUIT".dimmed(),
        "TURN".dimmed(),
        "PENDING".dimmed()
    );
    println!("{}", Theme::separator());

    for s in summaries {
        let pending = if s.pending_gates > 0 {
            s.pending_gates.to_string().yellow().to_string()
        } else {
            s.pending_gates.to_string()
        };
        println!(
            "{:<32} {:<12} {:>6} {:>8}",
            s.session.as_str(),
            Theme::circuit_state(s.circuit),
            s.current_turn,
            pending
        );
    }

    println!();
    Ok(())
}
