//! Gate command - the human side of human-in-the-loop approval.

use anyhow::Context;
use colored::Colorize;
use serde_json::{Value, json};
use tether_approval::{Gate, GateManager};
use tether_core::GateId;
use tracing::debug;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

/// Feedback arrives as JSON when it parses, otherwise as a comment.
fn parse_feedback(raw: Option<&str>) -> Option<Value> {
    raw.map(|text| {
        serde_json::from_str(text).unwrap_or_else(|e| {
            debug!(error = %e, "feedback is not JSON, storing it as a comment");
            json!({ "comment": text })
        })
    })
}

/// List gates, oldest first.
pub(crate) fn list_gates(
    gates: &GateManager,
    pending_only: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let list = if pending_only {
        gates.pending_gates()?
    } else {
        gates.list_gates()?
    };

    if format.is_json() {
        return print_json(&list);
    }

    if list.is_empty() {
        let what = if pending_only { "No pending gates" } else { "No gates" };
        println!("{}", Theme::info(what));
        return Ok(());
    }

    println!("\n{}", Theme::header(&format!("Gates ({})", gates.session())));
    println!(
        "{:<24} {:<18} {:<10} {:<20} {}",
        "GATE".dimmed(),
        "STATUS".dimmed(),
        "RISK".dimmed(),
        "CREATED".dimmed(),
        "DESCRIPTION".dimmed()
    );
    println!("{}", Theme::separator());

    for gate in list {
        println!(
            "{:<24} {:<18} {:<10} {:<20} {}",
            gate.gate_id.as_str(),
            Theme::gate_status(gate.status),
            Theme::risk_level(gate.risk_level),
            Theme::epoch(gate.created_at),
            gate.description
        );
    }

    println!();
    Ok(())
}

/// Show one gate in full.
pub(crate) fn show_gate(
    gates: &GateManager,
    gate_id: &GateId,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let gate = gates
        .get_gate(gate_id)?
        .with_context(|| format!("Gate '{gate_id}' not found or failed verification"))?;

    if format.is_json() {
        return print_json(&gate);
    }

    print_gate(&gate)
}

fn print_gate(gate: &Gate) -> anyhow::Result<()> {
    println!("\n{}", Theme::header(&format!("Gate {}", gate.gate_id)));
    println!("{}", Theme::kv("Status", &Theme::gate_status(gate.status)));
    println!("{}", Theme::kv("Risk", &Theme::risk_level(gate.risk_level)));
    println!("{}", Theme::kv("Session", gate.session_id.as_str()));
    println!("{}", Theme::kv("Phase", &gate.phase));
    println!("{}", Theme::kv("Description", &gate.description));
    println!("{}", Theme::kv("Created", &Theme::epoch(gate.created_at)));
    if let Some(at) = gate.expires_at {
        println!("{}", Theme::kv("Expires", &Theme::epoch(at)));
    }
    if let Some(at) = gate.resolved_at {
        println!("{}", Theme::kv("Resolved", &Theme::epoch(at)));
    }
    if let Some(reason) = &gate.rejection_reason {
        println!("{}", Theme::kv("Rejection reason", reason));
    }
    if !gate.agents_involved.is_empty() {
        println!("{}", Theme::kv("Agents", &gate.agents_involved.join(", ")));
    }
    if !gate.artifacts.is_empty() {
        println!("{}", Theme::kv("Artifacts", &gate.artifacts.join(", ")));
    }
    println!("{}", Theme::kv("Details", ""));
    for line in serde_json::to_string_pretty(&gate.details)?.lines() {
        println!("    {}", Theme::dimmed(line));
    }
    if let Some(feedback) = &gate.feedback {
        println!("{}", Theme::kv("Feedback", &feedback.to_string()));
    }
    println!();
    Ok(())
}

/// Approve a pending gate.
pub(crate) fn approve(
    gates: &GateManager,
    gate_id: &GateId,
    feedback: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let gate = gates.approve_gate(gate_id, parse_feedback(feedback))?;
    if format.is_json() {
        return print_json(&gate);
    }
    println!(
        "{}",
        Theme::success(&format!("Gate '{gate_id}' approved ({})", gate.description))
    );
    Ok(())
}

/// Reject a pending gate.
pub(crate) fn reject(
    gates: &GateManager,
    gate_id: &GateId,
    reason: &str,
    feedback: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let gate = gates.reject_gate(gate_id, reason, parse_feedback(feedback))?;
    if format.is_json() {
        return print_json(&gate);
    }
    println!(
        "{}",
        Theme::warning(&format!("Gate '{gate_id}' rejected: {reason}"))
    );
    Ok(())
}

/// Delete every gate of the session, after confirmation.
pub(crate) fn clear(gates: &GateManager, yes: bool, format: OutputFormat) -> anyhow::Result<()> {
    if !yes {
        let pending = gates.pending_gates()?.len();
        if pending > 0 {
            println!(
                "{}",
                Theme::warning(&format!(
                    "{pending} gate(s) are still waiting for a decision."
                ))
            );
        }
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!("Delete all gates of session {}?", gates.session()))
            .default(false)
            .interact()?;
        if !confirm {
            println!("{}", Theme::info("Aborted."));
            return Ok(());
        }
    }

    let removed = gates.clear_gates()?;
    if format.is_json() {
        return print_json(&json!({ "removed": removed }));
    }
    println!("{}", Theme::success(&format!("Removed {removed} gate(s)")));
    Ok(())
}
