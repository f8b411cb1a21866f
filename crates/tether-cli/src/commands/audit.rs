//! Audit command - read and verify the signed audit trail.

use colored::Colorize;
use serde_json::json;
use tether_audit::AuditTrail;
use tether_core::SessionId;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

/// Show the most recent events of a session, oldest first.
pub(crate) fn tail(
    audit: &AuditTrail,
    session: &SessionId,
    limit: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let events = audit.recent_events(session, limit)?;
    if format.is_json() {
        return print_json(&events);
    }

    if events.is_empty() {
        println!("{}", Theme::info("No audit events for this session"));
        return Ok(());
    }

    println!("\n{}", Theme::header(&format!("Audit Events ({session})")));
    println!(
        "{:<20} {:<16} {:<14} {:<12} {}",
        "TIMESTAMP".dimmed(),
        "EVENT".dimmed(),
        "AGENT".dimmed(),
        "PHASE".dimmed(),
        "DETAILS".dimmed()
    );
    println!("{}", Theme::separator());

    for event in events {
        let mut details = event.details.to_string();
        if details.len() > 60 {
            let cut = details
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|i| *i <= 57)
                .last()
                .unwrap_or(0);
            details.truncate(cut);
            details.push_str("...");
        }
        println!(
            "{:<20} {:<16} {:<14} {:<12} {}",
            Theme::epoch(event.timestamp),
            event.event_type,
            event.agent,
            event.phase,
            Theme::dimmed(&details)
        );
    }

    println!();
    Ok(())
}

/// Verify every record of the given sessions.
///
/// Fails when any record is tampered or unparsable, so scripts can gate on
/// the exit status.
pub(crate) fn verify(
    audit: &AuditTrail,
    sessions: &[SessionId],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut reports = Vec::with_capacity(sessions.len());
    for session in sessions {
        reports.push((session, audit.verify_session(session)?));
    }
    let failing = reports.iter().filter(|(_, r)| !r.is_clean()).count();

    if format.is_json() {
        let body: Vec<_> = reports
            .iter()
            .map(|(session, report)| json!({ "session": session, "report": report }))
            .collect();
        print_json(&body)?;
    } else if reports.is_empty() {
        println!("{}", Theme::info("No audit logs found"));
    } else {
        for (session, report) in &reports {
            if report.is_clean() {
                println!(
                    "{}",
                    Theme::success(&format!(
                        "Session {session}: {} events verified",
                        report.verified
                    ))
                );
                continue;
            }
            println!(
                "{}",
                Theme::error(&format!(
                    "Session {session}: {}/{} events verified",
                    report.verified, report.total
                ))
            );
            for line in &report.tampered {
                println!("  - line {line}: {}", "signature mismatch".red());
            }
            for line in &report.unparsable {
                println!("  - line {line}: {}", "unparsable".yellow());
            }
        }
    }

    if failing > 0 {
        anyhow::bail!("{failing} session(s) failed audit verification");
    }
    Ok(())
}
