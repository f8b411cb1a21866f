//! Breaker command - inspect and reset the circuit breaker.

use colored::Colorize;
use tether_breaker::CircuitBreaker;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

/// Show the breaker's state and counters.
pub(crate) fn show_status(breaker: &CircuitBreaker, format: OutputFormat) -> anyhow::Result<()> {
    let status = breaker.status()?;
    if format.is_json() {
        return print_json(&status);
    }

    let thresholds = breaker.thresholds();
    println!(
        "\n{}",
        Theme::header(&format!("Circuit Breaker ({})", breaker.session()))
    );
    println!("{}", Theme::kv("State", &Theme::circuit_state(status.state)));
    println!(
        "{}",
        Theme::kv(
            "Can execute",
            &if status.can_execute {
                "yes".green().to_string()
            } else {
                "no".red().to_string()
            }
        )
    );
    println!(
        "{}",
        Theme::kv(
            "No progress",
            &format!(
                "{} (monitor at {}, open at {})",
                status.consecutive_no_progress, thresholds.half_open, thresholds.no_progress
            )
        )
    );
    println!(
        "{}",
        Theme::kv(
            "Error turns",
            &format!(
                "{} (open at {})",
                status.consecutive_same_error, thresholds.same_error
            )
        )
    );
    println!(
        "{}",
        Theme::kv("Current turn", &status.current_turn.to_string())
    );
    println!(
        "{}",
        Theme::kv("Last progress", &status.last_progress_turn.to_string())
    );
    println!("{}", Theme::kv("Total opens", &status.total_opens.to_string()));
    println!("{}", Theme::kv("Reason", &status.reason));
    println!(
        "{}",
        Theme::kv("Last change", &Theme::timestamp(&status.last_change))
    );
    println!();
    Ok(())
}

/// Show recent transitions, oldest first.
pub(crate) fn show_history(
    breaker: &CircuitBreaker,
    limit: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let history = breaker.history(limit)?;
    if format.is_json() {
        return print_json(&history);
    }

    if history.is_empty() {
        println!("{}", Theme::info("No transitions recorded"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Breaker Transitions"));
    println!(
        "{:<20} {:>6}  {:<22} {}",
        "TIMESTAMP".dimmed(),
        "TURN".dimmed(),
        "TRANSITION".dimmed(),
        "REASON".dimmed()
    );
    println!("{}", Theme::separator());

    for record in history {
        let transition = format!("{} → {}", record.from_state, record.to_state);
        println!(
            "{:<20} {:>6}  {:<22} {}",
            Theme::timestamp(&record.timestamp),
            record.turn,
            transition,
            record.reason
        );
    }

    println!();
    Ok(())
}

/// Close the circuit.
pub(crate) fn reset(
    breaker: &CircuitBreaker,
    reason: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let before = breaker.state()?;
    breaker.reset(reason)?;
    let status = breaker.status()?;

    if format.is_json() {
        return print_json(&status);
    }

    println!(
        "{}",
        Theme::success(&format!(
            "Circuit for {} reset ({} → {})",
            breaker.session(),
            before,
            status.state
        ))
    );
    Ok(())
}
