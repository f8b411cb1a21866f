//! Rate command - inspect and tune rate limits.

use colored::Colorize;
use serde_json::json;
use tether_ratelimit::{EndpointStatus, RateLimiter};

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

/// Show usage for one endpoint or all known endpoints.
pub(crate) fn show_status(
    limiter: &RateLimiter,
    endpoint: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let statuses: Vec<EndpointStatus> = match endpoint {
        Some(endpoint) => vec![limiter.get_status(endpoint)?],
        None => limiter.get_status_all()?.into_values().collect(),
    };

    if format.is_json() {
        return print_json(&statuses);
    }

    if statuses.is_empty() {
        println!("{}", Theme::info("No endpoints configured or called"));
        return Ok(());
    }

    println!(
        "\n{}",
        Theme::header(&format!(
            "Rate Limits ({}, {}s window)",
            limiter.session(),
            limiter.window_secs()
        ))
    );
    println!(
        "{:<20} {:>6} {:>6} {:>10}  {}",
        "ENDPOINT".dimmed(),
        "USED".dimmed(),
        "LIMIT".dimmed(),
        "REMAINING".dimmed(),
        "AVAILABLE".dimmed()
    );
    println!("{}", Theme::separator());

    for s in statuses {
        let available = if s.can_call {
            "now".green().to_string()
        } else {
            format!("in {}s", s.seconds_until_available).red().to_string()
        };
        println!(
            "{:<20} {:>6} {:>6} {:>10}  {}",
            s.endpoint, s.calls_used, s.limit, s.calls_remaining, available
        );
    }

    println!();
    Ok(())
}

/// Forget recorded calls.
pub(crate) fn reset(
    limiter: &RateLimiter,
    endpoint: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    limiter.reset(endpoint)?;
    if format.is_json() {
        return print_json(&json!({ "reset": endpoint.unwrap_or("*") }));
    }
    let target = endpoint.map_or_else(|| "all endpoints".to_string(), |e| format!("'{e}'"));
    println!("{}", Theme::success(&format!("Call history cleared for {target}")));
    Ok(())
}

/// Set an endpoint's limit.
pub(crate) fn set_limit(
    limiter: &RateLimiter,
    endpoint: &str,
    limit: u32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    limiter.set_limit(endpoint, limit)?;
    let status = limiter.get_status(endpoint)?;
    if format.is_json() {
        return print_json(&status);
    }
    println!(
        "{}",
        Theme::success(&format!(
            "'{endpoint}' limited to {limit} calls per {}s ({} used)",
            limiter.window_secs(),
            status.calls_used
        ))
    );
    if !status.can_call {
        println!(
            "{}",
            Theme::warning(&format!(
                "Already at the limit; next call in {}s",
                status.seconds_until_available
            ))
        );
    }
    Ok(())
}
