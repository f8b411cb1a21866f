//! Config command - show and validate the resolved configuration.

use serde_json::json;
use tether_config::ResolvedConfig;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

fn source_line(resolved: &ResolvedConfig) -> String {
    let file = resolved
        .loaded_file
        .as_ref()
        .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
    format!("{file}, {} environment override(s)", resolved.env_overrides)
}

/// Print the resolved configuration. The inline secret is never shown.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: OutputFormat) -> anyhow::Result<()> {
    if format.is_json() {
        return print_json(&resolved.config);
    }
    println!("{}", Theme::dimmed(&format!("# source: {}", source_line(resolved))));
    if resolved.config.audit.secret.is_some() {
        println!("{}", Theme::dimmed("# audit.secret is set (hidden)"));
    }
    print!("{}", toml::to_string_pretty(&resolved.config)?);
    Ok(())
}

/// Loading already validated; report what was validated.
pub(crate) fn validate_config(
    resolved: &ResolvedConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format.is_json() {
        return print_json(&json!({
            "valid": true,
            "file": resolved.loaded_file,
            "env_overrides": resolved.env_overrides,
        }));
    }
    println!(
        "{}",
        Theme::success(&format!("Configuration valid ({})", source_line(resolved)))
    );
    Ok(())
}
