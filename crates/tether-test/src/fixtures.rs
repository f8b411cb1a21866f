//! Test fixtures for common types.

use std::path::Path;

use serde_json::{Value, json};
use tether_approval::{GateRequest, action_types};
use tether_breaker::TurnResult;
use tether_core::{GateId, SessionId};

/// Create a test session ID.
///
/// # Panics
///
/// Never; the literal is a valid id.
#[must_use]
pub fn test_session_id() -> SessionId {
    SessionId::new("test-session").expect("valid session id")
}

/// A turn that produced one artifact.
#[must_use]
pub fn productive_turn(turn: u64) -> TurnResult {
    TurnResult::new(turn).with_artifacts(1)
}

/// A turn that produced nothing.
#[must_use]
pub fn idle_turn(turn: u64) -> TurnResult {
    TurnResult::new(turn)
}

/// A turn that failed with `signature` and produced nothing.
#[must_use]
pub fn error_turn(turn: u64, signature: &str) -> TurnResult {
    TurnResult::new(turn).with_error(signature)
}

/// A gate request for an arbitrary action.
///
/// # Panics
///
/// Panics if `gate_id` is not a valid gate id.
#[must_use]
pub fn test_gate_request(gate_id: &str, action_type: &str, details: Value) -> GateRequest {
    GateRequest::new(
        GateId::new(gate_id).expect("invalid gate id"),
        action_type,
        "implement",
        format!("Test action {gate_id}"),
    )
    .details(details)
}

/// A critical-risk external `POST`.
#[must_use]
pub fn deploy_request(gate_id: &str) -> GateRequest {
    test_gate_request(
        gate_id,
        action_types::EXTERNAL_API,
        json!({ "method": "POST", "url": "https://deploy.example.invalid" }),
    )
}

/// Rewrite a JSON file in place, as a hand edit would.
///
/// # Panics
///
/// Panics if the file cannot be read, parsed or written.
pub fn edit_json_file(path: &Path, edit: impl FnOnce(&mut Value)) {
    let raw = std::fs::read_to_string(path).expect("Failed to read file");
    let mut value: Value = serde_json::from_str(&raw).expect("File is not JSON");
    edit(&mut value);
    std::fs::write(path, serde_json::to_string_pretty(&value).expect("serialize"))
        .expect("Failed to write file");
}
