use super::*;
use chrono::Duration;
use std::sync::Arc;
use tether_approval::{GateStatus, action_types};
use tether_breaker::CircuitState;
use tether_core::{GateId, ManualClock, TetherHome};
use tether_crypto::AuditSecret;

use crate::governance::{Governance, GovernanceOptions};

struct Fixture {
    _dir: tempfile::TempDir,
    clock: Arc<ManualClock>,
    governance: Governance,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(10_000.0));
    let options = GovernanceOptions {
        clock: clock.clone(),
        ..GovernanceOptions::default()
    };
    let governance = Governance::new(
        TetherHome::from_path(dir.path()),
        AuditSecret::new("governor-secret").unwrap(),
        options,
    );
    Fixture {
        _dir: dir,
        clock,
        governance,
    }
}

fn governor(fx: &Fixture) -> SessionGovernor {
    fx.governance
        .session(&SessionId::new("run-1").unwrap())
        .unwrap()
}

#[test]
fn test_stalled_loop_is_halted() {
    let fx = fixture();
    let gov = governor(&fx);

    for turn in 1..=2 {
        assert!(gov.begin_turn(None).unwrap().is_proceed());
        assert!(
            gov.finish_turn(&TurnResult::new(turn), None, "coder", "implement")
                .unwrap()
                .is_proceed()
        );
    }
    assert_eq!(gov.breaker().state().unwrap(), CircuitState::HalfOpen);

    let decision = gov
        .finish_turn(&TurnResult::new(3), None, "coder", "implement")
        .unwrap();
    assert_eq!(
        decision,
        TurnDecision::Halted {
            reason: "No recovery after 3 turns".into()
        }
    );
    assert!(!gov.begin_turn(None).unwrap().is_proceed());
}

#[test]
fn test_context_change_resumes_halted_loop() {
    let fx = fixture();
    let gov = governor(&fx);
    for turn in 1..=3 {
        gov.finish_turn(&TurnResult::new(turn), Some("plan v1"), "coder", "implement")
            .unwrap();
    }

    assert!(!gov.begin_turn(Some("plan v1")).unwrap().is_proceed());
    assert!(gov.begin_turn(Some("plan v2")).unwrap().is_proceed());
    assert_eq!(gov.breaker().state().unwrap(), CircuitState::Closed);
}

#[test]
fn test_finish_turn_logs_signed_event() {
    let fx = fixture();
    let gov = governor(&fx);
    gov.finish_turn_with(
        &TurnResult::new(1).with_artifacts(2),
        None,
        EventDraft::new(event_types::TURN_COMPLETED, "researcher", "research")
            .tools_used(["web_search"]),
    )
    .unwrap();

    let history = gov.history_for_context(10).unwrap();
    assert_eq!(history.len(), 1);
    let event = &history[0];
    assert_eq!(event.event_type, "turn_completed");
    assert_eq!(event.tools_used, vec!["web_search"]);
    assert_eq!(event.details["turn"]["artifacts_produced"], 2);
    assert_eq!(event.details["circuit_state"], "CLOSED");
    assert!(gov.audit().verify_session(gov.session()).unwrap().is_clean());
}

#[test]
fn test_before_call_applies_configured_limits() {
    let fx = fixture();
    let gov = governor(&fx);

    for _ in 0..10 {
        assert!(gov.before_call("deepsearch", "researcher").unwrap().is_allowed());
    }
    let limited = gov.before_call("deepsearch", "researcher").unwrap();
    assert!(matches!(limited, RateDecision::Limited { retry_after_secs: 3600 }));

    fx.clock.advance(Duration::seconds(3600));
    assert!(gov.before_call("deepsearch", "researcher").unwrap().is_allowed());
}

#[test]
fn test_gate_action_round_trip() {
    let fx = fixture();
    let gov = governor(&fx);
    let id = GateId::new("edit-config").unwrap();
    let request = GateRequest::new(
        id.clone(),
        action_types::CODE_CHANGE,
        "implement",
        "Edit settings",
    )
    .details(serde_json::json!({ "files": ["config/app.toml"] }));

    let check = gov.gate_action(&request).unwrap();
    assert_eq!(check.gate().unwrap().status, GateStatus::Pending);

    // A second governor for the same session (e.g. the operator CLI) approves.
    governor(&fx).gates().approve_gate(&id, None).unwrap();
    assert!(gov.gate_action(&request).unwrap().is_ok());
}

#[test]
fn test_known_sessions() {
    let fx = fixture();
    governor(&fx);
    fx.governance
        .session(&SessionId::new("run-2").unwrap())
        .unwrap();

    let sessions: Vec<String> = fx
        .governance
        .known_sessions()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(sessions, vec!["run-1", "run-2"]);
}
