//! Human-in-the-loop gates between an orchestrator and an operator.

use serde_json::json;
use tether_approval::{
    ApprovalError, GATE_SUFFIX, GATES_DIR, GateCheck, GateStatus, HITL_COMPONENT, action_types,
};
use tether_core::{GateId, RiskLevel};
use tether_test::{TestHarness, deploy_request, edit_json_file, test_gate_request};

fn gate_id(raw: &str) -> GateId {
    GateId::new(raw).unwrap()
}

#[test]
fn critical_action_waits_for_operator_in_another_process() {
    let harness = TestHarness::new();
    let agent = harness.session("s1");

    let first = agent.gate_action(&deploy_request("deploy-1")).unwrap();
    let second = agent.gate_action(&deploy_request("deploy-1")).unwrap();
    assert_eq!(first.gate(), second.gate());
    assert_eq!(agent.gates().pending_gates().unwrap().len(), 1);

    // The operator runs in a separate process with the same key.
    let operator = harness.reopen().session(agent.session()).unwrap();
    operator
        .gates()
        .approve_gate(&gate_id("deploy-1"), Some(json!({ "by": "ops" })))
        .unwrap();

    assert_eq!(
        agent.gate_action(&deploy_request("deploy-1")).unwrap(),
        GateCheck::Proceed {
            risk: RiskLevel::Critical
        }
    );
}

#[test]
fn approval_signed_with_another_key_does_not_count() {
    let harness = TestHarness::new();
    let agent = harness.session("s1");
    agent.gate_action(&deploy_request("deploy-1")).unwrap();

    let impostor = harness
        .reopen_with_secret("some-other-key")
        .session(agent.session())
        .unwrap();
    // Under the impostor's key the stored gate does not verify.
    assert!(matches!(
        impostor.gates().approve_gate(&gate_id("deploy-1"), None),
        Err(ApprovalError::Tampered { .. })
    ));

    let check = agent.gate_action(&deploy_request("deploy-1")).unwrap();
    assert!(!check.is_ok());
}

#[test]
fn medium_and_low_risk_never_create_gates() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");

    let plan = test_gate_request("plan", action_types::FINALIZE_PLAN, json!({}));
    let read = test_gate_request(
        "read",
        action_types::EXTERNAL_API,
        json!({ "method": "GET" }),
    );

    assert_eq!(gov.gate_action(&plan).unwrap().risk(), RiskLevel::Medium);
    assert!(gov.gate_action(&plan).unwrap().is_ok());
    assert!(gov.gate_action(&read).unwrap().is_ok());
    assert!(gov.gates().list_gates().unwrap().is_empty());
}

#[test]
fn rejected_action_is_put_to_the_operator_again() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    let request = test_gate_request(
        "rewrite",
        action_types::CODE_CHANGE,
        json!({ "files": ["src/main.rs"] }),
    );

    gov.gate_action(&request).unwrap();
    gov.gates()
        .reject_gate(&gate_id("rewrite"), "too broad", None)
        .unwrap();

    let GateCheck::Blocked { status, .. } = gov.gate_action(&request).unwrap() else {
        panic!("rejected action must not proceed");
    };
    assert_eq!(status, GateStatus::Pending);

    harness
        .reopen()
        .session(gov.session())
        .unwrap()
        .gates()
        .approve_gate(&gate_id("rewrite"), None)
        .unwrap();
    assert!(gov.gate_action(&request).unwrap().is_ok());
}

#[test]
fn hand_approved_gate_file_is_quarantined() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    gov.gate_action(&deploy_request("deploy-1")).unwrap();

    let gates_dir = harness
        .session_dir(HITL_COMPONENT, "s1")
        .join(GATES_DIR);
    let path = gates_dir.join(format!("deploy-1{GATE_SUFFIX}"));
    edit_json_file(&path, |gate| {
        gate["artifact"]["status"] = json!("APPROVED");
    });

    assert!(!gov.gates().is_gate_approved(&gate_id("deploy-1")).unwrap());
    assert!(!path.exists());
    assert!(!gov.gate_action(&deploy_request("deploy-1")).unwrap().is_ok());
}

#[test]
fn unapproved_gates_expire_with_ttl() {
    let harness = TestHarness::with_options(|o| o.gate_ttl_secs = Some(300));
    let gov = harness.session("s1");
    gov.gate_action(&deploy_request("deploy-1")).unwrap();

    harness.advance_secs(299);
    assert!(gov.gates().is_gate_pending(&gate_id("deploy-1")).unwrap());

    harness.advance_secs(1);
    let gate = gov.gates().get_gate(&gate_id("deploy-1")).unwrap().unwrap();
    assert_eq!(gate.status, GateStatus::Expired);

    let types: Vec<String> = gov
        .history_for_context(10)
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(types, vec!["gate_created", "gate_expired"]);
}

#[test]
fn missing_gate_is_distinguished_from_failure() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    let err = gov
        .gates()
        .approve_gate(&gate_id("never-created"), None)
        .unwrap_err();
    assert!(err.is_not_found());
}
