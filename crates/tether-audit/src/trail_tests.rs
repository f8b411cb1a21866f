use super::*;
use serde_json::json;
use std::io::Write;
use tether_core::ManualClock;
use tether_crypto::AuditSecret;

use crate::event_types;

fn trail(dir: &std::path::Path) -> AuditTrail {
    let signer = ArtifactSigner::new(AuditSecret::new("test-secret").unwrap())
        .with_clock(Arc::new(ManualClock::at_epoch(1_000.0)));
    AuditTrail::new(SessionStore::new(dir), Arc::new(signer))
}

fn session() -> SessionId {
    SessionId::new("s1").unwrap()
}

fn log_n(trail: &AuditTrail, n: usize) {
    for i in 0..n {
        trail
            .log_event(
                &session(),
                EventDraft::new("decision", "planner", "plan").details(json!({ "step": i })),
            )
            .unwrap();
    }
}

fn log_path(dir: &std::path::Path) -> PathBuf {
    dir.join(AUDIT_COMPONENT).join("s1").join(EVENTS_KEY)
}

#[test]
fn test_log_event_writes_signed_line() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());

    let event = trail
        .log_event(
            &session(),
            EventDraft::new("tool_call", "researcher", "research")
                .details(json!({ "query": "rust" }))
                .tools_used(["web_search"])
                .skills_applied(["summarize"]),
        )
        .unwrap();
    assert!((event.timestamp - 1_000.0).abs() < f64::EPSILON);

    let text = std::fs::read_to_string(log_path(dir.path())).unwrap();
    assert_eq!(text.lines().count(), 1);
    let state: Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(state["artifact"]["event_type"], "tool_call");
    assert_eq!(state["artifact"]["tools_used"], json!(["web_search"]));
    assert_eq!(state["_audit"]["signer"], "TETHER_v1");
    assert!(trail.verify_signature(&state));
}

#[test]
fn test_get_session_events_returns_most_recent_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    log_n(&trail, 5);

    let records = trail.get_session_events(&session(), 2).unwrap();
    let steps: Vec<i64> = records
        .iter()
        .map(|r| r.artifact["details"]["step"].as_i64().unwrap())
        .collect();
    assert_eq!(steps, vec![3, 4]);

    assert_eq!(trail.get_session_events(&session(), 100).unwrap().len(), 5);
    assert!(trail.get_session_events(&session(), 0).unwrap().is_empty());
}

#[test]
fn test_unknown_session_is_empty_and_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    let other = SessionId::new("never-used").unwrap();

    assert!(trail.get_session_events(&other, 10).unwrap().is_empty());
    assert_eq!(trail.verify_session(&other).unwrap().total, 0);
    assert!(!dir.path().join(AUDIT_COMPONENT).exists());
}

#[test]
fn test_corrupt_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    log_n(&trail, 1);
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(log_path(dir.path()))
            .unwrap();
        file.write_all(b"{ truncated\n{\"no_artifact\": 1}\n").unwrap();
    }
    log_n(&trail, 1);

    let records = trail.get_session_events(&session(), 10).unwrap();
    assert_eq!(records.len(), 2);

    let report = trail.verify_session(&session()).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.verified, 2);
    assert_eq!(report.unparsable, vec![2]);
    assert_eq!(report.tampered, vec![3]);
    assert!(!report.is_clean());
}

#[test]
fn test_verify_session_detects_edit() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    log_n(&trail, 3);
    assert!(trail.verify_session(&session()).unwrap().is_clean());

    let path = log_path(dir.path());
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replacen("\"step\":1", "\"step\":9", 1)).unwrap();

    let report = trail.verify_session(&session()).unwrap();
    assert_eq!(report.verified, 2);
    assert_eq!(report.tampered, vec![2]);
}

#[test]
fn test_recent_events_are_typed() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    trail
        .log_event(
            &session(),
            EventDraft::new(event_types::TURN_COMPLETED, "builder", "build"),
        )
        .unwrap();

    let events = trail.recent_events(&session(), 5).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, event_types::TURN_COMPLETED);
    assert_eq!(events[0].details, json!({}));
    assert!(events[0].tools_used.is_empty());
}

#[test]
fn test_sign_and_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    let ns = Namespace::at(dir.path().join("hitl")).unwrap();

    trail
        .sign_and_save(&ns, "g1.gate.json", &json!({ "gate_id": "g1" }), None)
        .unwrap();
    match trail.load_signed(&ns, "g1.gate.json").unwrap() {
        SignedLoad::Verified(envelope) => assert_eq!(envelope.artifact["gate_id"], "g1"),
        other => panic!("expected verified, got {other:?}"),
    }

    assert!(matches!(
        trail.load_signed(&ns, "missing.gate.json").unwrap(),
        SignedLoad::Missing
    ));
}

#[test]
fn test_load_signed_flags_tampering() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    let ns = Namespace::at(dir.path().join("hitl")).unwrap();
    trail
        .sign_and_save(&ns, "g1.gate.json", &json!({ "status": "PENDING_APPROVAL" }), None)
        .unwrap();

    let path = ns.path("g1.gate.json");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace("PENDING_APPROVAL", "APPROVED")).unwrap();

    assert!(matches!(
        trail.load_signed(&ns, "g1.gate.json").unwrap(),
        SignedLoad::Tampered(_)
    ));
}

#[test]
fn test_load_signed_quarantines_wrong_shape() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    let ns = Namespace::at(dir.path().join("hitl")).unwrap();
    std::fs::write(ns.path("g1.gate.json"), r#"{"gate_id": "g1"}"#).unwrap();

    let outcome = trail.load_signed(&ns, "g1.gate.json").unwrap();
    let SignedLoad::Corrupt { quarantined, .. } = outcome else {
        panic!("expected corrupt");
    };
    assert!(quarantined.unwrap().exists());
    assert!(!ns.exists("g1.gate.json"));
}

#[test]
fn test_signatures_do_not_verify_under_another_secret() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    log_n(&trail, 2);

    let other = AuditTrail::new(
        SessionStore::new(dir.path()),
        Arc::new(ArtifactSigner::new(AuditSecret::new("other").unwrap())),
    );
    let report = other.verify_session(&session()).unwrap();
    assert_eq!(report.verified, 0);
    assert_eq!(report.tampered, vec![1, 2]);
}

#[test]
fn test_full_precision_floats_verify_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let trail = trail(dir.path());
    let scores = [0.198_136_406_386_849_82, 0.479_607_564_269_825_87];

    for score in scores {
        trail
            .log_event(
                &session(),
                EventDraft::new("decision", "critic", "review").details(json!({ "score": score })),
            )
            .unwrap();
    }
    let report = trail.verify_session(&session()).unwrap();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.verified, scores.len());

    let ns = Namespace::at(dir.path().join("hitl")).unwrap();
    trail
        .sign_and_save(&ns, "g1.gate.json", &json!({ "confidence": scores[1] }), None)
        .unwrap();
    match trail.load_signed(&ns, "g1.gate.json").unwrap() {
        SignedLoad::Verified(envelope) => {
            assert_eq!(envelope.artifact["confidence"], json!(scores[1]));
        },
        other => panic!("expected verified, got {other:?}"),
    }
}
