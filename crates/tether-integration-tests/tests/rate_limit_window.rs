//! Windowed rate limiting across instances and restarts.

use tether_ratelimit::{RATE_LIMIT_COMPONENT, RateDecision};
use tether_test::TestHarness;

#[test]
fn exactly_limit_calls_fit_in_one_window() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    gov.limiter().set_limit("web_fetch", 3).unwrap();

    for _ in 0..3 {
        assert!(gov.limiter().can_call("web_fetch").unwrap());
        assert!(gov.before_call("web_fetch", "researcher").unwrap().is_allowed());
        harness.advance_secs(100);
    }
    assert!(!gov.limiter().can_call("web_fetch").unwrap());
    assert_eq!(
        gov.before_call("web_fetch", "researcher").unwrap(),
        RateDecision::Limited {
            retry_after_secs: 3300
        }
    );

    // The first call ages out a full window after it was made.
    harness.advance_secs(3300);
    assert!(gov.limiter().can_call("web_fetch").unwrap());
}

#[test]
fn configured_tool_limits_apply_to_new_sessions() {
    let harness = TestHarness::new();
    let gov = harness.session("fresh");

    let all = gov.limiter().get_status_all().unwrap();
    assert_eq!(all["deepsearch"].limit, 10);
    assert_eq!(all["file_read"].limit, 200);
    assert_eq!(gov.limiter().get_limit("unlisted").unwrap(), 100);
}

#[test]
fn operator_overrides_survive_reopen() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    gov.limiter().set_limit("deepsearch", 2).unwrap();

    let again = harness
        .reopen()
        .session(gov.session())
        .unwrap();
    assert_eq!(again.limiter().get_limit("deepsearch").unwrap(), 2);
}

#[test]
fn calls_are_shared_between_governors() {
    let harness = TestHarness::new();
    let first = harness.session("s1");
    let second = harness.session("s1");
    first.limiter().set_limit("llm_call", 2).unwrap();

    assert!(first.before_call("llm_call", "a").unwrap().is_allowed());
    assert!(second.before_call("llm_call", "b").unwrap().is_allowed());
    assert!(!first.before_call("llm_call", "a").unwrap().is_allowed());
}

#[test]
fn sessions_are_isolated() {
    let harness = TestHarness::new();
    let a = harness.session("a");
    let b = harness.session("b");
    a.limiter().set_limit("web_search", 1).unwrap();
    a.before_call("web_search", "x").unwrap();

    assert!(!a.limiter().can_call("web_search").unwrap());
    assert!(b.limiter().can_call("web_search").unwrap());
}

#[test]
fn corrupt_call_log_is_quarantined() {
    let harness = TestHarness::new();
    let gov = harness.session("s1");
    gov.before_call("web_fetch", "x").unwrap();

    let dir = harness.session_dir(RATE_LIMIT_COMPONENT, "s1");
    std::fs::write(dir.join("calls.json"), "[[[").unwrap();

    assert_eq!(gov.limiter().get_status("web_fetch").unwrap().calls_used, 0);
    assert!(
        std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("calls.json.corrupt."))
    );
    assert!(gov.before_call("web_fetch", "x").unwrap().is_allowed());
}
