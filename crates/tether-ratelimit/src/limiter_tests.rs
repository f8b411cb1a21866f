use super::*;
use chrono::Duration;
use std::path::Path;
use std::sync::Arc;
use tether_core::ManualClock;

use crate::record::default_tool_limits;

const START: f64 = 1_000_000.0;

fn limiter(dir: &Path, clock: &Arc<ManualClock>) -> RateLimiter {
    RateLimiter::open_with(
        &SessionStore::new(dir),
        &SessionId::new("s1").unwrap(),
        LimiterSettings::default(),
        clock.clone(),
    )
    .unwrap()
}

fn setup() -> (tempfile::TempDir, Arc<ManualClock>, RateLimiter) {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(START));
    let limiter = limiter(dir.path(), &clock);
    (dir, clock, limiter)
}

#[test]
fn test_limit_allows_exactly_limit_calls_per_window() {
    let (_dir, clock, limiter) = setup();
    limiter.set_limit("deepsearch", 3).unwrap();

    for _ in 0..3 {
        assert!(limiter.can_call("deepsearch").unwrap());
        limiter.record_call("deepsearch", "researcher").unwrap();
        clock.advance(Duration::seconds(60));
    }
    assert!(!limiter.can_call("deepsearch").unwrap());

    // One full window after the first call, a slot frees up.
    clock.set(tether_core::from_epoch_secs(START + 3600.0).unwrap());
    assert!(limiter.can_call("deepsearch").unwrap());
}

#[test]
fn test_endpoints_are_counted_separately() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("web_fetch", 1).unwrap();
    limiter.record_call("web_fetch", "a").unwrap();

    assert!(!limiter.can_call("web_fetch").unwrap());
    assert!(limiter.can_call("web_search").unwrap());
}

#[test]
fn test_seconds_until_available_uses_oldest_call() {
    let (_dir, clock, limiter) = setup();
    limiter.set_limit("llm_call", 2).unwrap();

    assert_eq!(limiter.seconds_until_available("llm_call").unwrap(), 0);
    limiter.record_call("llm_call", "a").unwrap();
    clock.advance(Duration::seconds(10));
    limiter.record_call("llm_call", "a").unwrap();
    clock.advance(Duration::seconds(10));

    assert_eq!(limiter.seconds_until_available("llm_call").unwrap(), 3580);

    clock.advance(Duration::milliseconds(500));
    assert_eq!(limiter.seconds_until_available("llm_call").unwrap(), 3580);
    assert_eq!(
        limiter.check("llm_call").unwrap(),
        RateDecision::Limited {
            retry_after_secs: 3580
        }
    );
}

#[test]
fn test_try_acquire_records_only_when_allowed() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("deepsearch", 1).unwrap();

    assert_eq!(
        limiter.try_acquire("deepsearch", "r").unwrap(),
        RateDecision::Allowed
    );
    let limited = limiter.try_acquire("deepsearch", "r").unwrap();
    assert!(!limited.is_allowed());
    assert_eq!(limiter.get_status("deepsearch").unwrap().calls_used, 1);
}

#[test]
fn test_limits_default_and_validation() {
    let (_dir, _clock, limiter) = setup();
    assert_eq!(limiter.get_limit("anything").unwrap(), DEFAULT_CALLS_PER_HOUR);

    limiter.set_limit("anything", 7).unwrap();
    assert_eq!(limiter.get_limit("anything").unwrap(), 7);

    assert!(matches!(
        limiter.set_limit("anything", 0),
        Err(RateLimitError::InvalidLimit { .. })
    ));
    assert_eq!(limiter.get_limit("anything").unwrap(), 7);
}

#[test]
fn test_default_tool_limits_do_not_override() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("deepsearch", 2).unwrap();

    let limiter = limiter.with_default_limits(&default_tool_limits()).unwrap();
    assert_eq!(limiter.get_limit("deepsearch").unwrap(), 2);
    assert_eq!(limiter.get_limit("web_fetch").unwrap(), 20);
    assert_eq!(limiter.get_limit("file_read").unwrap(), 200);
}

#[test]
fn test_status_reports_usage() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("web_search", 2).unwrap();
    limiter.record_call("web_search", "a").unwrap();

    let status = limiter.get_status("web_search").unwrap();
    assert_eq!(status.calls_used, 1);
    assert_eq!(status.calls_remaining, 1);
    assert_eq!(status.limit, 2);
    assert!(status.can_call);
    assert_eq!(status.seconds_until_available, 0);

    limiter.record_call("web_search", "a").unwrap();
    let status = limiter.get_status("web_search").unwrap();
    assert_eq!(status.calls_remaining, 0);
    assert!(!status.can_call);
    assert_eq!(status.seconds_until_available, 3600);
}

#[test]
fn test_status_all_covers_configured_and_called() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("configured", 5).unwrap();
    limiter.record_call("called", "a").unwrap();

    let all = limiter.get_status_all().unwrap();
    let names: Vec<&str> = all.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["called", "configured"]);
    assert_eq!(all["called"].limit, DEFAULT_CALLS_PER_HOUR);
    assert_eq!(all["configured"].calls_used, 0);
}

#[test]
fn test_reset_one_or_all() {
    let (_dir, _clock, limiter) = setup();
    limiter.set_limit("a", 1).unwrap();
    limiter.set_limit("b", 1).unwrap();
    limiter.record_call("a", "x").unwrap();
    limiter.record_call("b", "x").unwrap();

    limiter.reset(Some("a")).unwrap();
    assert!(limiter.can_call("a").unwrap());
    assert!(!limiter.can_call("b").unwrap());

    limiter.reset(None).unwrap();
    assert!(limiter.can_call("b").unwrap());
    assert_eq!(limiter.get_limit("b").unwrap(), 1);
}

#[test]
fn test_record_prunes_aged_out_calls() {
    let (dir, clock, limiter) = setup();
    limiter.record_call("a", "x").unwrap();
    clock.advance(Duration::seconds(3601));
    limiter.record_call("a", "x").unwrap();

    let path = dir
        .path()
        .join(RATE_LIMIT_COMPONENT)
        .join("s1")
        .join(CALLS_KEY);
    let log: CallLog = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(log.calls.len(), 1);
    assert_eq!(log.window_seconds, 3600);
    assert_eq!(log.calls[0].agent, "x");
}

#[test]
fn test_state_shared_across_instances() {
    let (dir, clock, first) = setup();
    first.set_limit("a", 1).unwrap();
    first.record_call("a", "x").unwrap();

    let second = limiter(dir.path(), &clock);
    assert!(!second.can_call("a").unwrap());
}

#[test]
fn test_corrupt_call_log_starts_empty() {
    let (dir, _clock, limiter) = setup();
    limiter.set_limit("a", 1).unwrap();
    let ns_dir = dir.path().join(RATE_LIMIT_COMPONENT).join("s1");
    std::fs::write(ns_dir.join(CALLS_KEY), "not json").unwrap();

    assert!(limiter.can_call("a").unwrap());
    assert!(!ns_dir.join(CALLS_KEY).exists());
    limiter.record_call("a", "x").unwrap();
    assert!(!limiter.can_call("a").unwrap());
}

#[test]
fn test_custom_window() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(START));
    let limiter = RateLimiter::open_with(
        &SessionStore::new(dir.path()),
        &SessionId::new("s1").unwrap(),
        LimiterSettings {
            window_secs: 60,
            default_limit: 1,
        },
        clock.clone(),
    )
    .unwrap();

    limiter.record_call("a", "x").unwrap();
    assert_eq!(limiter.seconds_until_available("a").unwrap(), 60);
    clock.advance(Duration::seconds(60));
    assert!(limiter.can_call("a").unwrap());
}
