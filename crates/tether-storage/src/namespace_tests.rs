use super::*;
use serde::Deserialize;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

fn sample() -> Sample {
    Sample {
        name: "turns".to_string(),
        count: 3,
    }
}

fn open(dir: &Path) -> Namespace {
    SessionStore::new(dir)
        .namespace("component", &SessionId::new("s1").unwrap())
        .unwrap()
}

#[test]
fn test_namespace_layout() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());
    assert_eq!(ns.dir(), dir.path().join("component").join("s1"));
    assert!(ns.dir().is_dir());
}

#[test]
fn test_load_missing_and_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());

    let missing: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    assert!(matches!(missing, LoadOutcome::Missing));

    std::fs::write(ns.path("state.json"), "  \n").unwrap();
    let empty: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    assert!(matches!(empty, LoadOutcome::Missing));
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());

    ns.save_json("state.json", &sample()).unwrap();
    let loaded: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    assert_eq!(loaded.into_option(), Some(sample()));

    // No temp files left behind.
    assert_eq!(ns.list_keys("").unwrap(), vec!["state.json".to_string()]);
}

#[test]
fn test_corrupt_file_is_quarantined() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());
    std::fs::write(ns.path("state.json"), "{ not json").unwrap();

    let outcome: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    let LoadOutcome::Corrupt { quarantined, error } = outcome else {
        panic!("expected corrupt outcome");
    };
    assert!(!error.is_empty());

    let moved = quarantined.unwrap();
    assert!(!ns.path("state.json").exists());
    assert!(moved.exists());
    let name = moved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("state.json.corrupt."));
    assert!(name.ends_with(".json"));

    // A fresh write is usable afterwards.
    ns.save_json("state.json", &sample()).unwrap();
    let reloaded: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    assert!(matches!(reloaded, LoadOutcome::Loaded(_)));
}

#[test]
fn test_wrong_shape_counts_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());
    std::fs::write(ns.path("state.json"), "[1, 2, 3]").unwrap();

    let outcome: LoadOutcome<Sample> = ns.load_json("state.json").unwrap();
    assert!(outcome.is_corrupt());
}

#[test]
fn test_repeated_quarantine_does_not_clobber() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());

    std::fs::write(ns.path("a.json"), "x").unwrap();
    let first = ns.quarantine("a.json").unwrap();
    std::fs::write(ns.path("a.json"), "y").unwrap();
    let second = ns.quarantine("a.json").unwrap();

    assert_ne!(first, second);
    assert_eq!(std::fs::read_to_string(first).unwrap(), "x");
    assert_eq!(std::fs::read_to_string(second).unwrap(), "y");
}

#[test]
fn test_append_and_read_lines() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());

    assert!(ns.read_lines("events.jsonl").unwrap().is_empty());
    for i in 0..3 {
        ns.append_line(
            "events.jsonl",
            &Sample {
                name: format!("e{i}"),
                count: i,
            },
        )
        .unwrap();
    }

    let lines = ns.read_lines("events.jsonl").unwrap();
    assert_eq!(lines.len(), 3);
    let last: Sample = serde_json::from_str(&lines[2]).unwrap();
    assert_eq!(last.name, "e2");
}

#[test]
fn test_concurrent_appends_keep_whole_lines() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());

    std::thread::scope(|s| {
        for t in 0..4 {
            let ns = ns.clone();
            s.spawn(move || {
                for i in 0..25 {
                    ns.append_line(
                        "events.jsonl",
                        &Sample {
                            name: format!("thread-{t}-{}", "x".repeat(200)),
                            count: i,
                        },
                    )
                    .unwrap();
                }
            });
        }
    });

    let lines = ns.read_lines("events.jsonl").unwrap();
    assert_eq!(lines.len(), 100);
    for line in lines {
        serde_json::from_str::<Sample>(&line).unwrap();
    }
}

#[test]
fn test_lock_serializes_read_modify_write() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());
    ns.save_json("counter.json", &0u32).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let ns = ns.clone();
            s.spawn(move || {
                for _ in 0..10 {
                    let _guard = ns.lock().unwrap();
                    let current: u32 = ns
                        .load_json("counter.json")
                        .unwrap()
                        .into_option()
                        .unwrap_or(0);
                    ns.save_json("counter.json", &(current + 1)).unwrap();
                }
            });
        }
    });

    let total: u32 = ns.load_json("counter.json").unwrap().into_option().unwrap();
    assert_eq!(total, 40);
}

#[test]
fn test_remove_and_list_keys() {
    let dir = tempfile::tempdir().unwrap();
    let ns = open(dir.path());
    let gates = ns.child("gates").unwrap();

    gates.save_json("b.gate.json", &sample()).unwrap();
    gates.save_json("a.gate.json", &sample()).unwrap();
    std::fs::write(gates.path("notes.txt"), "ignored").unwrap();
    let _guard = gates.lock().unwrap();

    assert_eq!(
        gates.list_keys(".gate.json").unwrap(),
        vec!["a.gate.json".to_string(), "b.gate.json".to_string()]
    );
    assert!(gates.remove("a.gate.json").unwrap());
    assert!(!gates.remove("a.gate.json").unwrap());
}

#[test]
fn test_sessions_listing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    assert!(store.sessions("audit").unwrap().is_empty());

    store.namespace("audit", &SessionId::new("beta").unwrap()).unwrap();
    store.namespace("audit", &SessionId::new("alpha").unwrap()).unwrap();
    std::fs::create_dir_all(dir.path().join("audit").join("not valid")).unwrap();

    let sessions: Vec<String> = store
        .sessions("audit")
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(sessions, vec!["alpha".to_string(), "beta".to_string()]);
}

#[test]
fn test_existing_does_not_create() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let session = SessionId::new("s1").unwrap();

    assert!(store.existing("audit", &session).is_none());
    assert!(!dir.path().join("audit").exists());

    store.namespace("audit", &session).unwrap();
    assert!(store.existing("audit", &session).is_some());
}
