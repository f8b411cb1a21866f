//! Tether Storage - the durable store every governance component persists through.
//!
//! State is grouped into per-session namespaces
//! (`<root>/<component>/<session>/`). A [`Namespace`] offers:
//!
//! - Atomic JSON replacement (temp file + fsync + rename)
//! - Graceful loading that quarantines unparsable files as
//!   `<name>.corrupt.<unix_ts>.json` and reports [`LoadOutcome::Corrupt`]
//!   instead of failing
//! - Line-atomic JSONL appends
//! - An exclusive advisory lock ([`NamespaceLock`]) that serializes
//!   read-modify-write sequences across threads and processes
//!
//! # Example
//!
//! ```
//! use tether_core::SessionId;
//! use tether_storage::{LoadOutcome, SessionStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SessionStore::new(dir.path());
//! let ns = store.namespace("demo", &SessionId::new("s1").unwrap()).unwrap();
//!
//! ns.save_json("state.json", &vec![1, 2, 3]).unwrap();
//! let loaded: LoadOutcome<Vec<u32>> = ns.load_json("state.json").unwrap();
//! assert_eq!(loaded.into_option(), Some(vec![1, 2, 3]));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod lock;
mod namespace;

pub use error::{StorageError, StorageResult};
pub use lock::NamespaceLock;
pub use namespace::{LoadOutcome, Namespace, SessionStore};
