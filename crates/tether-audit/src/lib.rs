//! Tether Audit - signed append-only audit trail.
//!
//! This crate provides:
//! - Signed workflow events appended one line at a time to
//!   `audit/<session>/events.jsonl`
//! - Restartable reads that skip corrupt lines
//! - Whole-log verification ([`AuditTrail::verify_session`])
//! - A generic sign-and-save helper other components persist through
//!
//! # Security Model
//!
//! Every record is a `{artifact, _audit}` object whose signature covers the
//! artifact only. Editing any artifact field after the fact makes
//! verification fail. Records are independent: deleting a whole line is not
//! detected.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_audit::{AuditTrail, EventDraft};
//! use tether_core::SessionId;
//! use tether_crypto::{ArtifactSigner, AuditSecret};
//! use tether_storage::SessionStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let signer = ArtifactSigner::new(AuditSecret::new("example").unwrap());
//! let trail = AuditTrail::new(SessionStore::new(dir.path()), Arc::new(signer));
//! let session = SessionId::new("s1").unwrap();
//!
//! trail
//!     .log_event(&session, EventDraft::new("decision", "planner", "plan"))
//!     .unwrap();
//!
//! let report = trail.verify_session(&session).unwrap();
//! assert!(report.is_clean());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod event;
mod trail;

pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, EventDraft, event_types};
pub use trail::{AUDIT_COMPONENT, AuditTrail, EVENTS_KEY, SessionVerification, SignedLoad};
