//! Tether Approval - human-in-the-loop gates for risk-bearing actions.
//!
//! An action is first scored by a [`RiskPolicy`]. Low and medium risk
//! proceed; high and critical risk are parked behind a gate until a human
//! approves it. Gates are stored as signed artifacts in
//! `hitl/<session>/gates/<gate_id>.gate.json`, and every creation or
//! resolution is also written to the audit trail.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tether_approval::{GateManager, GateRequest, action_types};
//! use tether_audit::AuditTrail;
//! use tether_core::{GateId, SessionId};
//! use tether_crypto::{ArtifactSigner, AuditSecret};
//! use tether_storage::SessionStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SessionStore::new(dir.path());
//! let signer = ArtifactSigner::new(AuditSecret::new("example").unwrap());
//! let audit = AuditTrail::new(store.clone(), Arc::new(signer));
//! let session = SessionId::new("s1").unwrap();
//! let gates = GateManager::open(&store, &session, audit).unwrap();
//!
//! let id = GateId::new("deploy").unwrap();
//! let request = GateRequest::new(id.clone(), action_types::EXTERNAL_API, "implement", "Deploy")
//!     .details(json!({ "method": "POST" }));
//!
//! assert!(!gates.check_and_gate(&request).unwrap().is_ok());
//! gates.approve_gate(&id, None).unwrap();
//! assert!(gates.check_and_gate(&request).unwrap().is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod gate;
mod manager;
mod risk;

pub use error::{ApprovalError, ApprovalResult};
pub use gate::{Gate, GateCheck, GateRequest, GateStatus, NewGate};
pub use manager::{GATE_SUFFIX, GATES_DIR, GateManager, HITL_COMPONENT};
pub use risk::{DefaultRiskPolicy, RiskPolicy, action_types};
