//! Tether Crypto - tamper evidence for persisted artifacts.
//!
//! This crate provides:
//! - Deterministic JSON canonicalization ([`canonicalize`])
//! - The signing secret ([`AuditSecret`]), zeroized on drop
//! - [`ArtifactSigner`], which signs, attaches and verifies `_audit` blocks
//!
//! # Security Model
//!
//! The signature is `sha256(canonical(artifact) || ":" || secret)` in hex.
//! It is a shared-secret MAC, not an asymmetric signature: anyone holding the
//! secret can both sign and verify, so it only provides tamper evidence
//! within a single trust domain. Signatures verify across processes only
//! when those processes share the same secret.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tether_crypto::{ArtifactSigner, AuditSecret};
//!
//! let signer = ArtifactSigner::new(AuditSecret::new("example-secret").unwrap());
//! let state = signer
//!     .attach_signature(json!({ "artifact": { "step": 1 } }), None)
//!     .unwrap();
//! assert!(signer.verify_signature(&state));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod canonical;
mod error;
mod secret;
mod signer;

pub use canonical::{canonical_bytes, canonicalize};
pub use error::{CryptoError, CryptoResult};
pub use secret::AuditSecret;
pub use signer::{
    ARTIFACT_KEY, AUDIT_KEY, ArtifactSigner, AuditStamp, DEFAULT_SIGNER, SignedEnvelope,
};
