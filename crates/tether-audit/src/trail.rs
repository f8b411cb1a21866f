//! The audit trail and the signed-persistence helper.

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tether_core::SessionId;
use tether_crypto::{ArtifactSigner, SignedEnvelope};
use tether_storage::{LoadOutcome, Namespace, SessionStore};
use tracing::{debug, info, warn};

use crate::error::AuditResult;
use crate::event::{AuditEvent, EventDraft};

/// Storage component name for audit logs.
pub const AUDIT_COMPONENT: &str = "audit";

/// Log file inside a session's audit namespace.
pub const EVENTS_KEY: &str = "events.jsonl";

/// Result of verifying every record in a session log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionVerification {
    /// Records read.
    pub total: usize,
    /// Records whose signature verified.
    pub verified: usize,
    /// 1-based record numbers whose signature did not verify.
    pub tampered: Vec<usize>,
    /// 1-based record numbers that were not valid JSON.
    pub unparsable: Vec<usize>,
}

impl SessionVerification {
    /// Check whether every record verified.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.tampered.is_empty() && self.unparsable.is_empty()
    }
}

/// Outcome of loading a signed state object.
#[derive(Debug)]
pub enum SignedLoad {
    /// Nothing stored under the key.
    Missing,
    /// Loaded and the signature verified.
    Verified(SignedEnvelope),
    /// Loaded but the signature is missing or wrong.
    Tampered(SignedEnvelope),
    /// The file did not parse and was moved aside.
    Corrupt {
        /// Where the file was moved, if the rename succeeded.
        quarantined: Option<PathBuf>,
        /// The parse error.
        error: String,
    },
}

/// Signed, append-only event log scoped per session.
///
/// Owns a reference to the signer rather than a process-wide instance; every
/// component that needs signing shares the same [`ArtifactSigner`].
#[derive(Debug, Clone)]
pub struct AuditTrail {
    store: SessionStore,
    signer: Arc<ArtifactSigner>,
}

impl AuditTrail {
    /// Create an audit trail over a store.
    #[must_use]
    pub fn new(store: SessionStore, signer: Arc<ArtifactSigner>) -> Self {
        Self { store, signer }
    }

    /// The signer used for every record.
    #[must_use]
    pub fn signer(&self) -> &ArtifactSigner {
        &self.signer
    }

    /// Compute the signature of an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be canonicalized.
    pub fn sign_artifact(&self, artifact: &Value) -> AuditResult<String> {
        Ok(self.signer.sign_artifact(artifact)?)
    }

    /// Attach an `_audit` block to `state` (no-op without an `artifact`).
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be canonicalized.
    pub fn attach_signature(&self, state: Value, metadata: Option<Value>) -> AuditResult<Value> {
        Ok(self.signer.attach_signature(state, metadata)?)
    }

    /// Verify the `_audit` block of `state`.
    #[must_use]
    pub fn verify_signature(&self, state: &Value) -> bool {
        self.signer.verify_signature(state)
    }

    /// Sign an event and append it to the session log.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be opened, or if signing or
    /// the append fails.
    pub fn log_event(&self, session: &SessionId, draft: EventDraft) -> AuditResult<AuditEvent> {
        let ns = self.store.namespace(AUDIT_COMPONENT, session)?;
        let event = draft.stamp(self.signer.clock().now_epoch());
        let envelope = self.signer.seal(serde_json::to_value(&event)?, None)?;
        ns.append_line(EVENTS_KEY, &envelope)?;

        debug!(
            session = %session,
            event_type = %event.event_type,
            agent = %event.agent,
            "audit event logged"
        );
        Ok(event)
    }

    /// The most recent `limit` records of a session, oldest first.
    ///
    /// Lines that fail to parse are skipped. An unknown session yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns an error only if the log exists but cannot be read.
    pub fn get_session_events(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> AuditResult<Vec<SignedEnvelope>> {
        let Some(ns) = self.store.existing(AUDIT_COMPONENT, session) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<SignedEnvelope> = ns
            .read_lines(EVENTS_KEY)?
            .iter()
            .enumerate()
            .filter_map(|(i, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(session = %session, record = i.saturating_add(1), error = %e, "skipping unparsable audit line");
                    None
                },
            })
            .collect();

        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
        Ok(records)
    }

    /// The most recent `limit` events of a session as typed values.
    ///
    /// Records whose artifact is not an [`AuditEvent`] are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the log exists but cannot be read.
    pub fn recent_events(&self, session: &SessionId, limit: usize) -> AuditResult<Vec<AuditEvent>> {
        Ok(self
            .get_session_events(session, limit)?
            .iter()
            .filter_map(|record| record.artifact_as().ok())
            .collect())
    }

    /// Verify the signature of every record in a session log.
    ///
    /// # Errors
    ///
    /// Returns an error only if the log exists but cannot be read.
    pub fn verify_session(&self, session: &SessionId) -> AuditResult<SessionVerification> {
        let mut report = SessionVerification::default();
        let Some(ns) = self.store.existing(AUDIT_COMPONENT, session) else {
            return Ok(report);
        };

        for (i, line) in ns.read_lines(EVENTS_KEY)?.iter().enumerate() {
            let record = i.saturating_add(1);
            report.total = report.total.saturating_add(1);
            match serde_json::from_str::<Value>(line) {
                Ok(state) if self.signer.verify_signature(&state) => {
                    report.verified = report.verified.saturating_add(1);
                },
                Ok(_) => {
                    warn!(session = %session, record, "audit record failed signature verification");
                    report.tampered.push(record);
                },
                Err(_) => report.unparsable.push(record),
            }
        }

        info!(
            session = %session,
            total = report.total,
            verified = report.verified,
            tampered = report.tampered.len(),
            unparsable = report.unparsable.len(),
            "audit log verified"
        );
        Ok(report)
    }

    /// Sign a value as an artifact and atomically save it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, signing or the write fails.
    pub fn sign_and_save<T: Serialize + ?Sized>(
        &self,
        ns: &Namespace,
        key: &str,
        artifact: &T,
        metadata: Option<Value>,
    ) -> AuditResult<SignedEnvelope> {
        let envelope = self
            .signer
            .seal(serde_json::to_value(artifact)?, metadata)?;
        ns.save_json(key, &envelope)?;
        Ok(envelope)
    }

    /// Load a signed state object and verify it.
    ///
    /// Files that are not JSON, or JSON without an `artifact`, are
    /// quarantined and reported as [`SignedLoad::Corrupt`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn load_signed(&self, ns: &Namespace, key: &str) -> AuditResult<SignedLoad> {
        let value: Value = match ns.load_json(key)? {
            LoadOutcome::Missing => return Ok(SignedLoad::Missing),
            LoadOutcome::Corrupt { quarantined, error } => {
                return Ok(SignedLoad::Corrupt { quarantined, error });
            },
            LoadOutcome::Loaded(value) => value,
        };

        let envelope: SignedEnvelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                let quarantined = ns.quarantine(key).ok();
                warn!(
                    path = %ns.path(key).display(),
                    error = %e,
                    "signed state has the wrong shape, quarantined"
                );
                return Ok(SignedLoad::Corrupt {
                    quarantined,
                    error: e.to_string(),
                });
            },
        };

        if self.signer.verify(&envelope) {
            Ok(SignedLoad::Verified(envelope))
        } else {
            warn!(path = %ns.path(key).display(), "signed state failed verification");
            Ok(SignedLoad::Tampered(envelope))
        }
    }
}

#[cfg(test)]
#[path = "trail_tests.rs"]
mod tests;
