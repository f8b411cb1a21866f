//! Artifact signing and verification.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tether_core::{SharedClock, SystemClock};

use crate::canonical::canonicalize;
use crate::error::CryptoResult;
use crate::secret::AuditSecret;

/// Signer name recorded in every `_audit` block unless overridden.
pub const DEFAULT_SIGNER: &str = "TETHER_v1";

/// Key holding the signed payload in a signed state object.
pub const ARTIFACT_KEY: &str = "artifact";

/// Key holding the signature block in a signed state object.
pub const AUDIT_KEY: &str = "_audit";

/// The `_audit` block attached to a signed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Hex SHA-256 over the canonical artifact and the secret.
    pub signature: String,
    /// When the signature was made (epoch seconds).
    pub timestamp: f64,
    /// Name of the signer.
    pub signer: String,
    /// Caller metadata. Not covered by the signature.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Typed view of a `{artifact, _audit}` state object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// The signed payload.
    pub artifact: Value,
    /// Signature block, absent on unsigned envelopes.
    #[serde(rename = "_audit", default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditStamp>,
}

impl SignedEnvelope {
    /// Wrap a payload without signing it.
    #[must_use]
    pub fn unsigned(artifact: Value) -> Self {
        Self {
            artifact,
            audit: None,
        }
    }

    /// Deserialize the artifact into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact does not match `T`.
    pub fn artifact_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.artifact)
    }

    /// Convert into the raw state object.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert(ARTIFACT_KEY.to_string(), self.artifact);
        if let Some(stamp) = self.audit
            && let Ok(stamp) = serde_json::to_value(stamp)
        {
            map.insert(AUDIT_KEY.to_string(), stamp);
        }
        Value::Object(map)
    }
}

/// Signs and verifies artifacts with a shared secret.
///
/// Construct one per trust domain and pass it by reference; there is no
/// process-wide instance.
#[derive(Debug, Clone)]
pub struct ArtifactSigner {
    secret: AuditSecret,
    signer: String,
    clock: SharedClock,
}

impl ArtifactSigner {
    /// Create a signer using the system clock and [`DEFAULT_SIGNER`].
    #[must_use]
    pub fn new(secret: AuditSecret) -> Self {
        Self {
            secret,
            signer: DEFAULT_SIGNER.to_string(),
            clock: SystemClock::shared(),
        }
    }

    /// Override the signer name.
    #[must_use]
    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signer = signer.into();
        self
    }

    /// Override the clock used for stamp timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Name recorded in stamps.
    #[must_use]
    pub fn signer_name(&self) -> &str {
        &self.signer
    }

    /// Clock used for stamps.
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Compute the hex signature of an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be canonicalized.
    pub fn sign_artifact(&self, artifact: &Value) -> CryptoResult<String> {
        let canonical = canonicalize(artifact)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hasher.update(b":");
        hasher.update(self.secret.expose());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Attach an `_audit` block to a state object.
    ///
    /// Only `state.artifact` is signed. A state without an `artifact` key is
    /// returned unchanged. An existing `_audit` block is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be canonicalized.
    pub fn attach_signature(&self, state: Value, metadata: Option<Value>) -> CryptoResult<Value> {
        let mut map = match state {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        let Some(artifact) = map.get(ARTIFACT_KEY) else {
            return Ok(Value::Object(map));
        };

        let stamp = self.stamp(artifact, metadata)?;
        let stamp = serde_json::to_value(stamp)
            .map_err(|e| crate::CryptoError::Canonicalization(e.to_string()))?;
        map.insert(AUDIT_KEY.to_string(), stamp);
        Ok(Value::Object(map))
    }

    /// Verify a state object's `_audit` signature.
    ///
    /// Returns `false` if the artifact or signature is missing, or if the
    /// recomputed signature differs. Comparison is constant time.
    #[must_use]
    pub fn verify_signature(&self, state: &Value) -> bool {
        let Some(artifact) = state.get(ARTIFACT_KEY) else {
            return false;
        };
        let Some(stored) = state
            .get(AUDIT_KEY)
            .and_then(|audit| audit.get("signature"))
            .and_then(Value::as_str)
        else {
            return false;
        };
        self.matches(artifact, stored)
    }

    /// Sign a payload into a typed envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be canonicalized.
    pub fn seal(&self, artifact: Value, metadata: Option<Value>) -> CryptoResult<SignedEnvelope> {
        let stamp = self.stamp(&artifact, metadata)?;
        Ok(SignedEnvelope {
            artifact,
            audit: Some(stamp),
        })
    }

    /// Verify a typed envelope.
    #[must_use]
    pub fn verify(&self, envelope: &SignedEnvelope) -> bool {
        envelope
            .audit
            .as_ref()
            .is_some_and(|stamp| self.matches(&envelope.artifact, &stamp.signature))
    }

    fn stamp(&self, artifact: &Value, metadata: Option<Value>) -> CryptoResult<AuditStamp> {
        Ok(AuditStamp {
            signature: self.sign_artifact(artifact)?,
            timestamp: self.clock.now_epoch(),
            signer: self.signer.clone(),
            metadata,
        })
    }

    fn matches(&self, artifact: &Value, stored: &str) -> bool {
        match self.sign_artifact(artifact) {
            Ok(expected) => bool::from(expected.as_bytes().ct_eq(stored.as_bytes())),
            Err(e) => {
                tracing::debug!(error = %e, "artifact could not be canonicalized for verification");
                false
            },
        }
    }
}
