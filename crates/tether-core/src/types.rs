//! Common types used throughout tether.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Longest identifier accepted as a path component.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Check that an identifier can be used verbatim as a single path component.
fn validate_identifier(kind: &'static str, value: &str) -> CoreResult<()> {
    let reject = |reason| {
        Err(CoreError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason,
        })
    };

    if value.is_empty() {
        return reject("must not be empty");
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return reject("longer than 128 characters");
    }
    if value == "." || value == ".." {
        return reject("reserved path component");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return reject("only ASCII letters, digits, '-', '_' and '.' are allowed");
    }
    Ok(())
}

/// Opaque identifier for a governed session.
///
/// Every component scopes its persisted state to a directory named after the
/// session, so the identifier is validated to be a single safe path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID, validating it as a path component.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if the value is empty, too long,
    /// `.`/`..`, or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        validate_identifier("session id", &value)?;
        Ok(Self(value))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Caller-chosen identifier for a human approval gate.
///
/// Gates are stored one file per id, so the same path-safety rules as
/// [`SessionId`] apply.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GateId(String);

impl GateId {
    /// Create a gate ID, validating it as a path component.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] under the same rules as
    /// [`SessionId::new`].
    pub fn new(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        validate_identifier("gate id", &value)?;
        Ok(Self(value))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GateId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GateId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GateId> for String {
    fn from(id: GateId) -> Self {
        id.0
    }
}

/// Risk level classification for actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk - proceeds without a gate
    Low,
    /// Medium risk - proceeds without a gate
    Medium,
    /// High risk - requires explicit human approval
    High,
    /// Critical risk - requires explicit human approval
    Critical,
}

impl RiskLevel {
    /// Check if this risk level is gated behind human approval.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// The persisted string token for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_accepts_simple_names() {
        for ok in ["s1", "default_session", "run-2024.10.19", "A_b-C.d"] {
            assert!(SessionId::new(ok).is_ok(), "{ok} should be accepted");
        }
    }

    #[test]
    fn test_session_id_rejects_path_escapes() {
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "with space", "ünï"] {
            assert!(SessionId::new(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(SessionId::new("x".repeat(129)).is_err());
        assert!(SessionId::new("x".repeat(128)).is_ok());
    }

    #[test]
    fn test_gate_id_serde_validates() {
        let id: GateId = serde_json::from_str("\"plan-review\"").unwrap();
        assert_eq!(id.as_str(), "plan-review");
        assert!(serde_json::from_str::<GateId>("\"../../x\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"plan-review\"");
    }

    #[test]
    fn test_risk_level_tokens() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        let parsed: RiskLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, RiskLevel::Medium);
        assert_eq!(RiskLevel::High.to_string(), "high");
    }

    #[test]
    fn test_risk_level_ordering_and_gating() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert!(!RiskLevel::Low.requires_approval());
        assert!(!RiskLevel::Medium.requires_approval());
        assert!(RiskLevel::High.requires_approval());
        assert!(RiskLevel::Critical.requires_approval());
    }
}
