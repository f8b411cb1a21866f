//! Data directory resolution.
//!
//! Every component persists under a single data root:
//!
//! ```text
//! <data_dir>/                       (TetherHome)
//! ├── keys/
//! │   └── audit.key                   (signing secret, 0600)
//! ├── circuit_breaker/<session>/      (state.json, history.json)
//! ├── audit/<session>/                (events.jsonl)
//! ├── rate_limiter/<session>/         (calls.json, limits.json)
//! └── hitl/<session>/gates/           (<gate_id>.gate.json)
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the data root.
pub const DATA_DIR_ENV: &str = "TETHER_DATA_DIR";

/// Default data directory name, relative to the working directory.
const DEFAULT_DIR_NAME: &str = "tether_data";

/// Resolved tether data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetherHome {
    root: PathBuf,
}

impl TetherHome {
    /// Resolve the data root from an optional override.
    ///
    /// Uses `override_dir` when given, otherwise `./tether_data` under the
    /// current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn resolve(override_dir: Option<&Path>) -> io::Result<Self> {
        match override_dir {
            Some(dir) => Ok(Self::from_path(dir)),
            None => Ok(Self::from_path(std::env::current_dir()?.join(DEFAULT_DIR_NAME))),
        }
    }

    /// Create from an explicit path (useful for testing).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the root and key directories exist.
    ///
    /// The key directory is restricted to the owner on Unix.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.keys_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(self.keys_dir(), std::fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys directory (`<root>/keys/`).
    #[must_use]
    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    /// Path to the persisted audit signing secret.
    #[must_use]
    pub fn audit_key_path(&self) -> PathBuf {
        self.keys_dir().join("audit.key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let home = TetherHome::resolve(Some(Path::new("/srv/tether"))).unwrap();
        assert_eq!(home.root(), Path::new("/srv/tether"));
        assert_eq!(home.audit_key_path(), Path::new("/srv/tether/keys/audit.key"));
    }

    #[test]
    fn test_default_is_under_cwd() {
        let home = TetherHome::resolve(None).unwrap();
        assert!(home.root().ends_with("tether_data"));
    }

    #[test]
    fn test_ensure_creates_key_dir() {
        let dir = tempfile::tempdir().unwrap();
        let home = TetherHome::from_path(dir.path().join("data"));
        home.ensure().unwrap();
        assert!(home.keys_dir().is_dir());
    }
}
