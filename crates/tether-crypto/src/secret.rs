//! Signing secret handling.

use rand::RngCore;
use std::fmt;
use std::io::Write;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

/// Number of random bytes in a generated secret.
const GENERATED_SECRET_BYTES: usize = 32;

/// Shared secret used to sign artifacts.
///
/// The secret material is zeroized on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuditSecret {
    bytes: Vec<u8>,
}

impl AuditSecret {
    /// Wrap an explicit secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSecret`] if the secret is empty or only
    /// whitespace.
    pub fn new(secret: impl Into<String>) -> CryptoResult<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.trim().is_empty() {
            return Err(CryptoError::InvalidSecret("secret must not be empty".into()));
        }
        Ok(Self {
            bytes: secret.as_bytes().to_vec(),
        })
    }

    /// Generate a fresh random secret (32 bytes, hex encoded).
    #[must_use]
    pub fn generate() -> Self {
        let mut raw = Zeroizing::new([0u8; GENERATED_SECRET_BYTES]);
        rand::rngs::OsRng.fill_bytes(raw.as_mut());
        Self {
            bytes: hex::encode(raw.as_ref()).into_bytes(),
        }
    }

    /// Load the secret stored at `path`, generating and storing one if the
    /// file does not exist.
    ///
    /// New key files are created with owner-only permissions on Unix.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFile`] if the file cannot be read or written,
    /// or [`CryptoError::InvalidSecret`] if it exists but is empty.
    pub fn load_or_create(path: &Path) -> CryptoResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let contents = Zeroizing::new(contents);
                Self::new(contents.trim()).map_err(|_| {
                    CryptoError::InvalidSecret(format!("key file {} is empty", path.display()))
                })
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let secret = Self::generate();
                secret.write_key_file(path)?;
                tracing::info!(path = %path.display(), "generated new audit signing secret");
                Ok(secret)
            },
            Err(e) => Err(CryptoError::KeyFile(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn write_key_file(&self, path: &Path) -> CryptoResult<()> {
        let key_err = |e: std::io::Error| {
            CryptoError::KeyFile(format!("failed to write {}: {e}", path.display()))
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(key_err)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(key_err)?;
        file.write_all(&self.bytes).map_err(key_err)?;
        file.sync_all().map_err(key_err)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for AuditSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuditSecret(<redacted>)")
    }
}
