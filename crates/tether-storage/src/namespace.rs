//! Session-scoped storage namespaces.

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tether_core::SessionId;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::lock::{LOCK_FILE_NAME, NamespaceLock};

/// Root of all persisted session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the given directory.
    ///
    /// Nothing is created on disk until a namespace is opened.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open (creating if needed) the namespace `<root>/<component>/<session>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn namespace(&self, component: &str, session: &SessionId) -> StorageResult<Namespace> {
        Namespace::at(self.root.join(component).join(session.as_str()))
    }

    /// Open the namespace for `component` and `session` only if it already
    /// exists on disk.
    ///
    /// Read paths use this so that querying an unknown session leaves no
    /// directories behind.
    #[must_use]
    pub fn existing(&self, component: &str, session: &SessionId) -> Option<Namespace> {
        let dir = self.root.join(component).join(session.as_str());
        dir.is_dir().then_some(Namespace { dir })
    }

    /// List the sessions that have a namespace for `component`.
    ///
    /// Directory names that are not valid session ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the component directory exists but cannot be read.
    pub fn sessions(&self, component: &str) -> StorageResult<Vec<SessionId>> {
        let dir = self.root.join(component);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&dir, e)),
        };

        let mut sessions: Vec<SessionId> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| SessionId::new(e.file_name().to_string_lossy().into_owned()).ok())
            .collect();
        sessions.sort();
        Ok(sessions)
    }
}

/// Outcome of a graceful JSON load.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// The file does not exist or is empty.
    Missing,
    /// The file parsed successfully.
    Loaded(T),
    /// The file failed to parse and was moved aside.
    Corrupt {
        /// Where the file was moved, if the rename succeeded.
        quarantined: Option<PathBuf>,
        /// The parse error.
        error: String,
    },
}

impl<T> LoadOutcome<T> {
    /// The loaded value, treating missing and corrupt files alike.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Missing | Self::Corrupt { .. } => None,
        }
    }

    /// Check if the file was found corrupt.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// A directory holding one session's state for one component.
#[derive(Debug, Clone)]
pub struct Namespace {
    dir: PathBuf,
}

impl Namespace {
    /// Open (creating if needed) a namespace at an explicit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn at(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Open a nested namespace (e.g. `gates/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn child(&self, name: &str) -> StorageResult<Self> {
        Self::at(self.dir.join(name))
    }

    /// Directory backing this namespace.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path for a key.
    #[must_use]
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Check whether a key exists.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Acquire the namespace's exclusive advisory lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn lock(&self) -> StorageResult<NamespaceLock> {
        NamespaceLock::acquire(&self.dir)
    }

    /// Load JSON, quarantining the file if it does not parse.
    ///
    /// An empty (or whitespace-only) file counts as missing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<LoadOutcome<T>> {
        let path = self.path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Ok(self.corrupt(key, e.to_string()));
            },
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        if text.trim().is_empty() {
            return Ok(LoadOutcome::Missing);
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(LoadOutcome::Loaded(value)),
            Err(e) => Ok(self.corrupt(key, e.to_string())),
        }
    }

    fn corrupt<T>(&self, key: &str, error: String) -> LoadOutcome<T> {
        let quarantined = match self.quarantine(key) {
            Ok(moved) => {
                warn!(
                    path = %self.path(key).display(),
                    preserved = %moved.display(),
                    error = %error,
                    "corrupt state file quarantined"
                );
                Some(moved)
            },
            Err(e) => {
                warn!(
                    path = %self.path(key).display(),
                    error = %e,
                    "corrupt state file could not be quarantined"
                );
                None
            },
        };
        LoadOutcome::Corrupt { quarantined, error }
    }

    /// Move a file aside as `<name>.corrupt.<unix_ts>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub fn quarantine(&self, key: &str) -> StorageResult<PathBuf> {
        let path = self.path(key);
        let stamp = chrono::Utc::now().timestamp();
        let mut target = self.path(&format!("{key}.corrupt.{stamp}.json"));
        let mut attempt: u32 = 0;
        while target.exists() {
            attempt = attempt.saturating_add(1);
            target = self.path(&format!("{key}.corrupt.{stamp}-{attempt}.json"));
        }
        std::fs::rename(&path, &target).map_err(|e| StorageError::io(&path, e))?;
        Ok(target)
    }

    /// Atomically replace a key with pretty-printed JSON.
    ///
    /// Writes to a temporary file in the same directory, syncs it, then
    /// renames it over the destination, so readers observe either the old or
    /// the new content.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let path = self.path(key);
        let mut body =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serialization {
                path: path.clone(),
                message: e.to_string(),
            })?;
        body.push(b'\n');

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| StorageError::io(&path, e))?;
        tmp.write_all(&body).map_err(|e| StorageError::io(&path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(&path, e))?;
        tmp.persist(&path)
            .map_err(|e| StorageError::io(&path, e.error))?;

        debug!(path = %path.display(), bytes = body.len(), "saved state");
        Ok(())
    }

    /// Append one compact JSON value as a single line.
    ///
    /// The line is written with one `write_all` while holding an exclusive
    /// lock on the log file, so concurrent readers never observe a partial
    /// line from this writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, locking or the write fails.
    pub fn append_line<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let path = self.path(key);
        let mut line = serde_json::to_vec(value).map_err(|e| StorageError::Serialization {
            path: path.clone(),
            message: e.to_string(),
        })?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.lock_exclusive().map_err(|e| StorageError::Lock {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let written = file.write_all(&line).and_then(|()| file.sync_data());
        let _ = <std::fs::File as FileExt>::unlock(&file);
        written.map_err(|e| StorageError::io(&path, e))
    }

    /// Read every line of a key.
    ///
    /// Missing files yield no lines. Bytes that are not valid UTF-8 are
    /// replaced, which leaves such lines unparsable for the caller to skip.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read_lines(&self, key: &str) -> StorageResult<Vec<String>> {
        let path = self.path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        Ok(bytes
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }

    /// Delete a key.
    ///
    /// Returns `true` if a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self, key: &str) -> StorageResult<bool> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    /// List keys whose file name ends with `suffix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list_keys(&self, suffix: &str) -> StorageResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != LOCK_FILE_NAME && name.ends_with(suffix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
