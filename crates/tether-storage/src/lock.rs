//! Advisory per-namespace locking.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// Name of the lock file inside each namespace directory.
pub(crate) const LOCK_FILE_NAME: &str = ".lock";

/// RAII guard holding an exclusive advisory lock on a namespace.
///
/// The lock is released when the guard is dropped. The lock file itself is
/// left in place so that waiters never race on a recreated inode.
///
/// Locks are taken per open file description, so two guards for the same
/// namespace exclude each other even inside one process. Never acquire a
/// second guard for a namespace while already holding one on the same thread.
#[derive(Debug)]
pub struct NamespaceLock {
    file: File,
    path: PathBuf,
}

impl NamespaceLock {
    pub(crate) fn acquire(dir: &Path) -> StorageResult<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .read(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        file.lock_exclusive().map_err(|e| StorageError::Lock {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tracing::trace!(path = %path.display(), "acquired namespace lock");
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        let _ = <File as FileExt>::unlock(&self.file);
    }
}
