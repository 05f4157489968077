use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::utils::fs::{ensure_dir_all_sync_with_op, io_error};
use crate::{Error, Result};

/// Exclusive lock serializing runs against one store file.
///
/// Held for the lifetime of the value; the OS releases it when the file handle
/// is dropped, including on crash.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    /// Lock file path used for a given store path.
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        store_path.with_file_name(name)
    }

    /// Acquire the run lock for `store_path` without blocking.
    ///
    /// Fails with [`Error::RunInProgress`] if another run holds it.
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let path = Self::lock_path(store_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir_all_sync_with_op("creating store directory", parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_error("opening lock file", &path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::RunInProgress(path));
        }

        debug!(path = %path.display(), "Acquired run lock");
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            RunLock::lock_path(Path::new("data/db.json")),
            PathBuf::from("data/db.json.lock")
        );
    }

    #[test]
    fn test_acquire_creates_store_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_path = dir.path().join("data").join("db.json");

        let lock = RunLock::acquire(&store_path).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn test_second_acquire_fails_until_released() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store_path = dir.path().join("db.json");

        let first = RunLock::acquire(&store_path).unwrap();
        let err = RunLock::acquire(&store_path).unwrap_err();
        assert!(matches!(err, Error::RunInProgress(ref p) if p == first.path()));

        drop(first);
        assert!(RunLock::acquire(&store_path).is_ok());
    }
}
