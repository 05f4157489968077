//! Filesystem helpers shared across modules.
//!
//! These helpers provide consistent error context (operation + path) and
//! keep the write-then-rename dance for durable files in one place.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::{Error, Result};

/// Convert an IO error into an application error with operation + path context.
pub fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::io_path(op, path, source)
}

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all_with_op(op: &'static str, path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| io_error(op, path, e))
}

/// Ensure the parent directory of a file path exists.
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    ensure_dir_all_with_op("creating directory", parent).await
}

/// Ensure a directory exists (synchronous variant) with a custom operation label.
pub fn ensure_dir_all_sync_with_op(op: &'static str, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| io_error(op, path, e))
}

/// Sibling path used as the staging file for [`write_atomic`].
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes` so that a crash leaves either the old or the new
/// content, never a torn file.
///
/// The data is written to a sibling staging file, synced to disk, then renamed
/// over the target. The parent directory is synced afterwards so the rename
/// itself survives a power loss.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = staging_path(path);

    let mut file = tokio::fs::File::create(&staging)
        .await
        .map_err(|e| io_error("creating staging file", &staging, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| io_error("writing staging file", &staging, e))?;
    file.sync_all()
        .await
        .map_err(|e| io_error("syncing staging file", &staging, e))?;
    drop(file);

    tokio::fs::rename(&staging, path)
        .await
        .map_err(|e| io_error("replacing", path, e))?;

    sync_parent_dir(path).await
}

/// Flush directory metadata (new entries, renames) of `path`'s parent.
#[cfg(unix)]
pub async fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = tokio::fs::File::open(parent)
        .await
        .map_err(|e| io_error("opening directory", parent, e))?;
    dir.sync_all()
        .await
        .map_err(|e| io_error("syncing directory", parent, e))
}

/// Directory handles cannot be synced on this platform.
#[cfg(not(unix))]
pub async fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path_is_sibling() {
        let staging = staging_path(Path::new("data/db.json"));
        assert_eq!(staging, PathBuf::from("data/db.json.tmp"));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "second");
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_sync_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.json");
        write_atomic(&path, b"content").await.unwrap();

        sync_parent_dir(&path).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sync_parent_dir_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone").join("db.json");

        let err = sync_parent_dir(&path).await.unwrap_err();
        assert!(matches!(err, Error::IoPath { op: "opening directory", .. }));
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_missing_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("data").join("db.json");

        ensure_parent_dir(&path).await.unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_file_name() {
        ensure_parent_dir(Path::new("db.json")).await.unwrap();
    }
}
