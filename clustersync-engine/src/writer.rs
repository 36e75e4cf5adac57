//! Atomic file writer.
//!
//! ## `apply` — write protocol
//!
//! 1. Read current bytes (absent file counts as "no content").
//! 2. Byte-compare against the rendered target content.
//! 3. Identical → re-apply mode `0770` (permission drift must not persist)
//!    and return `Unchanged`.
//! 4. Different → write to a `.clustersync.tmp` sibling, chmod, rename over
//!    the target (atomic on POSIX). Never truncate the live file in place —
//!    a crash mid-write must not leave a half-written inventory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, EngineError};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was left untouched — content already matched.
    Unchanged { path: PathBuf },
    /// Dry-run mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
    /// File was deleted (stray entity no longer desired).
    Removed { path: PathBuf },
    /// Dry-run mode: the file *would* have been deleted.
    WouldRemove { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path }
            | WriteResult::Removed { path }
            | WriteResult::WouldRemove { path } => path,
        }
    }

    /// Whether this outcome counts as an on-disk (or would-be) change.
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

/// Atomically bring `path` to `content`.
///
/// Returns `Written` iff the file was absent or its content differed
/// byte-for-byte. Dry-run never touches the filesystem.
pub fn apply(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, EngineError> {
    let current = read_current(path)?;
    if current.as_deref() == Some(content.as_bytes()) {
        if !dry_run {
            set_managed_permissions(path)?;
        }
        tracing::debug!("unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.clustersync.tmp", path.display()));
    replace_file(path, &tmp, content)?;

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Write `content` to `tmp`, then rename it over `path`. The tmp file is
/// removed again if the rename fails, so no sibling litter survives.
fn replace_file(path: &Path, tmp: &Path, content: &str) -> Result<(), EngineError> {
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    set_managed_permissions(tmp)?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Delete `path` if it exists. Removing an absent file is a no-op, not an
/// error.
pub fn remove(path: &Path, dry_run: bool) -> Result<Option<WriteResult>, EngineError> {
    if !path.exists() {
        return Ok(None);
    }
    if dry_run {
        tracing::info!("[dry-run] would delete: {}", path.display());
        return Ok(Some(WriteResult::WouldRemove {
            path: path.to_path_buf(),
        }));
    }
    std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
    tracing::info!("deleted: {}", path.display());
    Ok(Some(WriteResult::Removed {
        path: path.to_path_buf(),
    }))
}

fn read_current(path: &Path) -> Result<Option<Vec<u8>>, EngineError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Managed files are owner/group read-write-execute, no world access.
#[cfg(unix)]
fn set_managed_permissions(path: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o770))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_managed_permissions(_path: &Path) -> Result<(), EngineError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w1.yaml");
        let result = apply(&path, "volumes: []\n", false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "volumes: []\n");
    }

    #[test]
    fn identical_content_returns_unchanged_and_keeps_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w1.yaml");
        apply(&path, "volumes: []\n", false).unwrap();
        let mtime_1 = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let result = apply(&path, "volumes: []\n", false).unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));

        let mtime_2 = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime_1, mtime_2, "no-op must not rewrite the file");
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w1.yaml");
        apply(&path, "v1\n", false).unwrap();
        let result = apply(&path, "v2\n", false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2\n");
    }

    #[test]
    fn dry_run_does_not_create_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.yaml");
        let result = apply(&path, "content", true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.yaml");
        apply(&path, "data", false).unwrap();
        let tmp_path = PathBuf::from(format!("{}.clustersync.tmp", path.display()));
        assert!(!tmp_path.exists());
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("host_vars").join("w1.yaml");
        apply(&path, "content", false).unwrap();
        assert!(path.exists());
    }

    #[test]
    #[cfg(unix)]
    fn managed_permissions_applied_on_every_write() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w1.yaml");
        apply(&path, "content\n", false).unwrap();
        assert_eq!(
            fs::metadata(&path).unwrap().permissions().mode() & 0o777,
            0o770
        );

        // Drift the bits, then confirm a no-op write restores them.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        apply(&path, "content\n", false).unwrap();
        assert_eq!(
            fs::metadata(&path).unwrap().permissions().mode() & 0o777,
            0o770
        );
    }

    #[test]
    fn remove_absent_file_is_noop() {
        let tmp = TempDir::new().unwrap();
        let result = remove(&tmp.path().join("missing.yaml"), false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn remove_existing_file_reports_removed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stale.yaml");
        fs::write(&path, "old").unwrap();
        let result = remove(&path, false).unwrap();
        assert!(matches!(result, Some(WriteResult::Removed { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn dry_run_remove_leaves_file_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stale.yaml");
        fs::write(&path, "old").unwrap();
        let result = remove(&path, true).unwrap();
        assert!(matches!(result, Some(WriteResult::WouldRemove { .. })));
        assert!(path.exists());
    }

    #[test]
    fn rename_failure_leaves_target_and_cleans_tmp() {
        let root = TempDir::new().unwrap();
        // A non-empty directory at the target path: the tmp write succeeds,
        // the rename itself fails (EISDIR), regardless of privileges.
        let target = root.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.yaml"), "keep").unwrap();
        let tmp_path = root.path().join("occupied.clustersync.tmp");

        replace_file(&target, &tmp_path, "new content")
            .expect_err("rename onto a non-empty directory should fail");

        assert!(target.join("keep.yaml").exists(), "target must be intact");
        assert!(!tmp_path.exists(), ".clustersync.tmp must be cleaned up");
    }
}
