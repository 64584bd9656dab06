//! Atomic writer for the generated job-definitions file.
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 hash the content and the current file, if any.
//! 3. Skip when identical.
//! 4. Write to `<path>.imagesync.tmp`, then rename over the target.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, StepFailure};

/// Outcome of writing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed or the file did not exist.
    Written { path: PathBuf },
    /// On-disk content already matches.
    Unchanged { path: PathBuf },
    /// Dry run: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    pub fn changed(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

/// Hex SHA-256 of `content`.
pub(crate) fn digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Read `path` with line endings normalised; a missing file reads as `None`.
pub(crate) fn read_existing(path: &Path) -> Result<Option<String>, StepFailure> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text.replace("\r\n", "\n"))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Atomically replace `path` with `content` unless it already matches.
pub fn atomic_write(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, StepFailure> {
    let tmp = PathBuf::from(format!("{}.imagesync.tmp", path.display()));
    write_via(path, &tmp, &content.replace("\r\n", "\n"), dry_run)
}

fn write_via(path: &Path, tmp: &Path, content: &str, dry_run: bool) -> Result<WriteResult, StepFailure> {
    let target = path.to_path_buf();
    let current = read_existing(path)?;
    if current.as_deref().map(digest) == Some(digest(content)) {
        tracing::debug!("{} is current", path.display());
        return Ok(WriteResult::Unchanged { path: target });
    }
    if dry_run {
        tracing::info!("would update {}", path.display());
        return Ok(WriteResult::WouldWrite { path: target });
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    std::fs::rename(tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(tmp);
        io_err(path, e)
    })?;

    tracing::info!("updated {}", path.display());
    Ok(WriteResult::Written { path: target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config/jobs/jobs.yaml");
        let result = atomic_write(&path, "a: 1\n", false).unwrap();
        assert_eq!(result, WriteResult::Written { path: path.clone() });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\n");
        assert!(!PathBuf::from(format!("{}.imagesync.tmp", path.display())).exists());
    }

    #[test]
    fn identical_content_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.yaml");
        std::fs::write(&path, "a: 1\r\n").unwrap();
        let result = atomic_write(&path, "a: 1\n", false).unwrap();
        assert!(!result.changed());
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.yaml");
        std::fs::write(&path, "old\n").unwrap();
        let result = atomic_write(&path, "new\n", true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\n");
    }

    #[test]
    fn directory_at_target_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.yaml");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let tmp = dir.path().join("jobs.yaml.tmp");

        let err = write_via(&path, &tmp, "a: 1\n", false).unwrap_err();
        assert!(matches!(err, StepFailure::Io { .. }));
        assert!(!tmp.exists());
    }
}
