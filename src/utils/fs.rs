//! Filesystem helpers for scaffolding and removal.
//!
//! Deletion retries on `PermissionDenied` because freshly closed log files can
//! stay locked for a short while on some platforms.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ForgeError, Result};

/// Attempts made by [`safe_delete`] for each path.
pub const DELETE_ATTEMPTS: u32 = 3;

const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Create every directory in `dirs`, including missing parents.
pub fn ensure_directories<P: AsRef<Path>>(dirs: &[P]) -> Result<()> {
    for dir in dirs {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| ForgeError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Remove a file or directory tree, retrying on `PermissionDenied`.
///
/// Returns `Ok(false)` if nothing existed at `path`.
pub fn remove_path(path: &Path, attempts: u32) -> io::Result<bool> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => return Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) if e.kind() == ErrorKind::PermissionDenied && attempt < attempts => {
                debug!(
                    path = %path.display(),
                    attempt,
                    "Path is locked, retrying delete"
                );
                attempt += 1;
                thread::sleep(RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Best-effort removal of every path in `paths`.
///
/// Failures are logged and collected rather than returned as errors, so a
/// rollback can keep going after one stubborn path.
pub fn safe_delete(paths: &[PathBuf], attempts: u32) -> Vec<PathBuf> {
    let mut failed = Vec::new();
    for path in paths {
        if let Err(e) = remove_path(path, attempts) {
            warn!(path = %path.display(), error = %e, "Failed to delete path");
            failed.push(path.clone());
        }
    }
    failed
}
