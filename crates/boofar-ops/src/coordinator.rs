//! Directory creation and destination claims shared by one run's workers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dashmap::DashSet;

/// Serializes directory creation and tracks claimed destinations.
///
/// One coordinator belongs to exactly one run. The creation lock covers a
/// single create-if-missing call; moves into existing directories never
/// take it.
#[derive(Debug, Default)]
pub struct DirectoryCoordinator {
    create_lock: Mutex<()>,
    claimed: DashSet<PathBuf>,
}

impl DirectoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing ancestors.
    ///
    /// Returns `true` if the directory had to be created.
    pub fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        // A panicking holder cannot leave the filesystem half-locked.
        let _guard = self
            .create_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path)?;
        tracing::debug!(path = %path.display(), "created directory");
        Ok(true)
    }

    /// Reserve `destination` for one task.
    ///
    /// Returns `false` if another task of this run already holds it.
    pub fn claim(&self, destination: &Path) -> bool {
        self.claimed.insert(destination.to_path_buf())
    }

    /// Give back a claim whose move did not happen.
    pub fn release(&self, destination: &Path) {
        self.claimed.remove(destination);
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}
