//! Run summary.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::cleanup::CleanupReport;
use crate::error::OrganizeError;
use crate::move_op::MoveOutcome;

/// Broad cause of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Tags could not be read.
    Metadata,
    /// Directory creation or the move itself failed.
    Filesystem,
    /// The destination was already occupied.
    Collision,
    /// The worker task died.
    Task,
}

/// One file that was left where it was.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn from_error(path: PathBuf, error: &OrganizeError) -> Self {
        let kind = match error {
            OrganizeError::Tags(_) => FailureKind::Metadata,
            OrganizeError::Collision { .. } => FailureKind::Collision,
            OrganizeError::Task { .. } => FailureKind::Task,
            _ => FailureKind::Filesystem,
        };
        Self {
            path,
            kind,
            message: error.to_string(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    /// Music files found by discovery.
    pub discovered: usize,
    pub moved: usize,
    /// Files already at their computed destination.
    pub in_place: usize,
    pub bytes_moved: u64,
    pub waves: usize,
    pub wave_size: usize,
    pub events_delivered: u64,
    /// Events lost because the event writer failed.
    pub events_dropped: u64,
    /// Why event output stopped early, if it did.
    pub event_error: Option<String>,
    pub failures: Vec<FileFailure>,
    /// Unreadable entries met during discovery.
    pub scan_warnings: Vec<String>,
    /// Pruning of emptied directories under the source root.
    ///
    /// The source root itself is always kept, even when the run leaves it
    /// empty (e.g. with a separate destination). `None` when pruning was
    /// disabled or its task died.
    pub cleanup: Option<CleanupReport>,
    pub elapsed: Duration,
}

impl OrganizeReport {
    /// Fold one task's result into the report.
    pub fn record(&mut self, source: PathBuf, result: Result<MoveOutcome, OrganizeError>) {
        match result {
            Ok(MoveOutcome::Moved { bytes, .. }) => {
                self.moved += 1;
                self.bytes_moved += bytes;
            }
            Ok(MoveOutcome::InPlace { .. }) => self.in_place += 1,
            Err(err) => self.failures.push(FileFailure::from_error(source, &err)),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Check if every discovered file ended up in place.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Moved {} of {} files in {} waves",
            self.moved, self.discovered, self.waves
        );
        if self.in_place > 0 {
            summary.push_str(&format!(", {} already in place", self.in_place));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        if self.events_dropped > 0 {
            summary.push_str(&format!(", {} events not printed", self.events_dropped));
        }
        if let Some(cleanup) = &self.cleanup {
            if !cleanup.removed.is_empty() {
                summary.push_str(&format!(
                    ", removed {} empty directories",
                    cleanup.removed.len()
                ));
            }
        }
        summary
    }
}
