//! Error types for the reorganization engine.

use std::path::PathBuf;

use boofar_core::ConfigError;
use boofar_scan::ScanError;
use thiserror::Error;

/// Errors raised while reading tags from a file.
#[derive(Debug, Error)]
pub enum TagError {
    /// The file does not exist.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// The file could not be parsed as tagged audio.
    #[error("Cannot read tags from {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

impl TagError {
    pub fn unreadable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Errors raised by a run or by one file's task.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Tag reading failed.
    #[error(transparent)]
    Tags(#[from] TagError),

    /// Discovery failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A destination directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be moved.
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Something already occupies the destination.
    #[error("Destination already exists: {destination}")]
    Collision { file: PathBuf, destination: PathBuf },

    /// The source path has no usable file name.
    #[error("Invalid file name: {path}")]
    InvalidFileName { path: PathBuf },

    /// Event output could not be written.
    #[error("Failed to write events: {0}")]
    Events(#[source] std::io::Error),

    /// A worker task panicked or was cancelled.
    #[error("Task failed: {message}")]
    Task { message: String },
}

impl OrganizeError {
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    pub fn move_failed(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Move {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Whether the error is a destination collision.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }
}
