//! Run configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tags::GroupingOrder;

/// Default interval after which the event consumer re-checks for shutdown.
pub const DEFAULT_EVENT_POLL_MS: u64 = 5_000;

/// What to do when a file already exists at the computed destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the source in place and report the file as failed.
    #[default]
    Fail,
    /// Replace the existing file.
    Overwrite,
}

/// Configuration for one reorganization run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrganizeConfig {
    /// Root of the collection to reorganize.
    pub source: PathBuf,

    /// Root of the new layout (None = reorganize in place).
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Tag keys defining directory nesting.
    #[builder(default)]
    #[serde(default)]
    pub grouping: GroupingOrder,

    /// Rename files from their title tag.
    #[builder(default = "false")]
    #[serde(default)]
    pub fix_filenames: bool,

    /// Files processed per wave (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Handling of files already present at the destination.
    #[builder(default)]
    #[serde(default)]
    pub collision: CollisionPolicy,

    /// Event consumer wake-up interval in milliseconds.
    #[builder(default = "DEFAULT_EVENT_POLL_MS")]
    #[serde(default = "default_event_poll_ms")]
    pub event_poll_ms: u64,

    /// Remove directories left empty under the source root.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub prune_empty_dirs: bool,
}

fn default_true() -> bool {
    true
}

fn default_event_poll_ms() -> u64 {
    DEFAULT_EVENT_POLL_MS
}

impl OrganizeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            None => return Err("Source path is required".to_string()),
            _ => {}
        }
        if let Some(Some(ref destination)) = self.destination {
            if destination.as_os_str().is_empty() {
                return Err("Destination path cannot be empty".to_string());
            }
        }
        if self.event_poll_ms == Some(0) {
            return Err("Event poll interval must be positive".to_string());
        }
        Ok(())
    }
}

impl OrganizeConfig {
    /// Create a new config builder.
    pub fn builder() -> OrganizeConfigBuilder {
        OrganizeConfigBuilder::default()
    }

    /// Create a config that reorganizes `source` in place with defaults.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            grouping: GroupingOrder::default(),
            fix_filenames: false,
            threads: 0,
            collision: CollisionPolicy::default(),
            event_poll_ms: DEFAULT_EVENT_POLL_MS,
            prune_empty_dirs: true,
        }
    }

    /// Root under which the new layout is built.
    pub fn destination_root(&self) -> &Path {
        self.destination.as_deref().unwrap_or(&self.source)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_ms)
    }

    /// Check values that serde or direct construction may have bypassed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "Source path cannot be empty".to_string(),
            });
        }
        if self.event_poll_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "Event poll interval must be positive".to_string(),
            });
        }
        Ok(())
    }
}
