//! Tag readers.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use boofar_core::{TagKey, TagMap};
use lofty::{ItemKey, Tag, TaggedFileExt};

use crate::error::TagError;

/// Source of per-file tag values.
pub trait TagReader: Send + Sync {
    /// Read every recognized tag of the file at `path` in one pass.
    fn read_tags(&self, path: &Path) -> Result<TagMap, TagError>;
}

/// Tag reader backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }

    fn map_key(key: &ItemKey) -> Option<TagKey> {
        match key {
            ItemKey::TrackArtist => Some(TagKey::Artist),
            ItemKey::AlbumTitle => Some(TagKey::Album),
            ItemKey::Genre => Some(TagKey::Genre),
            ItemKey::TrackTitle => Some(TagKey::Title),
            ItemKey::RecordingDate | ItemKey::Year => Some(TagKey::Date),
            _ => None,
        }
    }

    fn extract_from_tag(tag: &Tag) -> TagMap {
        tag.items()
            .filter_map(|item| {
                let key = Self::map_key(item.key())?;
                let text = item.value().text()?;
                Some((key, text.to_string()))
            })
            .collect()
    }
}

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagMap, TagError> {
        if !path.exists() {
            return Err(TagError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let tagged_file =
            lofty::read_from_path(path).map_err(|e| TagError::unreadable(path, e))?;

        // Untagged files are fine: every grouping key falls back.
        let tags = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .map(Self::extract_from_tag)
            .unwrap_or_default();

        Ok(tags)
    }
}

/// In-memory tag reader keyed by file name.
///
/// Lookups ignore the directory, so a file keeps its tags after being moved.
/// Names without registered tags read as untagged.
#[derive(Debug, Clone, Default)]
pub struct MemoryTagReader {
    tags: HashMap<String, TagMap>,
    unreadable: HashSet<String>,
}

impl MemoryTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tags for files named `name`.
    pub fn with_file(mut self, name: impl Into<String>, tags: TagMap) -> Self {
        self.tags.insert(name.into(), tags);
        self
    }

    /// Make reads of files named `name` fail.
    pub fn with_unreadable(mut self, name: impl Into<String>) -> Self {
        self.unreadable.insert(name.into());
        self
    }
}

impl TagReader for MemoryTagReader {
    fn read_tags(&self, path: &Path) -> Result<TagMap, TagError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.unreadable.contains(&name) {
            return Err(TagError::unreadable(path, "no usable metadata"));
        }

        Ok(self.tags.get(&name).cloned().unwrap_or_default())
    }
}
