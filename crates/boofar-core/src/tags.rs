//! Tag keys, fallback labels and tag-derived path segments.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::ConfigError;

/// Label used for keys that have no dedicated fallback text.
pub const GENERIC_FALLBACK: &str = "Unknown";

/// Replacement for path separators found in tag-derived text.
pub const SEPARATOR_REPLACEMENT: char = ',';

/// Maximum number of keys in a grouping order.
pub const MAX_GROUPING_DEPTH: usize = 3;

/// A metadata key understood by the organizer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagKey {
    Artist,
    Album,
    Genre,
    Date,
    Title,
}

impl TagKey {
    /// Label substituted when a file carries no value for this key.
    pub fn fallback_label(self) -> &'static str {
        match self {
            Self::Artist => "Unknown artist",
            Self::Album => "Unknown album",
            Self::Genre => "Unknown genre",
            Self::Date | Self::Title => GENERIC_FALLBACK,
        }
    }

    /// Whether the key may appear in a grouping order.
    pub fn is_groupable(self) -> bool {
        matches!(self, Self::Artist | Self::Album | Self::Genre)
    }
}

/// Ordered tag values read from one file.
///
/// Keys keep the order in which the reader first saw them, and values
/// keep file order within a key. Only the first value is used for layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMap {
    entries: IndexMap<TagKey, Vec<String>>,
}

impl TagMap {
    /// Create an empty tag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `key`.
    pub fn insert(&mut self, key: TagKey, value: impl Into<String>) {
        self.entries.entry(key).or_default().push(value.into());
    }

    /// Builder-style variant of [`TagMap::insert`].
    pub fn with(mut self, key: TagKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// All values for `key`, in file order.
    pub fn values(&self, key: TagKey) -> &[String] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first value for `key`, if any.
    pub fn first(&self, key: TagKey) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(TagKey, String)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (TagKey, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Ordered list of tag keys defining directory nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TagKey>", into = "Vec<TagKey>")]
pub struct GroupingOrder(Vec<TagKey>);

impl GroupingOrder {
    /// Validate and build a grouping order.
    ///
    /// Requires 1 to [`MAX_GROUPING_DEPTH`] distinct groupable keys.
    pub fn new(keys: impl IntoIterator<Item = TagKey>) -> Result<Self, ConfigError> {
        let keys: Vec<TagKey> = keys.into_iter().collect();

        if keys.is_empty() {
            return Err(ConfigError::EmptyGrouping);
        }
        if keys.len() > MAX_GROUPING_DEPTH {
            return Err(ConfigError::GroupingTooDeep { count: keys.len() });
        }
        for (i, key) in keys.iter().enumerate() {
            if !key.is_groupable() {
                return Err(ConfigError::NotGroupable { key: *key });
            }
            if keys[..i].contains(key) {
                return Err(ConfigError::DuplicateGroupKey { key: *key });
            }
        }

        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[TagKey] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = TagKey> + '_ {
        self.0.iter().copied()
    }

    /// Number of directory levels this order produces.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Default for GroupingOrder {
    fn default() -> Self {
        Self(vec![TagKey::Genre, TagKey::Artist, TagKey::Album])
    }
}

impl TryFrom<Vec<TagKey>> for GroupingOrder {
    type Error = ConfigError;

    fn try_from(keys: Vec<TagKey>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<GroupingOrder> for Vec<TagKey> {
    fn from(order: GroupingOrder) -> Self {
        order.0
    }
}

impl fmt::Display for GroupingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|k| k.as_ref()).collect();
        write!(f, "{}", names.join(" > "))
    }
}

/// One path segment per grouping key, derived from a single tag read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSnapshot {
    segments: IndexMap<TagKey, String>,
}

impl TagSnapshot {
    /// Capture the segment for every key of `order` from `tags`.
    pub fn capture(tags: &TagMap, order: &GroupingOrder) -> Self {
        let segments = order
            .iter()
            .map(|key| (key, tag_segment(tags.first(key), key)))
            .collect();
        Self { segments }
    }

    /// Segment for `key`, if the key was part of the grouping order.
    pub fn get(&self, key: TagKey) -> Option<&str> {
        self.segments.get(&key).map(String::as_str)
    }

    /// Segments in grouping order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.values().map(String::as_str)
    }
}

/// Replace path separators in tag-derived text.
pub fn sanitize_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' => SEPARATOR_REPLACEMENT,
            other => other,
        })
        .collect()
}

/// Turn an optional tag value into a single safe directory name.
///
/// Values that are blank or name the current/parent directory fall back
/// to the key's label.
pub fn tag_segment(value: Option<&str>, key: TagKey) -> String {
    value
        .map(sanitize_segment)
        .filter(|s| is_usable_segment(s))
        .unwrap_or_else(|| key.fallback_label().to_string())
}

/// Check that a sanitized segment names exactly one real directory level.
pub fn is_usable_segment(segment: &str) -> bool {
    let trimmed = segment.trim();
    !trimmed.is_empty() && trimmed != "." && trimmed != ".."
}
