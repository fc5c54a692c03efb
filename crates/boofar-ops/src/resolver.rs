//! Destination computation from tags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use boofar_core::{GroupingOrder, TagKey, TagMap, TagSnapshot, is_usable_segment, sanitize_segment};

use crate::error::{OrganizeError, TagError};
use crate::reader::TagReader;

/// Where one file should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Directory the file belongs in.
    pub directory: PathBuf,
    /// Final (sanitized) file name.
    pub file_name: String,
    /// Segments the directory was built from.
    pub snapshot: TagSnapshot,
}

impl Resolution {
    /// Full destination path of the file.
    pub fn destination(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Maps files to their place in the new layout.
#[derive(Clone)]
pub struct DestinationResolver {
    reader: Arc<dyn TagReader>,
    grouping: GroupingOrder,
}

impl DestinationResolver {
    pub fn new(reader: Arc<dyn TagReader>, grouping: GroupingOrder) -> Self {
        Self { reader, grouping }
    }

    pub fn grouping(&self) -> &GroupingOrder {
        &self.grouping
    }

    /// Destination directory for already-read tags.
    pub fn directory_for(&self, tags: &TagMap, dest_root: &Path) -> PathBuf {
        let snapshot = TagSnapshot::capture(tags, &self.grouping);
        directory_from_snapshot(&snapshot, dest_root)
    }

    /// Read the tags of `path` and compute its destination directory.
    pub fn resolve(&self, path: &Path, dest_root: &Path) -> Result<PathBuf, TagError> {
        let tags = self.reader.read_tags(path)?;
        Ok(self.directory_for(&tags, dest_root))
    }

    /// File name derived from the title tag, keeping the original extension.
    pub fn rename_from_tag(&self, path: &Path) -> Result<String, OrganizeError> {
        let tags = self.reader.read_tags(path)?;
        file_name_from_tags(path, &tags, true)
    }

    /// Compute directory and file name from a single tag read.
    pub fn plan(
        &self,
        path: &Path,
        dest_root: &Path,
        fix_filenames: bool,
    ) -> Result<Resolution, OrganizeError> {
        let tags = self.reader.read_tags(path)?;
        let snapshot = TagSnapshot::capture(&tags, &self.grouping);

        Ok(Resolution {
            directory: directory_from_snapshot(&snapshot, dest_root),
            file_name: file_name_from_tags(path, &tags, fix_filenames)?,
            snapshot,
        })
    }
}

impl std::fmt::Debug for DestinationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationResolver")
            .field("grouping", &self.grouping)
            .finish_non_exhaustive()
    }
}

fn directory_from_snapshot(snapshot: &TagSnapshot, dest_root: &Path) -> PathBuf {
    let mut directory = dest_root.to_path_buf();
    directory.extend(snapshot.segments());
    directory
}

/// Final file name for `path`.
///
/// With `use_title`, a usable title tag becomes the stem and the original
/// extension is reapplied; otherwise the original name is kept.
pub fn file_name_from_tags(
    path: &Path,
    tags: &TagMap,
    use_title: bool,
) -> Result<String, OrganizeError> {
    let original = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .ok_or_else(|| OrganizeError::InvalidFileName {
            path: path.to_path_buf(),
        })?;

    let title = tags
        .first(TagKey::Title)
        .filter(|_| use_title)
        .map(sanitize_segment)
        .filter(|t| is_usable_segment(t));

    let name = match (title, path.extension()) {
        (Some(title), Some(ext)) => format!("{title}.{}", ext.to_string_lossy()),
        (Some(title), None) => title,
        (None, _) => sanitize_segment(&original),
    };

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryTagReader;

    fn resolver(reader: MemoryTagReader) -> DestinationResolver {
        DestinationResolver::new(Arc::new(reader), GroupingOrder::default())
    }

    fn full_tags() -> TagMap {
        TagMap::new()
            .with(TagKey::Artist, "X")
            .with(TagKey::Album, "Y")
            .with(TagKey::Genre, "Rock")
            .with(TagKey::Title, "Song")
    }

    #[test]
    fn test_resolve_nests_in_grouping_order() {
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", full_tags()));
        let dir = resolver
            .resolve(Path::new("/lib/a.mp3"), Path::new("/lib"))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/lib/Rock/X/Y"));

        let by_artist = DestinationResolver::new(
            Arc::new(MemoryTagReader::new().with_file("a.mp3", full_tags())),
            GroupingOrder::new([TagKey::Artist, TagKey::Album]).unwrap(),
        );
        let dir = by_artist
            .resolve(Path::new("/lib/a.mp3"), Path::new("/out"))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/out/X/Y"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", full_tags()));
        let first = resolver.resolve(Path::new("/lib/a.mp3"), Path::new("/lib"));
        let second = resolver.resolve(Path::new("/lib/a.mp3"), Path::new("/lib"));
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_resolve_from_current_destination_is_fixed_point() {
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", full_tags()));
        let plan = resolver
            .plan(Path::new("/lib/a.mp3"), Path::new("/lib"), false)
            .unwrap();
        let again = resolver
            .plan(&plan.destination(), Path::new("/lib"), false)
            .unwrap();
        assert_eq!(plan.destination(), again.destination());
    }

    #[test]
    fn test_missing_album_uses_fallback() {
        let tags = TagMap::new()
            .with(TagKey::Artist, "X")
            .with(TagKey::Genre, "Rock");
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", tags));
        let dir = resolver
            .resolve(Path::new("/lib/a.mp3"), Path::new("/lib"))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/lib/Rock/X/Unknown album"));
    }

    #[test]
    fn test_separator_in_tag_stays_one_segment() {
        let tags = TagMap::new()
            .with(TagKey::Artist, "X")
            .with(TagKey::Album, "Y")
            .with(TagKey::Genre, "Rock/Indie");
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", tags));
        let dir = resolver
            .resolve(Path::new("/lib/a.mp3"), Path::new("/lib"))
            .unwrap();

        assert_eq!(dir, PathBuf::from("/lib/Rock,Indie/X/Y"));
        assert_eq!(dir.strip_prefix("/lib").unwrap().components().count(), 3);
    }

    #[test]
    fn test_rename_from_title() {
        let tags = TagMap::new().with(TagKey::Title, "AC/DC Live");
        let resolver = resolver(MemoryTagReader::new().with_file("track01.flac", tags));

        let name = resolver
            .rename_from_tag(Path::new("/lib/track01.flac"))
            .unwrap();
        assert_eq!(name, "AC,DC Live.flac");
    }

    #[test]
    fn test_rename_without_title_keeps_name() {
        let resolver = resolver(MemoryTagReader::new());
        let name = resolver
            .rename_from_tag(Path::new("/lib/track01.flac"))
            .unwrap();
        assert_eq!(name, "track01.flac");
    }

    #[test]
    fn test_plan_ignores_title_unless_fixing() {
        let resolver = resolver(MemoryTagReader::new().with_file("a.mp3", full_tags()));

        let kept = resolver
            .plan(Path::new("/lib/a.mp3"), Path::new("/lib"), false)
            .unwrap();
        assert_eq!(kept.file_name, "a.mp3");

        let fixed = resolver
            .plan(Path::new("/lib/a.mp3"), Path::new("/lib"), true)
            .unwrap();
        assert_eq!(fixed.file_name, "Song.mp3");
        assert_eq!(fixed.destination(), PathBuf::from("/lib/Rock/X/Y/Song.mp3"));
    }

    #[test]
    fn test_unreadable_file_errors() {
        let resolver = resolver(MemoryTagReader::new().with_unreadable("a.mp3"));
        assert!(
            resolver
                .resolve(Path::new("/lib/a.mp3"), Path::new("/lib"))
                .is_err()
        );
    }
}
