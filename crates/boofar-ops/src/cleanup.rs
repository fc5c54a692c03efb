//! Removal of directories left empty by a run.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use serde::Serialize;

/// A directory that could not be inspected or removed.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a pruning pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Directories removed, deepest first.
    pub removed: Vec<PathBuf>,
    /// Directories skipped because of an error.
    pub skipped: Vec<CleanupWarning>,
}

/// Remove every directory under `root` that is empty once its own empty
/// children are gone.
///
/// The walk is bottom-up and never follows symlinks. `root` itself is kept.
/// Errors skip the directory in question and pruning goes on with its
/// siblings.
pub fn prune_empty_dirs(root: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();
    let mut dirs: Vec<(usize, PathBuf)> = Vec::new();

    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .min_depth(1);

    for entry_result in walker {
        match entry_result {
            Ok(entry) if entry.file_type().is_dir() => dirs.push((entry.depth(), entry.path())),
            Ok(_) => {}
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                report.skipped.push(CleanupWarning {
                    path,
                    message: err.to_string(),
                });
            }
        }
    }

    // Deepest first, so parents are checked after their children went away.
    dirs.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, dir) in dirs {
        let is_empty = match fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(err) => {
                report.skipped.push(CleanupWarning {
                    path: dir,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(&dir) {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), "removed empty directory");
                report.removed.push(dir);
            }
            Err(err) => {
                tracing::warn!(path = %dir.display(), "could not remove directory: {err}");
                report.skipped.push(CleanupWarning {
                    path: dir,
                    message: err.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prune_bottom_up() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("a/d")).unwrap();
        fs::create_dir_all(root.join("keep/inner")).unwrap();
        fs::write(root.join("keep/inner/song.mp3"), "x").unwrap();
        fs::create_dir_all(root.join("keep/empty")).unwrap();

        let report = prune_empty_dirs(root);

        assert!(!root.join("a").exists());
        assert!(!root.join("keep/empty").exists());
        assert!(root.join("keep/inner/song.mp3").exists());
        assert!(root.exists());
        assert_eq!(report.removed.len(), 5);
        assert!(report.skipped.is_empty());

        // Children are always removed before their parents.
        let pos = |p: &str| report.removed.iter().position(|r| r == &root.join(p)).unwrap();
        assert!(pos("a/b/c") < pos("a/b"));
        assert!(pos("a/b") < pos("a"));
        assert!(pos("a/d") < pos("a"));
    }

    #[test]
    fn test_prune_keeps_root_and_non_music_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("art")).unwrap();
        fs::write(root.join("art/cover.jpg"), "jpg").unwrap();

        let report = prune_empty_dirs(root);

        assert!(report.removed.is_empty());
        assert!(root.join("art/cover.jpg").exists());

        let empty = TempDir::new().unwrap();
        let report = prune_empty_dirs(empty.path());
        assert!(report.removed.is_empty());
        assert!(empty.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_prune_does_not_follow_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::create_dir(outside.path().join("empty")).unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        prune_empty_dirs(temp.path());

        assert!(outside.path().join("empty").exists());
        assert!(temp.path().join("link").exists());
    }
}
