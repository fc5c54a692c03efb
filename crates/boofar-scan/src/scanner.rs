//! JWalk-based music file discovery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};

use crate::error::{ScanError, ScanWarning};

/// File name suffixes recognized as music files.
///
/// Matching is a case-sensitive suffix test: `song.MP3` is not picked up.
pub const MUSIC_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".flac", ".ogg", ".opus", ".m4a"];

/// Check whether a file name carries one of [`MUSIC_EXTENSIONS`].
pub fn has_music_extension(name: &str) -> bool {
    MUSIC_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Absolute paths of discovered music files.
    pub files: Vec<PathBuf>,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// Recursive scanner for music files.
#[derive(Debug, Clone, Default)]
pub struct MusicScanner {
    threads: usize,
}

impl MusicScanner {
    /// Create a scanner using the default rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk with a dedicated pool of `threads` threads (0 = default pool).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Discover every music file under `root`.
    ///
    /// Never touches the filesystem beyond reading directories.
    pub fn discover(&self, root: impl AsRef<Path>) -> Result<ScanResult, ScanError> {
        let root = root.as_ref();
        let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!(path = %path.display(), "skipping unreadable entry: {err}");
                    warnings.push(ScanWarning::new(path, err.to_string()));
                    continue;
                }
            };

            // Symlinks report their own type here since links are not followed.
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if has_music_extension(&name) {
                files.push(entry.path());
            }
        }

        tracing::debug!(
            root = %root_path.display(),
            files = files.len(),
            warnings = warnings.len(),
            "discovery finished"
        );

        Ok(ScanResult {
            root: root_path,
            files,
            warnings,
        })
    }
}
