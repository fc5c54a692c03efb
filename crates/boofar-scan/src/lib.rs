//! Music file discovery for boofar.
//!
//! Walks a collection with jwalk and returns every regular file whose
//! name ends with one of [`MUSIC_EXTENSIONS`]. Symbolic links are never
//! followed nor returned, so a scan cannot escape its root or yield the
//! same file twice.
//!
//! # Example
//!
//! ```rust,no_run
//! use boofar_scan::MusicScanner;
//!
//! let scan = MusicScanner::new().discover("/path/to/music").unwrap();
//! println!("Found {} music files", scan.files.len());
//! ```

mod error;
mod scanner;

pub use error::{ScanError, ScanWarning};
pub use scanner::{MUSIC_EXTENSIONS, MusicScanner, ScanResult, has_music_extension};
