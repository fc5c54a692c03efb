//! Single-file move with collision handling.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use boofar_core::CollisionPolicy;

use crate::coordinator::DirectoryCoordinator;
use crate::error::OrganizeError;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at `destination`.
    Moved { destination: PathBuf, bytes: u64 },
    /// The file was already at its computed destination.
    InPlace { destination: PathBuf },
}

impl MoveOutcome {
    pub fn destination(&self) -> &Path {
        match self {
            Self::Moved { destination, .. } | Self::InPlace { destination } => destination,
        }
    }
}

/// Move `source` to `destination`, whose parent must already exist.
///
/// Under [`CollisionPolicy::Fail`] an existing destination, or one claimed
/// by another task of the same run, fails the move and leaves the source
/// untouched. The final placement never replaces an existing entry, so a
/// file that appears between the check and the move (another process, or
/// another run in this one) is still reported as a collision.
pub fn move_file(
    source: &Path,
    destination: &Path,
    policy: CollisionPolicy,
    coordinator: &DirectoryCoordinator,
) -> Result<MoveOutcome, OrganizeError> {
    if source == destination {
        return Ok(MoveOutcome::InPlace {
            destination: destination.to_path_buf(),
        });
    }

    let collision = || OrganizeError::Collision {
        file: source.to_path_buf(),
        destination: destination.to_path_buf(),
    };

    if policy == CollisionPolicy::Fail {
        if !coordinator.claim(destination) {
            return Err(collision());
        }
        if fs::symlink_metadata(destination).is_ok() {
            return Err(collision());
        }
    } else if destination.exists() {
        tracing::warn!(
            source = %source.display(),
            destination = %destination.display(),
            "overwriting existing file"
        );
    }

    match move_item(source, destination, policy) {
        Ok(bytes) => Ok(MoveOutcome::Moved {
            destination: destination.to_path_buf(),
            bytes,
        }),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(collision()),
        Err(err) => {
            coordinator.release(destination);
            Err(OrganizeError::move_failed(source, destination, err))
        }
    }
}

/// Move a single file, falling back to copy + delete across filesystems.
///
/// With [`CollisionPolicy::Fail`] the destination is only ever created,
/// never replaced: a hard link, or an exclusive create for the copy.
fn move_item(source: &Path, dest: &Path, policy: CollisionPolicy) -> io::Result<u64> {
    let size = fs::metadata(source)?.len();

    match policy {
        CollisionPolicy::Overwrite => {
            if fs::rename(source, dest).is_ok() {
                return Ok(size);
            }
            fs::copy(source, dest)?;
        }
        CollisionPolicy::Fail => match fs::hard_link(source, dest) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Err(err),
            // Other filesystem, or no hard link support.
            Err(_) => copy_new(source, dest)?,
        },
    }

    if let Err(err) = fs::remove_file(source) {
        // Keep exactly one copy of the file.
        let _ = fs::remove_file(dest);
        return Err(err);
    }

    Ok(size)
}

/// Copy into a destination that must not exist yet.
fn copy_new(source: &Path, dest: &Path) -> io::Result<()> {
    let mut from = File::open(source)?;
    let mut to = OpenOptions::new().write(true).create_new(true).open(dest)?;

    if let Err(err) = io::copy(&mut from, &mut to) {
        drop(to);
        let _ = fs::remove_file(dest);
        return Err(err);
    }
    if let Ok(metadata) = from.metadata() {
        let _ = fs::set_permissions(dest, metadata.permissions());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "audio").unwrap();

        let coordinator = DirectoryCoordinator::new();
        let outcome = move_file(&source, &dest, CollisionPolicy::Fail, &coordinator).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                destination: dest.clone(),
                bytes: 5
            }
        );
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "audio");
    }

    #[test]
    fn test_same_path_is_in_place() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        fs::write(&source, "audio").unwrap();

        let coordinator = DirectoryCoordinator::new();
        let outcome = move_file(&source, &source, CollisionPolicy::Fail, &coordinator).unwrap();

        assert!(matches!(outcome, MoveOutcome::InPlace { .. }));
        assert!(source.exists());
    }

    #[test]
    fn test_existing_destination_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        let coordinator = DirectoryCoordinator::new();
        let result = move_file(&source, &dest, CollisionPolicy::Fail, &coordinator);

        assert!(matches!(result, Err(OrganizeError::Collision { .. })));
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");
    }

    #[test]
    fn test_claimed_destination_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "new").unwrap();

        let coordinator = DirectoryCoordinator::new();
        assert!(coordinator.claim(&dest));

        let result = move_file(&source, &dest, CollisionPolicy::Fail, &coordinator);
        assert!(result.unwrap_err().is_collision());
        assert!(source.exists());
    }

    #[test]
    fn test_overwrite_policy_replaces() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        let coordinator = DirectoryCoordinator::new();
        move_file(&source, &dest, CollisionPolicy::Overwrite, &coordinator).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let coordinator = DirectoryCoordinator::new();
        let dest = temp.path().join("b.mp3");

        let result = move_file(
            &temp.path().join("gone.mp3"),
            &dest,
            CollisionPolicy::Fail,
            &coordinator,
        );
        assert!(matches!(result, Err(OrganizeError::Move { .. })));
        assert_eq!(coordinator.claimed_count(), 0);
    }

    #[test]
    fn test_fail_policy_never_replaces_late_arrival() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "new").unwrap();
        // Appears after the existence check, e.g. from another run.
        fs::write(&dest, "other").unwrap();

        let err = move_item(&source, &dest, CollisionPolicy::Fail).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "other");
    }

    #[test]
    fn test_copy_new_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.mp3");
        let dest = temp.path().join("b.mp3");
        fs::write(&source, "new").unwrap();
        fs::write(&dest, "other").unwrap();

        let err = copy_new(&source, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "other");

        fs::remove_file(&dest).unwrap();
        copy_new(&source, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_separate_runs_do_not_overwrite_each_other() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.mp3");
        let second = temp.path().join("second.mp3");
        let dest = temp.path().join("song.mp3");
        fs::write(&first, "one").unwrap();
        fs::write(&second, "two").unwrap();

        let run_a = DirectoryCoordinator::new();
        let run_b = DirectoryCoordinator::new();
        move_file(&first, &dest, CollisionPolicy::Fail, &run_a).unwrap();
        let result = move_file(&second, &dest, CollisionPolicy::Fail, &run_b);

        assert!(result.unwrap_err().is_collision());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "one");
        assert_eq!(fs::read_to_string(&second).unwrap(), "two");
    }
}
