//! Transactional file operations on the destination tree
//!
//! Copies are written to a temporary file next to the target and atomically
//! renamed into place, so a reader of the destination tree only ever sees the
//! previous file or the complete new one. A failed copy leaves the target
//! untouched and removes the temporary file. An operator confined to a root
//! refuses to write, rename or delete anything outside it.

use std::fs::{self, File, Permissions};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracksync_core::{Result, SyncError};
use walkdir::WalkDir;

/// Prefix of in-flight copy files
const TEMP_PREFIX: &str = ".tracksync-";

/// Suffix of in-flight copy files
const TEMP_SUFFIX: &str = ".part";

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The filesystem was changed
    Done,
    /// Dry-run: the change was only logged
    DryRun,
}

/// Applies copy, rename and delete operations, or logs them in dry-run mode
#[derive(Debug, Clone, Default)]
pub struct FileOperator {
    dry_run: bool,
    root: Option<Arc<Path>>,
}

impl FileOperator {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            root: None,
        }
    }

    /// Refuse every mutation of a path outside `root`
    pub fn confined_to(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(Arc::from(root.into()));
        self
    }

    /// Copy `src` onto `dst`, replacing any existing file atomically
    ///
    /// # Errors
    ///
    /// Returns `SyncError::FilesystemOperation` if any step fails. `dst` is
    /// then in its previous state.
    pub fn copy(&self, src: &Path, dst: &Path) -> Result<Outcome> {
        self.check_confined("copy", dst)?;
        if self.dry_run {
            tracing::info!("[dry-run] would copy {} -> {}", src.display(), dst.display());
            return Ok(Outcome::DryRun);
        }

        let mut reader = File::open(src).map_err(|e| SyncError::filesystem("copy", src, e))?;
        // Temp files are created owner-only; match the source instead
        let permissions = reader
            .metadata()
            .map_err(|e| SyncError::filesystem("copy", src, e))?
            .permissions();

        write_atomic(&mut reader, Some(permissions), dst)?;

        tracing::debug!("Copied {} -> {}", src.display(), dst.display());
        Ok(Outcome::Done)
    }

    /// Move `src` to `dst` within one filesystem
    ///
    /// Symlinks are renamed themselves, never their targets.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::FilesystemOperation` if `dst` already exists, either
    /// path lies outside the confinement root, or the rename fails.
    pub fn rename(&self, src: &Path, dst: &Path) -> Result<Outcome> {
        self.check_confined("move", src)?;
        self.check_confined("move", dst)?;
        if self.dry_run {
            tracing::info!("[dry-run] would move {} -> {}", src.display(), dst.display());
            return Ok(Outcome::DryRun);
        }

        if dst.symlink_metadata().is_ok() {
            return Err(SyncError::filesystem(
                "move",
                dst,
                io::Error::new(ErrorKind::AlreadyExists, "target already exists"),
            ));
        }

        let parent = parent_of(dst, "move")?;
        fs::create_dir_all(parent).map_err(|e| SyncError::filesystem("move", dst, e))?;
        fs::rename(src, dst).map_err(|e| SyncError::filesystem("move", src, e))?;

        tracing::debug!("Moved {} -> {}", src.display(), dst.display());
        Ok(Outcome::Done)
    }

    /// Delete the file at `path`
    ///
    /// # Errors
    ///
    /// Returns `SyncError::FilesystemOperation` if the file cannot be removed
    /// or lies outside the confinement root
    pub fn delete(&self, path: &Path) -> Result<Outcome> {
        self.check_confined("delete", path)?;
        if self.dry_run {
            tracing::info!("[dry-run] would delete {}", path.display());
            return Ok(Outcome::DryRun);
        }

        fs::remove_file(path).map_err(|e| SyncError::filesystem("delete", path, e))?;

        tracing::debug!("Deleted {}", path.display());
        Ok(Outcome::Done)
    }

    /// Remove temporary copy files left below `root` by an interrupted run
    ///
    /// Returns the number of files removed (or, in dry-run, found).
    pub fn sweep_temp_files(&self, root: &Path) -> usize {
        let stale: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file() && is_temp_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();

        let mut removed = 0;
        for path in stale {
            match self.delete(&path) {
                Ok(_) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove stale temp file: {}", e),
            }
        }
        removed
    }

    fn check_confined(&self, operation: &'static str, path: &Path) -> Result<()> {
        match &self.root {
            Some(root) if !path.starts_with(root) => Err(SyncError::filesystem(
                operation,
                path,
                io::Error::new(
                    ErrorKind::PermissionDenied,
                    format!("outside {}", root.display()),
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Whether `path` names an in-flight copy file
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX))
}

/// Stream `reader` into a temporary file beside `dst`, then rename it over `dst`
fn write_atomic<R: Read>(
    reader: &mut R,
    permissions: Option<Permissions>,
    dst: &Path,
) -> Result<()> {
    let parent = parent_of(dst, "copy")?;
    fs::create_dir_all(parent).map_err(|e| SyncError::filesystem("copy", dst, e))?;

    // Dropping the temp file on any early return deletes it
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| SyncError::filesystem("copy", dst, e))?;

    io::copy(reader, temp.as_file_mut()).map_err(|e| SyncError::filesystem("copy", dst, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SyncError::filesystem("copy", dst, e))?;

    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)
            .map_err(|e| SyncError::filesystem("copy", dst, e))?;
    }

    temp.persist(dst)
        .map_err(|e| SyncError::filesystem("copy", dst, e.error))?;
    Ok(())
}

fn parent_of<'a>(path: &'a Path, operation: &'static str) -> Result<&'a Path> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            SyncError::filesystem(
                operation,
                path,
                io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Reader fed chunk by chunk from a channel; ends when the sender drops
    struct ChannelReader {
        chunks: mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for ChannelReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                match self.chunks.recv() {
                    Ok(chunk) => self.pending = chunk,
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| is_temp_file(p))
            .collect()
    }

    #[test]
    fn test_copy_creates_parents_and_matches_bytes() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.flac");
        let dst = temp.path().join("out/Artist/Album/Song-abcd.flac");
        fs::write(&src, b"audio bytes").unwrap();

        let outcome = FileOperator::new(false).copy(&src, &dst).unwrap();

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(fs::read(&dst).unwrap(), b"audio bytes");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_overwrites_existing_target() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.flac");
        let dst = temp.path().join("dst.flac");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old and longer").unwrap();

        FileOperator::new(false).copy(&src, &dst).unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"new");
    }

    #[test]
    fn test_failed_copy_leaves_target_and_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dst.flac");
        fs::write(&dst, b"previous").unwrap();

        let result = FileOperator::new(false).copy(&temp.path().join("missing.flac"), &dst);

        assert!(matches!(
            result,
            Err(SyncError::FilesystemOperation {
                operation: "copy",
                ..
            })
        ));
        assert_eq!(fs::read(&dst).unwrap(), b"previous");
        assert!(temp_files(temp.path()).is_empty());
    }

    #[test]
    fn test_partial_copy_is_never_visible_at_target() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dst.flac");
        fs::write(&dst, b"previous").unwrap();
        let (tx, rx) = mpsc::channel();

        let writer_dst = dst.clone();
        let writer = std::thread::spawn(move || {
            let mut reader = ChannelReader {
                chunks: rx,
                pending: Vec::new(),
            };
            write_atomic(&mut reader, None, &writer_dst)
        });

        tx.send(vec![1u8; 1000]).unwrap();
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let written = temp_files(temp.path())
                .first()
                .and_then(|p| fs::metadata(p).ok())
                .map_or(0, |m| m.len());
            if written >= 1000 {
                break;
            }
            assert!(Instant::now() < deadline, "first chunk never reached disk");
            std::thread::sleep(Duration::from_millis(5));
        }

        // Half-written: the target still holds the previous file
        assert_eq!(fs::read(&dst).unwrap(), b"previous");

        tx.send(vec![2u8; 1000]).unwrap();
        drop(tx);
        writer.join().unwrap().unwrap();

        let contents = fs::read(&dst).unwrap();
        assert_eq!(contents.len(), 2000);
        assert!(contents[..1000].iter().all(|b| *b == 1));
        assert!(contents[1000..].iter().all(|b| *b == 2));
        assert!(temp_files(temp.path()).is_empty());
    }

    #[test]
    fn test_confined_operator_refuses_outside_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        let outside = temp.path().join("in/a.flac");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(outside.parent().unwrap()).unwrap();
        fs::write(&outside, b"source").unwrap();
        let ops = FileOperator::new(false).confined_to(&root);

        assert!(ops.rename(&outside, &root.join("a.flac")).is_err());
        assert!(ops.delete(&outside).is_err());
        assert!(ops.copy(&root.join("x.flac"), &outside).is_err());

        assert_eq!(fs::read(&outside).unwrap(), b"source");
        assert!(!root.join("a.flac").exists());
    }

    #[test]
    fn test_sweep_removes_only_stale_temp_files() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("X/Y/.tracksync-AbC123.part");
        let keep = temp.path().join("X/Y/Song-abcd.flac");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"half").unwrap();
        fs::write(&keep, b"whole").unwrap();

        assert_eq!(FileOperator::new(true).sweep_temp_files(temp.path()), 1);
        assert!(stale.exists());

        assert_eq!(FileOperator::new(false).sweep_temp_files(temp.path()), 1);
        assert!(!stale.exists());
        assert!(keep.exists());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.flac");
        let dst = temp.path().join("b.flac");
        fs::write(&src, b"a").unwrap();
        fs::write(&dst, b"b").unwrap();

        let result = FileOperator::new(false).rename(&src, &dst);

        assert!(result.is_err());
        assert_eq!(fs::read(&src).unwrap(), b"a");
        assert_eq!(fs::read(&dst).unwrap(), b"b");
    }

    #[test]
    fn test_rename_moves_into_new_directories() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.flac");
        let dst = temp.path().join("X/Y/a.flac");
        fs::write(&src, b"a").unwrap();

        FileOperator::new(false).rename(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"a");
    }

    #[test]
    fn test_delete_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.flac");
        fs::write(&path, b"a").unwrap();

        FileOperator::new(false).delete(&path).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.flac");
        let dst = temp.path().join("sub/b.flac");
        fs::write(&src, b"a").unwrap();
        let ops = FileOperator::new(true);

        assert_eq!(ops.copy(&src, &dst).unwrap(), Outcome::DryRun);
        assert_eq!(ops.rename(&src, &dst).unwrap(), Outcome::DryRun);
        assert_eq!(ops.delete(&src).unwrap(), Outcome::DryRun);

        assert!(src.exists());
        assert!(!temp.path().join("sub").exists());
    }
}
