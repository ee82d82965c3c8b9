//! Tree scanning for audio files

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracksync_core::{Result, SyncError};
use walkdir::WalkDir;

/// Extensions scanned when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["flac"];

/// Enumerates audio files below a root
#[derive(Debug, Clone)]
pub struct TreeScanner {
    /// Lowercase extensions without the leading dot
    extensions: Vec<String>,

    /// Whether a missing root is created instead of treated as empty
    create_missing: bool,
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl TreeScanner {
    /// Create a scanner matching `extensions` (case-insensitive, dot optional)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            create_missing: false,
        }
    }

    /// Set whether a missing root is created
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check if `path` has one of the scanned extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|wanted| *wanted == ext)
            })
    }

    /// Every matching file below `root`
    ///
    /// Paths are returned under `root` as given; pass an absolute root to get
    /// absolute paths. The walk never modifies the tree (apart from creating a
    /// missing root when configured to).
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Scan` if `root` exists but is not a readable
    /// directory, or a missing root cannot be created.
    pub fn scan(&self, root: &Path) -> Result<HashSet<PathBuf>> {
        let mut files = HashSet::new();

        if !root.exists() {
            if self.create_missing {
                fs::create_dir_all(root).map_err(|e| scan_error(root, e))?;
                tracing::info!("Created missing directory {}", root.display());
            } else {
                tracing::info!("{} does not exist, treating as empty", root.display());
            }
            return Ok(files);
        }

        if !root.is_dir() {
            return Err(scan_error(root, "not a directory"));
        }

        // Surface an unreadable root as fatal instead of an empty tree
        fs::read_dir(root).map_err(|e| scan_error(root, e))?;

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(scan_error(root, e)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            // Symlinks to files count as files
            if path.is_file() && self.matches(path) {
                files.insert(path.to_path_buf());
            }
        }

        tracing::info!("Discovered {} files in {}", files.len(), root.display());
        Ok(files)
    }

    /// Remove empty directories below `root`, deepest first
    ///
    /// `root` itself is never removed. Returns the number of directories
    /// removed; directories that cannot be removed are logged and left.
    pub fn prune_empty_dirs(&self, root: &Path) -> usize {
        let mut removed = 0;

        let walker = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .follow_links(false);

        for entry in walker.into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let is_empty = fs::read_dir(path)
                .map(|mut children| children.next().is_none())
                .unwrap_or(false);
            if !is_empty {
                continue;
            }

            match fs::remove_dir(path) {
                Ok(()) => {
                    tracing::debug!("Removed empty directory {}", path.display());
                    removed += 1;
                }
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        removed
    }

    /// Prune (when asked) and then scan `root`
    ///
    /// # Errors
    ///
    /// See [`TreeScanner::scan`].
    pub fn scan_and_prune(&self, root: &Path, prune: bool) -> Result<HashSet<PathBuf>> {
        if prune && root.is_dir() {
            let removed = self.prune_empty_dirs(root);
            if removed > 0 {
                tracing::info!("Pruned {} empty directories in {}", removed, root.display());
            }
        }
        self.scan(root)
    }
}

fn scan_error(root: &Path, reason: impl ToString) -> SyncError {
    SyncError::Scan {
        path: root.to_path_buf(),
        reason: reason.to_string(),
    }
}
