//! Expected output path of a track under the destination root
//!
//! Layout: `<root>/<artist>/<album>/<title>-<signature prefix>.<ext>`
//!
//! Two identities with the same artist, album, title, extension and signature
//! prefix map to the same path. The reconciler treats that as a collision.

use crate::types::TrackIdentity;
use std::path::{Path, PathBuf};

/// Characters removed from every path component
const INVALID_PATH_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '.'];

/// Maximum length of one sanitised component, in characters
pub const MAX_COMPONENT_LEN: usize = 100;

/// Extension used when the source file has none
const DEFAULT_EXTENSION: &str = "flac";

/// Naming scheme of the destination tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    hash_length: usize,
}

impl OutputLayout {
    /// Create a layout rooted at `root` using `hash_length` signature characters
    pub fn new(root: impl Into<PathBuf>, hash_length: usize) -> Self {
        Self {
            root: root.into(),
            hash_length,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hash_length(&self) -> usize {
        self.hash_length
    }

    /// Where `identity` belongs in the destination tree
    pub fn expected_path(&self, identity: &TrackIdentity) -> PathBuf {
        let display = identity.display();
        let extension = identity
            .extension()
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let filename = format!(
            "{}-{}.{}",
            sanitize_for_path(&display.title),
            display.signature.prefix(self.hash_length),
            extension
        );

        self.root
            .join(sanitize_for_path(&display.artist))
            .join(sanitize_for_path(&display.album))
            .join(filename)
    }
}

/// Make a display string safe to use as a single path component
///
/// Strips separators, wildcards and dots, collapses whitespace runs to one
/// space, trims, and caps the length. Never returns an empty string.
pub fn sanitize_for_path(s: &str) -> String {
    let stripped: String = s
        .chars()
        .filter(|c| c.is_whitespace() || (!INVALID_PATH_CHARS.contains(c) && !c.is_control()))
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let capped: String = collapsed.chars().take(MAX_COMPONENT_LEN).collect();
    let trimmed = capped.trim_end();

    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
