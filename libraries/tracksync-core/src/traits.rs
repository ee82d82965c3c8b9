/// Core traits for tracksync
use crate::error::Result;
use crate::types::RawTags;
use std::path::Path;

/// Tag extraction collaborator
///
/// Given a file, yields its display fields and content signature. Every error
/// is recoverable: the identity extractor falls back to sentinel defaults.
pub trait TagReader: Send + Sync {
    /// Read tags and the embedded content signature from `path`
    ///
    /// # Errors
    /// Returns `SyncError::MetadataRead` if the file cannot be parsed
    fn read(&self, path: &Path) -> Result<RawTags>;

    /// Check if the reader supports the given file format
    fn supports_format(&self, path: &Path) -> bool;
}
