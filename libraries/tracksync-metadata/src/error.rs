/// Metadata-specific errors
use std::path::Path;
use thiserror::Error;
use tracksync_core::SyncError;

/// Result type alias using `MetadataError`
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata error types
#[derive(Error, Debug)]
pub enum MetadataError {
    /// File not found
    #[error("File not found")]
    FileNotFound,

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Lofty error
    #[error(transparent)]
    Lofty(#[from] lofty::error::LoftyError),
}

impl MetadataError {
    /// Attach the offending path
    pub fn at(self, path: &Path) -> SyncError {
        SyncError::metadata_read(path, self)
    }
}
