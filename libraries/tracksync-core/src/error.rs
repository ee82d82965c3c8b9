/// Core error types for tracksync
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `SyncError`
pub type Result<T> = std::result::Result<T, SyncError>;

/// Core error type for tracksync
///
/// Per-file variants (`PathResolution`, `MetadataRead`, `CacheUnavailable`,
/// `FilesystemOperation`) are caught at the file boundary and turned into
/// counters. `Scan` and `Config` abort a run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The path could not be made absolute and symlink-free
    #[error("Cannot resolve path {path}: {reason}")]
    PathResolution { path: PathBuf, reason: String },

    /// Tag or content signature extraction failed
    #[error("Metadata read failed for {path}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    /// The fingerprint cache could not be reached or written
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A copy, move or delete failed
    #[error("{operation} failed for {path}: {source}")]
    FilesystemOperation {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tree root could not be walked at all
    #[error("Cannot scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Create a path resolution error
    pub fn path_resolution(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PathResolution {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a metadata read error
    pub fn metadata_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MetadataRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a filesystem operation error
    pub fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FilesystemOperation {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Create a cache unavailable error
    pub fn cache_unavailable(msg: impl Into<String>) -> Self {
        Self::CacheUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
