//! Filesystem stamp used to validate cache entries
use std::fs::Metadata;
use std::io;
use std::time::UNIX_EPOCH;

/// Modification time and size of a file at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileStamp {
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: i64,
    /// Size in bytes
    pub size: i64,
}

impl FileStamp {
    pub fn new(mtime_ns: i64, size: i64) -> Self {
        Self { mtime_ns, size }
    }

    /// Build a stamp from already-fetched metadata
    pub fn from_metadata(metadata: &Metadata) -> io::Result<Self> {
        let modified = metadata.modified()?;
        let mtime_ns = match modified.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_nanos() as i64,
            Err(before) => -(before.duration().as_nanos() as i64),
        };
        Ok(Self {
            mtime_ns,
            size: metadata.len() as i64,
        })
    }
}
