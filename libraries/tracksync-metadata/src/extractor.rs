//! Identity extraction
//!
//! Resolves a file to its [`TrackIdentity`], preferring the fingerprint cache
//! and only reading tags when the cache has nothing valid for the file.
//!
//! An identity keeps the path it was asked about. A symlink is resolved to
//! check that its target exists and to read the target's tags, but the
//! identity (and its cache row) stays with the link, so later moves and
//! deletes act on the link and never on whatever it points at.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracksync_core::{
    HashStrategy, Namespace, RawTags, Result, SyncError, TagReader, TrackIdentity,
};
use tracksync_storage::FingerprintCache;

/// Produces track identities for files in either tree
#[derive(Clone)]
pub struct IdentityExtractor {
    reader: Arc<dyn TagReader>,
    cache: FingerprintCache,
    hash: HashStrategy,
}

impl IdentityExtractor {
    pub fn new(reader: Arc<dyn TagReader>, cache: FingerprintCache, hash: HashStrategy) -> Self {
        Self {
            reader,
            cache,
            hash,
        }
    }

    /// Extract the identity of `path` in `namespace`
    ///
    /// Relative paths are made absolute against their resolved form. Tag read
    /// failures are not errors: the identity falls back to sentinel display
    /// fields. The result is always written back to the cache, hit or miss,
    /// and a failed write only logs.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::PathResolution` if `path` cannot be resolved
    /// (missing target or a symlink loop).
    pub async fn identify(&self, path: &Path, namespace: Namespace) -> Result<TrackIdentity> {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| SyncError::path_resolution(path, e))?;
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            resolved.clone()
        };

        let identity = match self.cache.lookup(&path, namespace).await {
            Some(entry) => {
                tracing::trace!(path = %path.display(), %namespace, "Cache hit");
                entry.identity(self.hash)
            }
            None => {
                let raw = self.read_tags(resolved).await;
                TrackIdentity::from_tags(path, raw, self.hash)
            }
        };

        // Refreshes the stamp on a hit as well
        self.remember(&identity, namespace).await;

        Ok(identity)
    }

    async fn read_tags(&self, resolved: PathBuf) -> RawTags {
        if !self.reader.supports_format(&resolved) {
            tracing::debug!(path = %resolved.display(), "Unsupported format, using default tags");
            return RawTags::default();
        }

        let reader = Arc::clone(&self.reader);
        let read_path = resolved.clone();
        match tokio::task::spawn_blocking(move || reader.read(&read_path)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Falling back to default tags");
                RawTags::default()
            }
            Err(e) => {
                tracing::debug!(path = %resolved.display(), error = %e, "Tag reader task failed");
                RawTags::default()
            }
        }
    }

    /// Record `identity` in the cache, logging instead of failing
    pub async fn remember(&self, identity: &TrackIdentity, namespace: Namespace) {
        if let Err(e) = self.cache.store(identity, namespace).await {
            tracing::warn!(
                path = %identity.path().display(),
                %namespace,
                error = %SyncError::from(e),
                "Failed to cache fingerprint"
            );
        }
    }

    /// Drop the cache entry for `path`, logging instead of failing
    pub async fn forget(&self, path: &Path, namespace: Namespace) {
        if let Err(e) = self.cache.remove(path, namespace).await {
            tracing::warn!(
                path = %path.display(),
                %namespace,
                error = %SyncError::from(e),
                "Failed to drop cached fingerprint"
            );
        }
    }
}

impl std::fmt::Debug for IdentityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityExtractor")
            .field("cache", &self.cache)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}
