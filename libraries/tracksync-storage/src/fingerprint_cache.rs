//! Fingerprint cache
//!
//! Persists extracted track identities per namespace so unchanged files are
//! never re-read. An entry is only trusted when the live file still has the
//! exact stamp (mtime in nanoseconds and size) recorded at store time and the
//! stored fingerprint still matches the stored fields.
//!
//! # Example
//!
//! ```rust,no_run
//! use tracksync_core::{HashStrategy, Namespace, RawTags, TrackIdentity};
//! use tracksync_storage::{CacheOptions, CacheWrite, FingerprintCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = FingerprintCache::open("/tmp/cache.sqlite", CacheOptions::default()).await?;
//! let identity = TrackIdentity::from_tags(
//!     "/music/in/a.flac".into(),
//!     RawTags::default(),
//!     HashStrategy::default(),
//! );
//!
//! match cache.store(&identity, Namespace::Source).await? {
//!     CacheWrite::Written => println!("cached"),
//!     CacheWrite::Skipped => println!("file vanished before it could be stamped"),
//!     CacheWrite::Disabled => println!("caching is off"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::{create_pool, run_migrations, Result, StorageError};
use sqlx::{Row, SqlitePool};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracksync_core::{
    ContentSignature, FileStamp, HashStrategy, Namespace, SyncError, TrackIdentity, TrackTags,
};

/// Behaviour switches for a cache instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Master switch; a disabled cache never reads or writes
    pub enabled: bool,
    /// Whether source-namespace lookups may be answered from the cache
    ///
    /// Writes to the source namespace still happen when this is off, so the
    /// cache stays warm for a later run that re-enables reads.
    pub read_source: bool,
    /// Strategy used to re-verify stored fingerprints
    pub hash_strategy: HashStrategy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            read_source: true,
            hash_strategy: HashStrategy::default(),
        }
    }
}

/// Result of a cache mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    /// The row was written (or removed)
    Written,
    /// The file could not be stamped because it no longer exists
    Skipped,
    /// The cache is disabled; nothing happened
    Disabled,
}

/// A stored identity together with the stamp it was recorded under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub stamp: FileStamp,
    pub tags: TrackTags,
    pub content_signature: Option<ContentSignature>,
    pub metadata_fingerprint: String,
}

impl CacheEntry {
    /// Rebuild the track identity described by this entry
    pub fn identity(&self, hash: HashStrategy) -> TrackIdentity {
        TrackIdentity::from_parts(
            self.path.clone(),
            self.tags.clone(),
            self.content_signature.clone(),
            hash,
        )
    }
}

#[derive(Debug)]
struct CacheInner {
    pool: SqlitePool,
    db_path: PathBuf,
    // Serialises write transactions; reads go straight to the pool
    write_lock: Mutex<()>,
}

/// Persistent fingerprint cache
///
/// Cloning is cheap and every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct FingerprintCache {
    inner: Option<Arc<CacheInner>>,
    options: CacheOptions,
}

impl FingerprintCache {
    /// Open (or create) the cache file at `db_path` and apply migrations
    ///
    /// With `options.enabled == false` no file is touched and the returned
    /// cache behaves like [`FingerprintCache::disabled`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or migrations fail.
    pub async fn open(db_path: impl AsRef<Path>, options: CacheOptions) -> Result<Self> {
        if !options.enabled {
            return Ok(Self {
                inner: None,
                options,
            });
        }

        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Open {
                    path: db_path.display().to_string(),
                    reason: e.to_string(),
                })?;
        }

        let pool = create_pool(&db_path).await?;
        run_migrations(&pool).await?;

        tracing::info!(path = %db_path.display(), "Fingerprint cache ready");

        Ok(Self {
            inner: Some(Arc::new(CacheInner {
                pool,
                db_path,
                write_lock: Mutex::new(()),
            })),
            options,
        })
    }

    /// A cache that remembers nothing
    pub fn disabled() -> Self {
        Self {
            inner: None,
            options: CacheOptions {
                enabled: false,
                ..CacheOptions::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    /// Look up a still-valid entry for `path`
    ///
    /// Never fails: a missing row, a disabled cache or namespace, a file that
    /// cannot be stamped, a stale stamp, a fingerprint that no longer verifies,
    /// and database errors are all reported as a miss.
    pub async fn lookup(&self, path: impl AsRef<Path>, namespace: Namespace) -> Option<CacheEntry> {
        let inner = self.inner.as_ref()?;
        if namespace == Namespace::Source && !self.options.read_source {
            return None;
        }

        let path = path.as_ref();
        let live = match tokio::fs::metadata(path).await {
            Ok(meta) => FileStamp::from_metadata(&meta).ok()?,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot stamp file for cache lookup");
                return None;
            }
        };

        let entry = match fetch_entry(&inner.pool, path, namespace).await {
            Ok(entry) => entry?,
            Err(e) => {
                let err = SyncError::from(e);
                tracing::debug!(path = %path.display(), error = %err, "Cache lookup failed");
                return None;
            }
        };

        if entry.stamp != live {
            tracing::debug!(
                path = %path.display(),
                namespace = %namespace,
                "Cache entry stale: file changed since it was stored"
            );
            return None;
        }

        let hash = self.options.hash_strategy;
        if !entry
            .identity(hash)
            .verifies(&entry.metadata_fingerprint, hash)
        {
            tracing::debug!(
                path = %path.display(),
                namespace = %namespace,
                "Cache entry stale: stored fingerprint does not verify"
            );
            return None;
        }

        Some(entry)
    }

    /// Record `identity` under its path in `namespace`
    ///
    /// The file is stamped at call time. If it no longer exists nothing is
    /// written and [`CacheWrite::Skipped`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stamped for a reason other than
    /// absence, or the write transaction fails.
    pub async fn store(&self, identity: &TrackIdentity, namespace: Namespace) -> Result<CacheWrite> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(CacheWrite::Disabled);
        };

        let stamp = match tokio::fs::metadata(identity.path()).await {
            Ok(meta) => FileStamp::from_metadata(&meta)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %identity.path().display(), "Not caching vanished file");
                return Ok(CacheWrite::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let tags = identity.tags();
        let sql = format!(
            r#"
            INSERT INTO {} (
                path, mtime_ns, size, metadata_fingerprint,
                artist, album, title, track_number, content_signature
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                mtime_ns = excluded.mtime_ns,
                size = excluded.size,
                metadata_fingerprint = excluded.metadata_fingerprint,
                artist = excluded.artist,
                album = excluded.album,
                title = excluded.title,
                track_number = excluded.track_number,
                content_signature = excluded.content_signature
            "#,
            namespace.table()
        );

        let _guard = inner.write_lock.lock().await;
        let mut tx = inner.pool.begin().await?;
        sqlx::query(&sql)
            .bind(path_key(identity.path()))
            .bind(stamp.mtime_ns)
            .bind(stamp.size)
            .bind(identity.metadata_fingerprint())
            .bind(tags.artist.as_deref())
            .bind(tags.album.as_deref())
            .bind(tags.title.as_deref())
            .bind(tags.track_number.map(i64::from))
            .bind(identity.content_signature().map(ContentSignature::as_str))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CacheWrite::Written)
    }

    /// Drop the entry for `path` in `namespace`
    ///
    /// # Errors
    ///
    /// Returns an error if the delete transaction fails
    pub async fn remove(&self, path: impl AsRef<Path>, namespace: Namespace) -> Result<CacheWrite> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(CacheWrite::Disabled);
        };

        let sql = format!("DELETE FROM {} WHERE path = ?", namespace.table());

        let _guard = inner.write_lock.lock().await;
        let mut tx = inner.pool.begin().await?;
        sqlx::query(&sql)
            .bind(path_key(path.as_ref()))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CacheWrite::Written)
    }

    /// Number of rows in `namespace`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count(&self, namespace: Namespace) -> Result<i64> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(0);
        };

        let sql = format!("SELECT COUNT(*) AS n FROM {}", namespace.table());
        let row = sqlx::query(&sql).fetch_one(&inner.pool).await?;
        Ok(row.try_get("n")?)
    }

    /// Close the pool, waiting for in-flight queries
    pub async fn close(&self) {
        if let Some(inner) = self.inner.as_ref() {
            inner.pool.close().await;
            tracing::debug!(path = %inner.db_path.display(), "Fingerprint cache closed");
        }
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

async fn fetch_entry(
    pool: &SqlitePool,
    path: &Path,
    namespace: Namespace,
) -> Result<Option<CacheEntry>> {
    let sql = format!(
        r#"
        SELECT path, mtime_ns, size, metadata_fingerprint,
               artist, album, title, track_number, content_signature
        FROM {}
        WHERE path = ?
        "#,
        namespace.table()
    );

    let Some(row) = sqlx::query(&sql)
        .bind(path_key(path))
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let track_number: Option<i64> = row.try_get("track_number")?;
    let content_signature: Option<String> = row.try_get("content_signature")?;

    Ok(Some(CacheEntry {
        path: PathBuf::from(row.try_get::<String, _>("path")?),
        stamp: FileStamp::new(row.try_get("mtime_ns")?, row.try_get("size")?),
        tags: TrackTags {
            artist: row.try_get("artist")?,
            album: row.try_get("album")?,
            title: row.try_get("title")?,
            track_number: track_number.and_then(|n| u32::try_from(n).ok()),
        },
        content_signature: content_signature.map(ContentSignature::new),
        metadata_fingerprint: row.try_get("metadata_fingerprint")?,
    }))
}
