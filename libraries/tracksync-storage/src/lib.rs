//! tracksync Storage
//!
//! `SQLite`-backed fingerprint cache for tracksync.
//!
//! The cache remembers the extracted identity of every file it has seen,
//! keyed by absolute path and validated against the file's modification
//! time and size. Source and destination trees live in separate tables so
//! an entry from one tree never answers a lookup for the other.
//!
//! # Example
//!
//! ```rust,no_run
//! use tracksync_storage::{CacheOptions, FingerprintCache};
//! use tracksync_core::Namespace;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = FingerprintCache::open("/music/out/hashcache.sqlite", CacheOptions::default()).await?;
//!
//! if let Some(entry) = cache.lookup("/music/in/a.flac", Namespace::Source).await {
//!     println!("cached fingerprint: {}", entry.metadata_fingerprint);
//! }
//!
//! cache.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod fingerprint_cache;

pub use error::{Result, StorageError};
pub use fingerprint_cache::{CacheEntry, CacheOptions, CacheWrite, FingerprintCache};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool for the cache file at `db_path`
///
/// The file is created if missing. WAL journaling and a generous busy
/// timeout let readers proceed while a write transaction is open.
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    use sqlx::sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
    };

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %db_path.display(), "Opened fingerprint cache pool");

    Ok(pool)
}
