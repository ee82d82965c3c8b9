/// Wiring of cache, tag reader and reconciler for one run
use crate::config::SyncConfig;
use crate::progress::ProgressReporter;
use std::sync::Arc;
use std::time::Instant;
use tracksync_core::{SyncError, TagReader};
use tracksync_engine::{Reconciler, RunStats};
use tracksync_metadata::{IdentityExtractor, LoftyTagReader};
use tracksync_storage::FingerprintCache;

/// Run one sync with the lofty tag reader
pub async fn run_sync(
    config: &SyncConfig,
    reporter: Option<Arc<ProgressReporter>>,
) -> anyhow::Result<RunStats> {
    run_sync_with_reader(config, Arc::new(LoftyTagReader::new()), reporter).await
}

/// Run one sync with the given tag reader
///
/// A cache that cannot be opened aborts the run before anything is touched.
pub async fn run_sync_with_reader(
    config: &SyncConfig,
    reader: Arc<dyn TagReader>,
    reporter: Option<Arc<ProgressReporter>>,
) -> anyhow::Result<RunStats> {
    let started = Instant::now();

    // A dry run must not create the output tree just to hold the cache
    let cache = if config.cache_enabled && !(config.dry_run && !config.output.exists()) {
        FingerprintCache::open(config.cache_path(), config.cache_options())
            .await
            .map_err(SyncError::from)?
    } else {
        FingerprintCache::disabled()
    };

    let extractor = IdentityExtractor::new(reader, cache.clone(), config.hash_algorithm);
    let mut reconciler = Reconciler::new(extractor, config.reconcile_config());
    if let Some(reporter) = reporter {
        reconciler = reconciler.with_progress(move |event| reporter.handle(event));
    }

    let result = reconciler.run().await;
    cache.close().await;
    let stats = result?;

    tracing::info!("Elapsed time: {:.2}s", started.elapsed().as_secs_f64());
    Ok(stats)
}
