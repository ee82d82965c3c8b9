//! Three-stage reconciliation of a destination tree against a source tree
//!
//! 1. **Moves**: a destination file whose recording and tags match a source
//!    track but which sits at the wrong path is renamed into place.
//! 2. **Copies**: every source track is checked against the decision table
//!    and copied transactionally when its destination is missing or differs.
//! 3. **Deletion**: destination files that no source track maps to are
//!    removed, along with their cache entries.
//!
//! Stages run in order. Work inside a stage is spread over a bounded number
//! of concurrent tasks. Per-file failures are logged and counted; only an
//! unreadable root aborts the run.

use crate::file_ops::{FileOperator, Outcome};
use crate::identity_map::IdentityMap;
use crate::plan::{decide, CopyDecision, DestinationView};
use crate::progress::{ProgressCallback, ReconcileProgress, Stage};
use crate::scanner::{TreeScanner, DEFAULT_EXTENSIONS};
use crate::stats::RunStats;
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracksync_core::{
    CollisionWarning, Namespace, OutputLayout, Result, SyncError, TrackIdentity,
};
use tracksync_metadata::IdentityExtractor;

/// Signature prefix length used in file names unless configured otherwise
pub const DEFAULT_HASH_LENGTH: usize = 4;

/// Settings for one reconcile run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Signature characters appended to each file name
    pub hash_length: usize,
    pub dry_run: bool,
    /// Leave empty destination directories in place
    pub keep_empty_directories: bool,
    /// Maximum concurrent per-file tasks
    pub workers: usize,
    /// Audio file extensions to reconcile
    pub extensions: Vec<String>,
}

impl ReconcileConfig {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            hash_length: DEFAULT_HASH_LENGTH,
            dry_run: false,
            keep_empty_directories: false,
            workers: num_cpus::get(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Drives a reconcile run
pub struct Reconciler {
    extractor: IdentityExtractor,
    config: ReconcileConfig,
    on_progress: Option<ProgressCallback>,
}

impl Reconciler {
    pub fn new(extractor: IdentityExtractor, config: ReconcileConfig) -> Self {
        Self {
            extractor,
            config,
            on_progress: None,
        }
    }

    /// Receive progress events during [`Reconciler::run`]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ReconcileProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile the output root against the input root
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Scan` if either root cannot be walked. Every other
    /// failure is counted in [`RunStats::errors`].
    pub async fn run(&self) -> Result<RunStats> {
        let dry_run = self.config.dry_run;
        let mut stats = RunStats {
            dry_run,
            ..RunStats::default()
        };

        let scanner = TreeScanner::new(&self.config.extensions);
        let input = resolve_root(&self.config.input_root)?;
        let output = resolve_root(&self.config.output_root)?;
        tracing::info!("Input: {}", input.display());
        tracing::info!("Output: {}", output.display());
        tracing::info!("Extensions: {}", scanner.extensions().join(", "));

        let source_paths = scan(&scanner, &input, false).await?;
        let output_scanner = scanner.clone().create_missing(!dry_run);
        let dest_paths = scan(&output_scanner, &output, false).await?;
        // The scan may have just created the output root
        let output = resolve_root(&output)?;
        let operator = FileOperator::new(dry_run).confined_to(&output);
        stats.source_files = source_paths.len();
        stats.destination_files = dest_paths.len();

        let source_map = self
            .identify_all(&source_paths, Namespace::Source, &mut stats)
            .await;
        let dest_map = self
            .identify_all(&dest_paths, Namespace::Destination, &mut stats)
            .await;
        report_duplicates(&source_map, Namespace::Source, &mut stats);
        report_duplicates(&dest_map, Namespace::Destination, &mut stats);

        let layout = OutputLayout::new(&output, self.config.hash_length);
        let planned = plan_expected_paths(&source_map, &layout, &mut stats);
        let mut view = DestinationView::new(dest_paths, dest_map);

        tracing::info!("Stage 1: moves");
        self.apply_moves(&operator, &planned, &source_map, &mut view, &mut stats)
            .await;

        tracing::info!("Stage 2: copies");
        let (copy_targets, failed_copies) = self
            .apply_copies(&operator, &planned, &view, &mut stats)
            .await;

        tracing::info!("Stage 3: deletion");
        let current = if dry_run {
            let mut simulated = view.paths().clone();
            simulated.extend(copy_targets);
            simulated
        } else {
            let sweeper = operator.clone();
            let root = output.clone();
            let swept =
                run_maintenance("Temp file sweep", move || sweeper.sweep_temp_files(&root)).await;
            if swept > 0 {
                tracing::info!("Removed {} stale temporary files", swept);
            }
            scan(&scanner, &output, !self.config.keep_empty_directories).await?
        };
        self.apply_deletions(&operator, &planned, &current, &mut stats)
            .await;

        if !dry_run && !self.config.keep_empty_directories && stats.deleted > 0 {
            let pruner = scanner.clone();
            let root = output.clone();
            let removed =
                run_maintenance("Directory prune", move || pruner.prune_empty_dirs(&root)).await;
            tracing::debug!("Pruned {} directories after deletion", removed);
        }

        for expected in planned.keys().filter(|path| !current.contains(*path)) {
            tracing::warn!("Missing after sync: {}", expected.display());
            stats.missing += 1;
            if !dry_run && !failed_copies.contains(expected) {
                stats.errors += 1;
            }
        }

        tracing::info!(
            moved = stats.moved,
            copied = stats.copied,
            deleted = stats.deleted,
            errors = stats.errors,
            "Reconcile finished"
        );
        Ok(stats)
    }

    fn emit(&self, event: ReconcileProgress) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }

    fn workers(&self) -> usize {
        self.config.workers.max(1)
    }

    /// Extract identities for `paths`, dropping (and counting) failures
    async fn identify_all(
        &self,
        paths: &HashSet<PathBuf>,
        namespace: Namespace,
        stats: &mut RunStats,
    ) -> IdentityMap {
        let stage = match namespace {
            Namespace::Source => Stage::IdentifySource,
            Namespace::Destination => Stage::IdentifyDestination,
        };
        let mut sorted: Vec<PathBuf> = paths.iter().cloned().collect();
        sorted.sort();
        self.emit(ReconcileProgress::StageStarted {
            stage,
            total: sorted.len(),
        });

        let extractor = &self.extractor;
        let results: Vec<(PathBuf, Result<TrackIdentity>)> = stream::iter(sorted)
            .map(|path| async move {
                let result = extractor.identify(&path, namespace).await;
                (path, result)
            })
            .buffer_unordered(self.workers())
            .inspect(|(path, _)| {
                self.emit(ReconcileProgress::Advanced {
                    stage,
                    path: path.clone(),
                });
            })
            .collect()
            .await;

        let mut map = IdentityMap::new();
        for (path, result) in results {
            match result {
                Ok(identity) => map.insert(identity),
                Err(e) => {
                    tracing::error!("Error processing {} file {}: {}", namespace, path.display(), e);
                    stats.errors += 1;
                }
            }
        }

        tracing::info!("Identified {} {} files", map.len(), namespace);
        self.emit(ReconcileProgress::StageFinished { stage });
        map
    }

    /// Stage one: rename destination files that only have the wrong path
    ///
    /// A move whose target is held by another pending move waits until that
    /// file has moved away. Moves that block each other in a cycle are broken
    /// by parking one file under a temporary name in its target directory.
    async fn apply_moves(
        &self,
        operator: &FileOperator,
        planned: &BTreeMap<PathBuf, TrackIdentity>,
        source_map: &IdentityMap,
        view: &mut DestinationView,
        stats: &mut RunStats,
    ) {
        let mut pending: Vec<(TrackIdentity, PathBuf)> = planned
            .iter()
            .filter_map(|(expected, source)| {
                let signature = source.signature_key();
                if signature.is_unknown() {
                    return None;
                }
                source_map.unique(&signature)?;
                let dest = view.identities().unique(&signature)?;
                if dest.metadata_fingerprint() != source.metadata_fingerprint()
                    || dest.path() == expected
                {
                    return None;
                }
                if is_symlink(dest.path()) {
                    tracing::debug!("Not moving symlink {}", dest.path().display());
                    return None;
                }
                Some((dest.clone(), expected.clone()))
            })
            .collect();

        tracing::info!("Identified {} movable files", pending.len());
        self.emit(ReconcileProgress::StageStarted {
            stage: Stage::Move,
            total: pending.len(),
        });

        let mut parked = 0;
        while !pending.is_empty() {
            let sources: HashSet<PathBuf> = pending
                .iter()
                .map(|(dest, _)| dest.path().to_path_buf())
                .collect();
            let mut waiting = Vec::new();
            let mut progressed = false;

            for (dest, target) in std::mem::take(&mut pending) {
                if view.contains(&target) {
                    if sources.contains(&target) {
                        waiting.push((dest, target));
                    } else {
                        tracing::warn!(
                            "Not moving {} -> {}: target is occupied",
                            dest.path().display(),
                            target.display()
                        );
                    }
                    continue;
                }

                progressed = true;
                match self.relocate(operator, &dest, target.clone(), view).await {
                    Ok(_) => {
                        tracing::info!("[move] {} -> {}", dest.path().display(), target.display());
                        self.emit(ReconcileProgress::Advanced {
                            stage: Stage::Move,
                            path: target,
                        });
                        stats.moved += 1;
                    }
                    Err(e) => {
                        tracing::error!("{}", e);
                        stats.errors += 1;
                    }
                }
            }

            pending = waiting;
            if progressed || pending.is_empty() {
                continue;
            }

            // Every remaining target is held by another pending move
            let Some(index) = pending
                .iter()
                .position(|(dest, _)| pending.iter().any(|(_, target)| target == dest.path()))
            else {
                break;
            };
            parked += 1;
            let (dest, target) = pending.swap_remove(index);
            let parking = parking_path(dest.path(), &target, parked);
            tracing::debug!(
                "Parking {} at {} to break a move cycle",
                dest.path().display(),
                parking.display()
            );
            match self.relocate(operator, &dest, parking, view).await {
                Ok(parked_identity) => pending.push((parked_identity, target)),
                Err(e) => {
                    tracing::error!("{}", e);
                    stats.errors += 1;
                }
            }
        }

        self.emit(ReconcileProgress::StageFinished { stage: Stage::Move });
    }

    /// Rename one destination file and carry its cache entry and view entry along
    async fn relocate(
        &self,
        operator: &FileOperator,
        dest: &TrackIdentity,
        to: PathBuf,
        view: &mut DestinationView,
    ) -> Result<TrackIdentity> {
        let renamer = operator.clone();
        let from = dest.path().to_path_buf();
        let target = to.clone();
        let outcome = run_blocking(move || renamer.rename(&from, &target)).await?;

        let relocated = dest.relocated(to.clone());
        if outcome == Outcome::Done {
            self.extractor
                .forget(dest.path(), Namespace::Destination)
                .await;
            self.extractor
                .remember(&relocated, Namespace::Destination)
                .await;
        }
        view.relocate(dest, to);
        Ok(relocated)
    }

    /// Stage two: copy every source track whose destination is not up to date
    ///
    /// Returns the copy targets and the targets whose copy failed.
    async fn apply_copies(
        &self,
        operator: &FileOperator,
        planned: &BTreeMap<PathBuf, TrackIdentity>,
        view: &DestinationView,
        stats: &mut RunStats,
    ) -> (Vec<PathBuf>, HashSet<PathBuf>) {
        let mut copies = Vec::new();
        for (expected, source) in planned {
            let decision = decide(view.state_for(source, expected));
            match decision {
                CopyDecision::UpToDate => {
                    tracing::debug!("[skip] {}", expected.display());
                    stats.up_to_date += 1;
                    continue;
                }
                CopyDecision::Copy(_) => tracing::info!(
                    "[copy] {}: {} -> {}",
                    decision,
                    source.path().display(),
                    expected.display()
                ),
                CopyDecision::WarnAndCopy(_) => tracing::warn!(
                    "[copy] {}: overwriting {} with {}",
                    decision,
                    expected.display(),
                    source.path().display()
                ),
            }
            copies.push((source, expected));
        }

        stats.planned_copies = copies.len();
        tracing::info!("Identified {} required copies", copies.len());
        self.emit(ReconcileProgress::StageStarted {
            stage: Stage::Copy,
            total: copies.len(),
        });

        let extractor = &self.extractor;
        let results: Vec<(PathBuf, Result<Outcome>)> = stream::iter(copies)
            .map(|(source, target)| {
                let copier = operator.clone();
                async move {
                    let from = source.path().to_path_buf();
                    let to = target.clone();
                    let result = run_blocking(move || copier.copy(&from, &to)).await;
                    if matches!(result, Ok(Outcome::Done)) {
                        extractor
                            .remember(&source.relocated(target.clone()), Namespace::Destination)
                            .await;
                    }
                    (target.clone(), result)
                }
            })
            .buffer_unordered(self.workers())
            .inspect(|(target, _)| {
                self.emit(ReconcileProgress::Advanced {
                    stage: Stage::Copy,
                    path: target.clone(),
                });
            })
            .collect()
            .await;

        let mut targets = Vec::with_capacity(results.len());
        let mut failed = HashSet::new();
        for (target, result) in results {
            match result {
                Ok(_) => stats.copied += 1,
                Err(e) => {
                    tracing::error!("{}", e);
                    stats.errors += 1;
                    failed.insert(target.clone());
                }
            }
            targets.push(target);
        }

        self.emit(ReconcileProgress::StageFinished { stage: Stage::Copy });
        (targets, failed)
    }

    /// Stage three: delete destination files no source track maps to
    async fn apply_deletions(
        &self,
        operator: &FileOperator,
        planned: &BTreeMap<PathBuf, TrackIdentity>,
        current: &HashSet<PathBuf>,
        stats: &mut RunStats,
    ) {
        let mut unexpected: Vec<&PathBuf> = current
            .iter()
            .filter(|path| !planned.contains_key(*path))
            .collect();
        unexpected.sort();

        tracing::info!(
            "Destination holds {} files, expecting {}",
            current.len(),
            planned.len()
        );
        self.emit(ReconcileProgress::StageStarted {
            stage: Stage::Delete,
            total: unexpected.len(),
        });

        for path in unexpected {
            let deleter = operator.clone();
            let target = path.clone();
            match run_blocking(move || deleter.delete(&target)).await {
                Ok(outcome) => {
                    if outcome == Outcome::Done {
                        self.extractor.forget(path, Namespace::Destination).await;
                        tracing::info!("[delete] {}", path.display());
                    }
                    stats.deleted += 1;
                    self.emit(ReconcileProgress::Advanced {
                        stage: Stage::Delete,
                        path: path.clone(),
                    });
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    stats.errors += 1;
                }
            }
        }

        self.emit(ReconcileProgress::StageFinished {
            stage: Stage::Delete,
        });
    }
}

/// Map each expected output path to the source track that owns it
///
/// When several source tracks map to one path the lexicographically smallest
/// source path wins and the others are reported and skipped.
fn plan_expected_paths(
    source_map: &IdentityMap,
    layout: &OutputLayout,
    stats: &mut RunStats,
) -> BTreeMap<PathBuf, TrackIdentity> {
    let mut by_expected: BTreeMap<PathBuf, Vec<&TrackIdentity>> = BTreeMap::new();
    for identity in source_map.identities() {
        by_expected
            .entry(layout.expected_path(identity))
            .or_default()
            .push(identity);
    }

    let mut planned = BTreeMap::new();
    for (expected, mut group) in by_expected {
        group.sort_by(|a, b| a.path().cmp(b.path()));
        if group.len() > 1 {
            let warning = CollisionWarning::duplicate_expected_path(
                expected.clone(),
                group.iter().map(|i| i.path().to_path_buf()).collect(),
            );
            tracing::warn!("{}", warning);
            stats.collisions += group.len() - 1;
        }
        planned.insert(expected, group[0].clone());
    }

    planned
}

/// Log and count signature groups holding more than one file
///
/// Files without a signature all share the sentinel; that group is expected
/// and only logged at debug.
fn report_duplicates(map: &IdentityMap, namespace: Namespace, stats: &mut RunStats) {
    for (signature, group) in map.duplicates() {
        let warning = CollisionWarning::duplicate_signature(
            namespace,
            signature.clone(),
            group.iter().map(|i| i.path().to_path_buf()).collect(),
        );
        if signature.is_unknown() {
            tracing::debug!("{}", warning);
        } else {
            tracing::warn!("{}", warning);
            stats.duplicate_signatures += 1;
        }
    }
}

/// Absolute, symlink-free form of a root
///
/// A root that does not exist yet is only made absolute.
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let scan_error = |e: io::Error| SyncError::Scan {
        path: root.to_path_buf(),
        reason: e.to_string(),
    };

    if root.exists() {
        root.canonicalize().map_err(scan_error)
    } else if root.is_absolute() {
        Ok(root.to_path_buf())
    } else {
        Ok(std::env::current_dir().map_err(scan_error)?.join(root))
    }
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}

/// Temporary home for a file whose move is part of a cycle
///
/// Keeps the file's own name and extension, so a run interrupted while a
/// file is parked leaves an ordinary audio file that the next run moves.
fn parking_path(current: &Path, target: &Path, n: usize) -> PathBuf {
    let name = current
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = target.parent().unwrap_or(target);
    dir.join(format!(".tracksync-parked-{n}-{name}"))
}

async fn scan(scanner: &TreeScanner, root: &Path, prune: bool) -> Result<HashSet<PathBuf>> {
    let scanner = scanner.clone();
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || scanner.scan_and_prune(&root, prune))
        .await
        .map_err(|e| SyncError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}

async fn run_blocking<F>(operation: F) -> Result<Outcome>
where
    F: FnOnce() -> Result<Outcome> + Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| SyncError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}

/// Run filesystem housekeeping off the async runtime
async fn run_maintenance<F>(what: &str, task: F) -> usize
where
    F: FnOnce() -> usize + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("{} task failed: {}", what, e);
            0
        }
    }
}
