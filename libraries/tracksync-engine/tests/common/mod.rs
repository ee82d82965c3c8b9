//! Shared fixtures for reconciler integration tests
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracksync_core::{ContentSignature, HashStrategy, RawTags, SyncError, TagReader};
use tracksync_engine::{ReconcileConfig, Reconciler, RunStats};
use tracksync_metadata::IdentityExtractor;
use tracksync_storage::{CacheOptions, FingerprintCache};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Tag reader over plain-text files of `key=value` lines
///
/// Stands in for real audio: a copy of a fake file carries the same tags, so
/// destination files read back exactly like their source. Counts reads so
/// tests can tell cache hits from misses.
#[derive(Default)]
pub struct FakeTagReader {
    reads: AtomicUsize,
}

impl FakeTagReader {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }
}

impl TagReader for FakeTagReader {
    fn read(&self, path: &Path) -> tracksync_core::Result<RawTags> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let text =
            std::fs::read_to_string(path).map_err(|e| SyncError::metadata_read(path, e))?;
        let fields: HashMap<&str, &str> = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .collect();

        Ok(RawTags {
            title: fields.get("title").map(ToString::to_string),
            artist: fields.get("artist").map(ToString::to_string),
            album: fields.get("album").map(ToString::to_string),
            track_number: fields.get("tracknumber").and_then(|n| n.parse().ok()),
            content_signature: fields.get("signature").map(ContentSignature::new),
        })
    }

    fn supports_format(&self, _path: &Path) -> bool {
        true
    }
}

/// Contents of a fake audio file
pub fn track(artist: &str, album: &str, title: &str, number: u32, signature: &str) -> String {
    format!(
        "artist={artist}\nalbum={album}\ntitle={title}\ntracknumber={number}\nsignature={signature}\n"
    )
}

/// An input root, an output root and a cache file in one temp dir
pub struct Harness {
    pub dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub cache_path: PathBuf,
    pub reader: Arc<FakeTagReader>,
}

impl Harness {
    pub fn new() -> Self {
        init_logging();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().canonicalize().expect("Failed to resolve temp dir");
        let input = root.join("in");
        std::fs::create_dir_all(&input).expect("Failed to create input dir");

        Self {
            output: root.join("out"),
            cache_path: root.join("state/hashcache.sqlite"),
            input,
            dir,
            reader: Arc::new(FakeTagReader::default()),
        }
    }

    /// Write a source file relative to the input root
    pub fn add_source(&self, relative: &str, contents: &str) -> PathBuf {
        write(&self.input.join(relative), contents)
    }

    /// Write a file relative to the output root
    pub fn add_output(&self, relative: &str, contents: &str) -> PathBuf {
        write(&self.output.join(relative), contents)
    }

    pub fn config(&self) -> ReconcileConfig {
        let mut config = ReconcileConfig::new(&self.input, &self.output);
        config.workers = 4;
        config
    }

    pub async fn cache(&self) -> FingerprintCache {
        FingerprintCache::open(&self.cache_path, CacheOptions::default())
            .await
            .expect("Failed to open cache")
    }

    /// Run with the default configuration
    pub async fn run(&self) -> RunStats {
        self.run_with(self.config()).await
    }

    pub async fn run_with(&self, config: ReconcileConfig) -> RunStats {
        self.reconciler(config)
            .await
            .run()
            .await
            .expect("Reconcile run failed")
    }

    pub async fn reconciler(&self, config: ReconcileConfig) -> Reconciler {
        let extractor = IdentityExtractor::new(
            self.reader.clone(),
            self.cache().await,
            HashStrategy::default(),
        );
        Reconciler::new(extractor, config)
    }

    /// Every file below the output root, relative to it
    pub fn output_files(&self) -> BTreeSet<String> {
        list_files(&self.output)
    }

    /// Every directory below the output root, relative to it
    pub fn output_dirs(&self) -> BTreeSet<String> {
        walk(&self.output)
            .into_iter()
            .filter(|p| p.is_dir())
            .map(|p| relative(&self.output, &p))
            .collect()
    }
}

fn write(path: &Path, contents: &str) -> PathBuf {
    std::fs::create_dir_all(path.parent().expect("path has a parent"))
        .expect("Failed to create parent dir");
    std::fs::write(path, contents).expect("Failed to write file");
    path.to_path_buf()
}

fn walk(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(walk(&path));
        }
        found.push(path);
    }
    found
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .expect("path under root")
        .to_string_lossy()
        .into_owned()
}

pub fn list_files(root: &Path) -> BTreeSet<String> {
    walk(root)
        .into_iter()
        .filter(|p| p.is_file())
        .map(|p| relative(root, &p))
        .collect()
}

/// Move a file's modification time forward without changing its bytes
pub fn touch(path: &Path) {
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(120))
        .expect("Failed to set mtime");
}
