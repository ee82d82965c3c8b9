/// Sync configuration
use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracksync_core::{HashStrategy, Result, SyncError};
use tracksync_engine::ReconcileConfig;
use tracksync_storage::CacheOptions;

/// Longest signature prefix a file name may carry (a full MD5 in hex)
pub const MAX_HASH_LENGTH: usize = 32;

/// Resolved settings for one run
///
/// Layered as: built-in defaults, then the TOML file, then `TRACKSYNC_*`
/// environment variables, then explicit command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Trust cached fingerprints for input files
    #[serde(default = "default_true")]
    pub source_cache_reads: bool,

    #[serde(default)]
    pub keep_empty_directories: bool,

    /// `None` disables the log file; written to TOML as `""`
    #[serde(default = "default_log_file", with = "optional_path")]
    pub log_file: Option<PathBuf>,

    /// Relative paths are resolved against `output`
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub hash_algorithm: HashStrategy,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl SyncConfig {
    /// Load configuration from `path` (if it exists) and the environment
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        if path.exists() {
            settings = settings.add_source(
                config::File::from(path.to_path_buf()).format(config::FileFormat::Toml),
            );
        }

        // Override with environment variables (prefixed with TRACKSYNC_)
        settings = settings.add_source(
            config::Environment::with_prefix("TRACKSYNC")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extensions"),
        );

        let config = settings
            .build()
            .map_err(|e| SyncError::config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SyncError::config(e.to_string()))
    }

    /// Apply flags given on the command line
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(input) = &cli.input {
            self.input = input.clone();
        }
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(hash_length) = cli.hash_length {
            self.hash_length = hash_length;
        }
        if cli.dry_run {
            self.dry_run = true;
        }
        if let Some(verbosity) = cli.verbosity {
            self.verbosity = verbosity;
        }
        if cli.disable_cache {
            self.cache_enabled = false;
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = (!log_file.is_empty()).then(|| PathBuf::from(log_file));
        }
        if cli.skip_input_caching {
            self.source_cache_reads = false;
        }
        if cli.keep_empty_directories {
            self.keep_empty_directories = true;
        }
        if let Some(cache_file) = &cli.cache_file {
            self.cache_file = cache_file.clone();
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(hash_algorithm) = cli.hash_algorithm {
            self.hash_algorithm = hash_algorithm;
        }
        if let Some(extensions) = &cli.extensions {
            self.extensions = extensions.clone();
        }
    }

    /// Load from the file named on the command line, then apply its flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Self::load(&cli.config)?;
        config.merge_cli(cli);
        Ok(config)
    }

    /// Write this configuration to `path` as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SyncError::config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.hash_length == 0 || self.hash_length > MAX_HASH_LENGTH {
            return Err(SyncError::config(format!(
                "hash_length must be between 1 and {}, got {}",
                MAX_HASH_LENGTH, self.hash_length
            )));
        }

        if self.workers == 0 {
            return Err(SyncError::config("workers must be at least 1"));
        }

        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(SyncError::config("at least one extension is required"));
        }

        if !self.input.is_dir() {
            return Err(SyncError::config(format!(
                "input directory {} does not exist",
                self.input.display()
            )));
        }

        let input = self.input.canonicalize()?;
        let output = absolute(&self.output)?;
        if input == output {
            return Err(SyncError::config("input and output must be different directories"));
        }
        if output.starts_with(&input) {
            return Err(SyncError::config(format!(
                "output {} must not be inside input {}",
                output.display(),
                input.display()
            )));
        }

        Ok(())
    }

    /// Cache file location with relative paths resolved against `output`
    pub fn cache_path(&self) -> PathBuf {
        self.output.join(&self.cache_file)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            enabled: self.cache_enabled,
            read_source: self.source_cache_reads,
            hash_strategy: self.hash_algorithm,
        }
    }

    pub fn reconcile_config(&self) -> ReconcileConfig {
        let mut reconcile = ReconcileConfig::new(&self.input, &self.output);
        reconcile.hash_length = self.hash_length;
        reconcile.dry_run = self.dry_run;
        reconcile.keep_empty_directories = self.keep_empty_directories;
        reconcile.workers = self.workers;
        reconcile.extensions = self.extensions.clone();
        reconcile
    }
}

/// Absolute form of `path`, resolving symlinks in its longest existing prefix
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = path.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(path),
        }
    }

    let mut resolved = existing.canonicalize()?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

// Default values
fn default_input() -> PathBuf {
    PathBuf::from("./input_music")
}

fn default_output() -> PathBuf {
    PathBuf::from("./organized_music")
}

fn default_hash_length() -> usize {
    4
}

fn default_verbosity() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("tracksync.log"))
}

/// TOML has no null, so an absent path round-trips through an empty string
mod optional_path {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::path::PathBuf;

    pub fn serialize<S: Serializer>(
        value: &Option<PathBuf>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(path) => path.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PathBuf>, D::Error> {
        let path = Option::<PathBuf>::deserialize(deserializer)?;
        Ok(path.filter(|path| !path.as_os_str().is_empty()))
    }
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("hashcache.sqlite")
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_extensions() -> Vec<String> {
    vec!["flac".to_string()]
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            hash_length: default_hash_length(),
            dry_run: false,
            verbosity: default_verbosity(),
            cache_enabled: true,
            source_cache_reads: true,
            keep_empty_directories: false,
            log_file: default_log_file(),
            cache_file: default_cache_file(),
            workers: default_workers(),
            hash_algorithm: HashStrategy::default(),
            extensions: default_extensions(),
        }
    }
}
