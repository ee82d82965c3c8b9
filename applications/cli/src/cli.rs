/// Command line arguments
use clap::Parser;
use std::path::PathBuf;
use tracksync_core::HashStrategy;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./tracksync.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "tracksync")]
#[command(version, about = "Copy-sync audio files into a metadata-organised output tree", long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Write the resolved configuration back to --config
    #[arg(long)]
    pub save_config: bool,

    /// Input directory (source of truth)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output base directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of signature characters appended to file names
    #[arg(short = 'l', long)]
    pub hash_length: Option<usize>,

    /// Show actions without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Logging verbosity (0=warn, 1=info, 2=debug)
    #[arg(short, long)]
    pub verbosity: Option<u8>,

    /// Disable the fingerprint cache
    #[arg(short = 'C', long)]
    pub disable_cache: bool,

    /// Log file path; an empty value disables file logging
    #[arg(long)]
    pub log_file: Option<String>,

    /// Re-read every input file instead of trusting cached fingerprints
    #[arg(long)]
    pub skip_input_caching: bool,

    /// Leave empty directories in the output tree
    #[arg(long)]
    pub keep_empty_directories: bool,

    /// Cache file, relative to the output directory unless absolute
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Concurrent per-file tasks
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Hash used for metadata fingerprints (blake3 or sha256)
    #[arg(long)]
    pub hash_algorithm: Option<HashStrategy>,

    /// Audio file extensions to sync (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}
