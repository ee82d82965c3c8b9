//! Configuration layering and validation tests

use clap::Parser;
use std::path::PathBuf;
use tempfile::TempDir;
use tracksync_cli::{Cli, SyncConfig};
use tracksync_core::{HashStrategy, SyncError};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tracksync").chain(args.iter().copied()))
        .expect("arguments should parse")
}

fn dirs() -> (TempDir, PathBuf, PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    (temp, input, output)
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp = tempfile::tempdir().unwrap();

    let config = SyncConfig::load(&temp.path().join("absent.toml")).unwrap();

    assert_eq!(config.hash_length, 4);
    assert_eq!(config.verbosity, 1);
    assert!(config.cache_enabled);
    assert!(config.source_cache_reads);
    assert!(!config.dry_run);
    assert!(!config.keep_empty_directories);
    assert_eq!(config.cache_file, PathBuf::from("hashcache.sqlite"));
    assert_eq!(config.log_file, Some(PathBuf::from("tracksync.log")));
    assert_eq!(config.hash_algorithm, HashStrategy::Blake3);
    assert_eq!(config.extensions, vec!["flac".to_string()]);
    assert!(config.workers >= 1);
}

#[test]
fn test_file_values_override_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("tracksync.toml");
    std::fs::write(
        &path,
        r#"
input = "/music/in"
output = "/music/out"
hash_length = 8
dry_run = true
hash_algorithm = "sha256"
extensions = ["flac", "mp3"]
"#,
    )
    .unwrap();

    let config = SyncConfig::load(&path).unwrap();

    assert_eq!(config.input, PathBuf::from("/music/in"));
    assert_eq!(config.output, PathBuf::from("/music/out"));
    assert_eq!(config.hash_length, 8);
    assert!(config.dry_run);
    assert_eq!(config.hash_algorithm, HashStrategy::Sha256);
    assert_eq!(config.extensions, vec!["flac".to_string(), "mp3".to_string()]);
    assert_eq!(config.verbosity, 1);
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("tracksync.toml");
    std::fs::write(&path, "hash_length = \"many\"").unwrap();

    let result = SyncConfig::load(&path);

    assert!(matches!(result, Err(SyncError::Config(_))));
}

#[test]
fn test_flags_override_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("tracksync.toml");
    std::fs::write(&path, "hash_length = 8\nverbosity = 0\n").unwrap();
    let config_arg = path.to_string_lossy().into_owned();

    let cli = parse(&[
        "--config",
        &config_arg,
        "-l",
        "6",
        "-C",
        "--skip-input-caching",
        "--keep-empty-directories",
        "--hash-algorithm",
        "sha256",
        "--extensions",
        "flac,ogg",
        "-j",
        "3",
        "--log-file",
        "",
    ]);
    let config = SyncConfig::from_cli(&cli).unwrap();

    assert_eq!(config.hash_length, 6);
    assert_eq!(config.verbosity, 0);
    assert!(!config.cache_enabled);
    assert!(!config.source_cache_reads);
    assert!(config.keep_empty_directories);
    assert_eq!(config.hash_algorithm, HashStrategy::Sha256);
    assert_eq!(config.extensions, vec!["flac".to_string(), "ogg".to_string()]);
    assert_eq!(config.workers, 3);
    assert_eq!(config.log_file, None);
}

#[test]
fn test_absent_flags_keep_file_values() {
    let mut config = SyncConfig {
        dry_run: true,
        keep_empty_directories: true,
        ..SyncConfig::default()
    };

    config.merge_cli(&parse(&[]));

    assert!(config.dry_run);
    assert!(config.keep_empty_directories);
}

#[test]
fn test_save_then_load_round_trips() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nested/tracksync.toml");
    let config = SyncConfig {
        input: PathBuf::from("/a"),
        output: PathBuf::from("/b"),
        hash_length: 5,
        workers: 2,
        hash_algorithm: HashStrategy::Sha256,
        ..SyncConfig::default()
    };

    config.save(&path).unwrap();
    let loaded = SyncConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_disabled_log_file_survives_save_and_load() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("tracksync.toml");
    let config = SyncConfig {
        log_file: None,
        ..SyncConfig::default()
    };

    config.save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let loaded = SyncConfig::load(&path).unwrap();

    assert!(text.contains("log_file = \"\""));
    assert_eq!(loaded.log_file, None);
    assert_eq!(loaded, config);
}

#[test]
fn test_cache_path_is_relative_to_output() {
    let config = SyncConfig {
        output: PathBuf::from("/music/out"),
        ..SyncConfig::default()
    };
    assert_eq!(config.cache_path(), PathBuf::from("/music/out/hashcache.sqlite"));

    let absolute = SyncConfig {
        cache_file: PathBuf::from("/var/cache/tracksync.sqlite"),
        ..config
    };
    assert_eq!(
        absolute.cache_path(),
        PathBuf::from("/var/cache/tracksync.sqlite")
    );
}

#[test]
fn test_validate_accepts_sane_config() {
    let (_temp, input, output) = dirs();
    let config = SyncConfig {
        input,
        output,
        ..SyncConfig::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_hash_length() {
    let (_temp, input, output) = dirs();
    for hash_length in [0, 33] {
        let config = SyncConfig {
            input: input.clone(),
            output: output.clone(),
            hash_length,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }
}

#[test]
fn test_validate_rejects_zero_workers() {
    let (_temp, input, output) = dirs();
    let config = SyncConfig {
        input,
        output,
        workers: 0,
        ..SyncConfig::default()
    };

    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn test_validate_rejects_overlapping_roots() {
    let (_temp, input, _output) = dirs();

    let same = SyncConfig {
        input: input.clone(),
        output: input.join("."),
        ..SyncConfig::default()
    };
    assert!(matches!(same.validate(), Err(SyncError::Config(_))));

    let nested = SyncConfig {
        input: input.clone(),
        output: input.join("organised/music"),
        ..SyncConfig::default()
    };
    assert!(matches!(nested.validate(), Err(SyncError::Config(_))));
}

#[test]
fn test_validate_rejects_missing_input() {
    let (temp, _input, output) = dirs();
    let config = SyncConfig {
        input: temp.path().join("nope"),
        output,
        ..SyncConfig::default()
    };

    assert!(matches!(config.validate(), Err(SyncError::Config(_))));
}

#[test]
fn test_reconcile_config_carries_settings() {
    let config = SyncConfig {
        input: PathBuf::from("/in"),
        output: PathBuf::from("/out"),
        hash_length: 7,
        dry_run: true,
        keep_empty_directories: true,
        workers: 2,
        ..SyncConfig::default()
    };

    let reconcile = config.reconcile_config();

    assert_eq!(reconcile.input_root, PathBuf::from("/in"));
    assert_eq!(reconcile.output_root, PathBuf::from("/out"));
    assert_eq!(reconcile.hash_length, 7);
    assert!(reconcile.dry_run);
    assert!(reconcile.keep_empty_directories);
    assert_eq!(reconcile.workers, 2);
}
