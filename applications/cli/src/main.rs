/// tracksync - copy-sync audio files into a metadata-organised tree
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracksync_cli::{logging, progress::ProgressReporter, run_sync, Cli, SyncConfig};
use tracksync_engine::RunStats;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(stats) => {
            println!("---- Summary ----");
            println!("{}", stats.summary_text());
            if stats.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunStats> {
    let config = SyncConfig::from_cli(&cli)?;

    if cli.save_config {
        config.save(&cli.config)?;
    }

    logging::init(config.verbosity, config.log_file.as_deref())?;
    if cli.save_config {
        tracing::info!("Saved configuration to {}", cli.config.display());
    }

    config.validate()?;

    tracing::info!("Starting tracksync");
    tracing::info!(
        "Input: {}  Output: {}  Dry-run: {}",
        config.input.display(),
        config.output.display(),
        config.dry_run
    );

    let reporter = (!cli.no_progress).then(|| Arc::new(ProgressReporter::new(false)));
    run_sync(&config, reporter).await
}
