//! tracksync command line application
//!
//! Keeps an organised copy of an audio library in sync with its source.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod progress;

pub use app::run_sync;
pub use cli::Cli;
pub use config::SyncConfig;
