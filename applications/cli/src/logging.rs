/// Logging setup
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a verbosity level
///
/// 0 shows warnings and errors, 1 adds progress information, 2 and above
/// include per-file debug output.
pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,sqlx=warn",
        _ => "debug,sqlx=info",
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `verbosity`. When `log_file` is given,
/// a second plain-text layer appends to it.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    let file_layer = match log_file.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity_directive(0), "warn");
        assert!(verbosity_directive(1).starts_with("info"));
        assert!(verbosity_directive(2).starts_with("debug"));
        assert_eq!(verbosity_directive(9), verbosity_directive(2));
    }
}
