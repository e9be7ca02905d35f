//! Observability infrastructure: tracing and metric descriptions.
//!
//! The sidecar's output is collected from a fixed log file by the launcher,
//! so the fmt layer writes there instead of stdout.

use crate::config::Config;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;

/// Build the log filter: `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber.
///
/// Logs are appended to `config.log_file`. When the file cannot be opened
/// the subscriber falls back to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = tracing_subscriber::registry().with(env_filter(&config.log_level));

    match open_log_file(Path::new(&config.log_file)) {
        Ok(file) => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        Err(e) => {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
                .try_init()?;
            tracing::warn!(path = %config.log_file, error = %e, "failed to open log file, logging to stderr");
        }
    }

    metrics::register_metrics();
    tracing::info!(log_file = %config.log_file, "Observability initialized");
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
