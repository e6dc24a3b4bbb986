//! Logging setup for the `stack-probe` binary
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`], a stderr
//! formatter, and optionally a non-blocking file writer. `RUST_LOG` takes
//! precedence over the configured filter.

use crate::config::LoggingConfig;
use crate::error::{ProbeError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `config.filter`
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| ProbeError::Config(format!("Invalid log filter {:?}: {}", config.filter, e)))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be kept
/// alive for the life of the program.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(config)?;

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                ProbeError::Config(format!("Log file {:?} has no file name", path))
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| ProbeError::Config(format!("Failed to set logger: {}", e)))?;

    Ok(guard)
}
