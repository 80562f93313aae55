//! Tracing setup: JSON lines to a file under the data directory

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "NPM_OUTDATED_LOG";

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber writing to `log_file`.
///
/// Keep the returned guard alive for the whole program; dropping it flushes
/// and stops the background writer.
pub fn init(log_file: &Path) -> anyhow::Result<WorkerGuard> {
    let directory = log_file
        .parent()
        .context("Log file path has no parent directory")?;
    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {directory:?}"))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(std::env::var(LOG_ENV).ok().as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Filter from the given directives, falling back to `info` when unset or invalid
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
