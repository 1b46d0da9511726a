//! Logging initialization for the binary
//!
//! `RUST_LOG` wins over the configured level, which wins over the default
//! of `info`. Logs go to stderr, or to [`log_path`] when file logging is
//! enabled.

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, log_path};

const DEFAULT_FILTER: &str = "info";

fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_FILTER)))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held
/// until the program exits.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = env_filter(config.level.as_deref());

    if config.file {
        let path = log_path();
        let dir = path
            .parent()
            .context("log path has no parent directory")?
            .to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;
        let file_name = path
            .file_name()
            .context("log path has no file name")?
            .to_os_string();

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()
            .context("Failed to install logger")?;
        return Ok(Some(guard));
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .try_init()
        .context("Failed to install logger")?;
    Ok(None)
}
