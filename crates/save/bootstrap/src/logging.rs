//! Tracing subscriber setup for hosts embedding the save layer.
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_NAME: &str = "save.log";

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Level applied on top of `RUST_LOG` directives.
    pub level: tracing::Level,
    /// Also write logs to `{log_dir}/save.log`.
    pub log_to_file: bool,
    /// Directory for the log file; platform cache dir when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            log_to_file: false,
            log_dir: None,
        }
    }
}

/// Install the global subscriber: stderr always, plus a log file if enabled.
///
/// Returns the file writer guard when file logging is on; keep it alive for as
/// long as logs should be flushed.
pub fn init_logging(config: &LoggingConfig, app_name: &str) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard, log_dir) = if config.log_to_file {
        let log_dir = config
            .log_dir
            .clone()
            .unwrap_or_else(|| crate::dirs::log_dir(app_name));
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_file)
            .with_ansi(false);

        (Some(layer), Some(guard), Some(log_dir))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized: app={}", app_name);
    if let Some(dir) = log_dir {
        tracing::info!("Log file: {}/{}", dir.display(), LOG_FILE_NAME);
    }

    Ok(guard)
}
