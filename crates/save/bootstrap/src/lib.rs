//! Shared bootstrap utilities for hosts embedding the save layer.
//!
//! Provides configuration loading, platform directories, logging setup, and
//! registry assembly so a game only has to call [`bootstrap`] once at startup.
pub mod builder;
pub mod config;
pub mod dirs;
pub mod logging;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

pub use builder::{DynRegistry, RegistryBuilder, open_backend};
pub use config::SaveConfig;
pub use logging::{LoggingConfig, init_logging};

/// Everything a host needs after startup.
pub struct SaveSetup {
    pub config: SaveConfig,
    pub registry: DynRegistry,
    /// Keeps the log file writer alive; `None` when file logging is off.
    pub log_guard: Option<WorkerGuard>,
}

/// Load `.env` and the environment, install logging, and build the registry.
pub fn bootstrap() -> Result<SaveSetup> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SaveConfig::from_env();
    let log_guard = init_logging(&config.logging, &config.app_name)?;
    let registry = RegistryBuilder::new(config.clone()).build()?;

    Ok(SaveSetup {
        config,
        registry,
        log_guard,
    })
}
