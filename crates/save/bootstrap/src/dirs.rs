//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

/// Get the platform-specific data directory for `app`
///
/// Follows platform conventions:
/// - macOS: `~/Library/Application Support/{app}`
/// - Linux: `~/.local/share/{app}` (or `$XDG_DATA_HOME/{app}`)
/// - Windows: `%APPDATA%\{app}`
/// - Fallback: `./save_data`
pub fn data_dir(app: &str) -> PathBuf {
    directories::ProjectDirs::from("", "", app)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

/// Get the platform-specific log directory for `app`
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/{app}/logs`
/// - Linux: `~/.cache/{app}/logs` (or `$XDG_CACHE_HOME/{app}/logs`)
/// - Windows: `%LOCALAPPDATA%\{app}\logs`
/// - Fallback: `/tmp/{app}/logs`
pub fn log_dir(app: &str) -> PathBuf {
    let base_dir = directories::ProjectDirs::from("", "", app)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(app));

    base_dir.join("logs")
}
