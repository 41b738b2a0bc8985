//! Save-layer configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use save_core::{BackendKind, CorruptRecordPolicy, Format, RegistryOptions};

use crate::logging::LoggingConfig;

pub const DEFAULT_APP_NAME: &str = "save-data";
pub const DEFAULT_PROFILE: &str = "main";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Configuration required to assemble a save registry.
#[derive(Clone, Debug)]
pub struct SaveConfig {
    pub app_name: String,
    pub backend: BackendKind,
    pub format: Format,
    pub data_dir: Option<PathBuf>,
    pub profile: String,
    pub on_corrupt: CorruptRecordPolicy,
    pub logging: LoggingConfig,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            backend: BackendKind::default(),
            format: Format::default(),
            data_dir: None,
            profile: DEFAULT_PROFILE.to_string(),
            on_corrupt: CorruptRecordPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SaveConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SAVE_APP_NAME` - Name used for platform directories (default: save-data)
    /// - `SAVE_BACKEND` - `file` or `preferences` (default: file)
    /// - `SAVE_FORMAT` - `json` or `bincode` (default: json)
    /// - `SAVE_DATA_DIR` - Root directory for save data (default: platform-specific)
    /// - `SAVE_PROFILE` - Active profile id (default: main)
    /// - `SAVE_RESET_CORRUPT` - Replace undecodable records with defaults (default: false)
    /// - `SAVE_LOG_LEVEL` - Minimum log level (default: info)
    /// - `SAVE_LOG_FILE` - Also log to a file in the platform cache dir (default: false)
    ///
    /// Unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup("SAVE_APP_NAME").filter(|n| !n.trim().is_empty()) {
            config.app_name = name;
        }

        if let Some(backend) = parse(&lookup, "SAVE_BACKEND") {
            config.backend = backend;
        }

        if let Some(format) = parse(&lookup, "SAVE_FORMAT") {
            config.format = format;
        }

        config.data_dir = lookup("SAVE_DATA_DIR").map(PathBuf::from);

        if let Some(profile) = lookup("SAVE_PROFILE") {
            config.profile = profile;
        }

        if read_flag(&lookup, "SAVE_RESET_CORRUPT") {
            config.on_corrupt = CorruptRecordPolicy::ResetToDefault;
        }

        if let Some(level) = parse(&lookup, "SAVE_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.logging.log_to_file = read_flag(&lookup, "SAVE_LOG_FILE");

        config
    }

    /// Root directory for save data, resolved against platform defaults.
    pub fn data_root(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| crate::dirs::data_dir(&self.app_name))
    }

    /// Location of the preferences document used by the preferences backend.
    pub fn preferences_path(&self) -> PathBuf {
        self.data_root().join(PREFERENCES_FILE_NAME)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            format: self.format,
            on_corrupt: self.on_corrupt,
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}

/// A flag is on when set to `true`, or set to anything other than `false`.
fn read_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    if let Some(enable) = parse::<bool>(lookup, key) {
        enable
    } else {
        // Also accept just setting the variable without value as "true"
        lookup(key).is_some()
    }
}
