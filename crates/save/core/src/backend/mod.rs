//! Storage backends for serialized records.
//!
//! Backends only move bytes: they know nothing about record types or
//! encodings. Every blob is addressed by a (profile, key) pair.
//!
//! - [`FileBackend`] keeps one directory per profile, one file per record
//! - [`PreferencesBackend`] keeps every pair in a single key-value document
//! - [`InMemoryBackend`] is for tests and throwaway sessions

mod file;
mod memory;
mod preferences;
mod traits;

pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use preferences::PreferencesBackend;
pub use traits::StorageBackend;

/// Storage medium selected once at setup time.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BackendKind {
    /// Lightweight key-value preference document
    #[strum(to_string = "preferences", serialize = "prefs")]
    Preferences,
    /// One file per record under a per-profile directory
    #[default]
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("file".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert_eq!(
            "Preferences".parse::<BackendKind>().unwrap(),
            BackendKind::Preferences
        );
        assert_eq!(
            "prefs".parse::<BackendKind>().unwrap(),
            BackendKind::Preferences
        );
        assert!("cloud".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Preferences.to_string(), "preferences");
    }
}
