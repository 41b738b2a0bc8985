//! Error types raised by storage backends and the record registry.

use thiserror::Error;

/// Errors surfaced by backends, codecs, and the registry.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no record '{key}' stored for profile '{profile}'")]
    NotFound { profile: String, key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("failed to decode record '{key}': {reason}")]
    Deserialization { key: String, reason: String },

    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: &'static str },

    #[error("record key '{key}' is already claimed by another record type")]
    KeyConflict { key: String },

    #[error("corrupted preferences document: {0}")]
    CorruptedPreferences(String),

    #[error("storage backend lock was poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub(crate) fn not_found(profile: &str, key: &str) -> Self {
        Self::NotFound {
            profile: profile.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether this error only means "nothing persisted yet".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
