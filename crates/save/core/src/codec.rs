//! Record encodings.
//!
//! JSON is the default: it is human-readable and tolerant of added fields.
//! Bincode trades that for compact output.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StorageError};

/// Wire format used to turn records into bytes.
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
pub enum Format {
    /// Pretty-printed UTF-8 JSON
    #[default]
    Json,
    /// bincode 1.x binary encoding
    Bincode,
}

impl Format {
    /// File extension used by the file backend for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Bincode => "bin",
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Format::Json => serde_json::to_vec_pretty(value)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Format::Bincode => {
                bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
            }
        }
    }

    /// Decode bytes stored under `key`; the key is only used for error context.
    pub fn decode<T: DeserializeOwned>(self, key: &str, bytes: &[u8]) -> Result<T> {
        let decoded = match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            Format::Bincode => bincode::deserialize(bytes).map_err(|e| e.to_string()),
        };

        decoded.map_err(|reason| StorageError::Deserialization {
            key: key.to_string(),
            reason,
        })
    }
}
