//! Profile identifiers and record-key validation.
//!
//! Profile ids and record keys end up as directory and file names in the file
//! backend and as halves of a `"{profile}/{key}"` composite in the preference
//! store, so both are restricted to a conservative character set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Maximum length in bytes of a profile id or record key.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Separator between profile id and record key in composite keys.
pub(crate) const COMPOSITE_SEPARATOR: char = '/';

/// Namespace for records; one profile is one independent save slot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    /// Validate and wrap a profile id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self("main".to_string())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProfileId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

/// Validate a record key with the same rules as profile ids.
pub fn validate_key(key: &str) -> Result<()> {
    validate_identifier(key)
}

fn validate_identifier(value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.len() > MAX_IDENTIFIER_LEN {
        Some("longer than 64 bytes")
    } else if value == "." || value == ".." {
        Some("reserved path component")
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Some("only ASCII letters, digits, '_', '-' and '.' are allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageError::InvalidIdentifier {
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Join a profile id and record key into a single preference-store key.
pub(crate) fn composite_key(profile: &ProfileId, key: &str) -> String {
    format!("{}{}{}", profile.as_str(), COMPOSITE_SEPARATOR, key)
}

/// Split a composite key produced by [`composite_key`].
pub(crate) fn split_composite_key(composite: &str) -> Option<(&str, &str)> {
    composite.split_once(COMPOSITE_SEPARATOR)
}
