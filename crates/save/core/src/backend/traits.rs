//! Backend contract for persisting record bytes.

use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::profile::ProfileId;

/// Storage medium for serialized records, addressed by (profile, key).
///
/// Calls are blocking and expected to be cheap enough for a frame budget.
/// Nothing coordinates separate processes writing the same profile: the last
/// writer wins.
pub trait StorageBackend: Send + Sync {
    /// Check whether bytes are stored for `key` under `profile`.
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool>;

    /// Read the stored bytes.
    ///
    /// Fails with [`StorageError::NotFound`] if nothing is stored.
    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>>;

    /// Store bytes, replacing any previous value.
    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a single record. Returns `true` if something was removed.
    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool>;

    /// Remove every record under `profile`. Deleting an absent profile is a no-op.
    fn delete_profile(&self, profile: &ProfileId) -> Result<()>;

    /// List profiles that currently hold at least one record, sorted.
    fn list_profiles(&self) -> Result<Vec<ProfileId>>;

    /// List record keys stored under `profile`, sorted.
    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Read the stored bytes, mapping "not stored" to `None`.
    fn read_optional(&self, profile: &ProfileId, key: &str) -> Result<Option<Vec<u8>>> {
        match self.read(profile, key) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        (**self).exists(profile, key)
    }

    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>> {
        (**self).read(profile, key)
    }

    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).write(profile, key, bytes)
    }

    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        (**self).delete(profile, key)
    }

    fn delete_profile(&self, profile: &ProfileId) -> Result<()> {
        (**self).delete_profile(profile)
    }

    fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        (**self).list_profiles()
    }

    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>> {
        (**self).list_keys(profile)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        (**self).exists(profile, key)
    }

    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>> {
        (**self).read(profile, key)
    }

    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).write(profile, key, bytes)
    }

    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        (**self).delete(profile, key)
    }

    fn delete_profile(&self, profile: &ProfileId) -> Result<()> {
        (**self).delete_profile(profile)
    }

    fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        (**self).list_profiles()
    }

    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>> {
        (**self).list_keys(profile)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
