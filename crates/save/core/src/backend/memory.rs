//! In-memory StorageBackend implementation for tests and throwaway sessions.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::profile::{ProfileId, validate_key};

type Slot = (ProfileId, String);

/// In-memory implementation of StorageBackend.
///
/// Thread-safe but not persistent across process restarts.
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<Slot, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total number of stored records across all profiles.
    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.contains_key(&(profile.clone(), key.to_string())))
    }

    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        records
            .get(&(profile.clone(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(profile.as_str(), key))
    }

    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        records.insert((profile.clone(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(records
            .remove(&(profile.clone(), key.to_string()))
            .is_some())
    }

    fn delete_profile(&self, profile: &ProfileId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        records.retain(|(owner, _), _| owner != profile);
        Ok(())
    }

    fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        let mut profiles: Vec<ProfileId> = records.keys().map(|(p, _)| p.clone()).collect();
        profiles.dedup();
        Ok(profiles)
    }

    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(records
            .keys()
            .filter(|(owner, _)| owner == profile)
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
