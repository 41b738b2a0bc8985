//! Preference-store StorageBackend implementation.
//!
//! Mirrors the lightweight string key-value stores game engines expose for
//! settings: every (profile, key) pair becomes one entry named
//! `"{profile}/{key}"`, and values are stored as hex text.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::profile::{
    COMPOSITE_SEPARATOR, ProfileId, composite_key, split_composite_key, validate_key,
};

type Entries = BTreeMap<String, String>;

/// Single-document preference store.
///
/// The whole document is held in memory and rewritten (temp file + rename)
/// after every mutation.
pub struct PreferencesBackend {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl PreferencesBackend {
    /// Open the preferences document at `path`, creating an empty store if the
    /// file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Entries>(&bytes)
                .map_err(|e| StorageError::CorruptedPreferences(e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        tracing::debug!(
            "Opened preferences at {} with {} entries",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries_mut(&self) -> Result<RwLockWriteGuard<'_, Entries>> {
        self.entries.write().map_err(|_| StorageError::LockPoisoned)
    }

    fn persist(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn profile_prefix(profile: &ProfileId) -> String {
        format!("{}{}", profile.as_str(), COMPOSITE_SEPARATOR)
    }
}

impl StorageBackend for PreferencesBackend {
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.contains_key(&composite_key(profile, key)))
    }

    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        let composite = composite_key(profile, key);

        let encoded = entries
            .get(&composite)
            .ok_or_else(|| StorageError::not_found(profile.as_str(), key))?;

        // A mangled entry is a bad record, not a bad document.
        hex::decode(encoded).map_err(|e| StorageError::Deserialization {
            key: key.to_string(),
            reason: format!("invalid hex in preference entry '{}': {}", composite, e),
        })
    }

    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut entries = self.entries_mut()?;
        let composite = composite_key(profile, key);
        let previous = entries.insert(composite.clone(), hex::encode(bytes));

        if let Err(e) = self.persist(&entries) {
            // Keep memory in step with the document on disk.
            match previous {
                Some(old) => entries.insert(composite, old),
                None => entries.remove(&composite),
            };
            return Err(e);
        }

        tracing::debug!("Saved preference entry {}", composite);
        Ok(())
    }

    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut entries = self.entries_mut()?;
        let composite = composite_key(profile, key);

        let Some(old) = entries.remove(&composite) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&entries) {
            entries.insert(composite, old);
            return Err(e);
        }

        Ok(true)
    }

    fn delete_profile(&self, profile: &ProfileId) -> Result<()> {
        let mut entries = self.entries_mut()?;
        let prefix = Self::profile_prefix(profile);

        let doomed: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return Ok(());
        }

        let snapshot = entries.clone();
        for key in &doomed {
            entries.remove(key);
        }

        if let Err(e) = self.persist(&entries) {
            *entries = snapshot;
            return Err(e);
        }

        tracing::info!(
            "Deleted {} preference entries for profile {}",
            doomed.len(),
            profile
        );
        Ok(())
    }

    fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;

        let mut profiles: Vec<ProfileId> = entries
            .keys()
            .filter_map(|k| split_composite_key(k))
            .filter_map(|(profile, _)| ProfileId::new(profile).ok())
            .collect();
        profiles.sort();
        profiles.dedup();
        Ok(profiles)
    }

    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        let prefix = Self::profile_prefix(profile);

        Ok(entries
            .keys()
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "preferences"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile(id: &str) -> ProfileId {
        ProfileId::new(id).unwrap()
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        let main = profile("main");

        {
            let backend = PreferencesBackend::open(&path).unwrap();
            backend.write(&main, "GameData", &[0, 159, 255]).unwrap();
        }

        let backend = PreferencesBackend::open(&path).unwrap();
        assert_eq!(backend.read(&main, "GameData").unwrap(), vec![0, 159, 255]);
    }

    #[test]
    fn test_document_uses_composite_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        let backend = PreferencesBackend::open(&path).unwrap();

        backend.write(&profile("main"), "GameData", b"hi").unwrap();

        let doc: BTreeMap<String, String> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc.get("main/GameData").map(String::as_str), Some("6869"));
    }

    #[test]
    fn test_profiles_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let backend = PreferencesBackend::open(temp_dir.path().join("prefs.json")).unwrap();
        let (a, b) = (profile("a"), profile("b"));

        backend.write(&a, "GameData", b"from a").unwrap();
        assert!(!backend.exists(&b, "GameData").unwrap());

        backend.write(&b, "GameData", b"from b").unwrap();
        assert_eq!(backend.read(&a, "GameData").unwrap(), b"from a");
        assert_eq!(backend.read(&b, "GameData").unwrap(), b"from b");
    }

    #[test]
    fn test_profile_prefix_does_not_match_longer_ids() {
        let temp_dir = TempDir::new().unwrap();
        let backend = PreferencesBackend::open(temp_dir.path().join("prefs.json")).unwrap();
        let (main, main2) = (profile("main"), profile("main2"));

        backend.write(&main, "GameData", b"1").unwrap();
        backend.write(&main2, "GameData", b"2").unwrap();
        backend.delete_profile(&main).unwrap();

        assert!(!backend.exists(&main, "GameData").unwrap());
        assert!(backend.exists(&main2, "GameData").unwrap());
        assert_eq!(backend.list_profiles().unwrap(), vec![main2.clone()]);
        assert_eq!(backend.list_keys(&main2).unwrap(), vec!["GameData".to_string()]);
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, b"[1, 2").unwrap();

        let err = PreferencesBackend::open(&path).err().unwrap();
        assert!(matches!(err, StorageError::CorruptedPreferences(_)));
    }

    #[test]
    fn test_invalid_hex_entry_is_a_record_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, br#"{"main/Counter": "zz-not-hex"}"#).unwrap();

        let backend = PreferencesBackend::open(&path).unwrap();
        let err = backend.read(&profile("main"), "Counter").unwrap_err();
        assert!(matches!(err, StorageError::Deserialization { ref key, .. } if key == "Counter"));
    }

    #[test]
    fn test_failed_persist_rolls_back_memory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("prefs");
        let path = dir.join("prefs.json");
        let main = profile("main");

        let backend = PreferencesBackend::open(&path).unwrap();
        backend.write(&main, "GameData", b"old").unwrap();
        let on_disk = fs::read(&path).unwrap();

        // Every persist now fails: the temp file has no directory to land in.
        fs::remove_dir_all(&dir).unwrap();

        assert!(backend.write(&main, "GameData", b"new").is_err());
        assert!(backend.write(&main, "Settings", b"new").is_err());
        assert_eq!(backend.read(&main, "GameData").unwrap(), b"old");
        assert!(!backend.exists(&main, "Settings").unwrap());

        assert!(backend.delete(&main, "GameData").is_err());
        assert!(backend.exists(&main, "GameData").unwrap());

        assert!(backend.delete_profile(&main).is_err());
        assert_eq!(backend.list_keys(&main).unwrap(), vec!["GameData".to_string()]);

        // Once the directory is back, memory and the document agree again.
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, &on_disk).unwrap();
        let reopened = PreferencesBackend::open(&path).unwrap();
        assert_eq!(
            reopened.list_keys(&main).unwrap(),
            backend.list_keys(&main).unwrap()
        );
        assert_eq!(reopened.read(&main, "GameData").unwrap(), b"old");
    }

    #[test]
    fn test_delete_missing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let backend = PreferencesBackend::open(temp_dir.path().join("prefs.json")).unwrap();

        assert!(!backend.delete(&profile("main"), "GameData").unwrap());
        backend.delete_profile(&profile("ghost")).unwrap();
    }
}
