//! File-based StorageBackend implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::profile::{ProfileId, validate_key};

const TEMP_SUFFIX: &str = "tmp";

/// File-based implementation of StorageBackend.
///
/// # Layout
///
/// ```text
/// {root}/
///   ├── {profile}/
///   │   ├── {key}.{extension}
///   │   └── ...
///   └── ...
/// ```
///
/// Writes go to `{key}.{extension}.tmp` and are renamed over the target, so a
/// crash mid-write leaves the previous version intact.
pub struct FileBackend {
    root: PathBuf,
    extension: String,
}

impl FileBackend {
    /// Create a file backend rooted at `root` storing `.json` files.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_extension(root, "json")
    }

    /// Create a file backend with a custom record file extension.
    pub fn with_extension(root: impl AsRef<Path>, extension: impl Into<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        tracing::debug!("File backend rooted at {}", root.display());

        Ok(Self {
            root,
            extension: extension.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_dir(&self, profile: &ProfileId) -> PathBuf {
        self.root.join(profile.as_str())
    }

    fn record_path(&self, profile: &ProfileId, key: &str) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}.{}", key, self.extension))
    }
}

impl StorageBackend for FileBackend {
    fn exists(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.record_path(profile, key).is_file())
    }

    fn read(&self, profile: &ProfileId, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        let path = self.record_path(profile, key);

        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::not_found(profile.as_str(), key))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn write(&self, profile: &ProfileId, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        fs::create_dir_all(self.profile_dir(profile))?;

        let path = self.record_path(profile, key);
        let temp_path = path.with_extension(format!("{}.{}", self.extension, TEMP_SUFFIX));

        fs::write(&temp_path, bytes)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved record[{}/{}] to {}", profile, key, path.display());

        Ok(())
    }

    fn delete(&self, profile: &ProfileId, key: &str) -> Result<bool> {
        validate_key(key)?;
        let path = self.record_path(profile, key);

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted record[{}/{}]", profile, key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn delete_profile(&self, profile: &ProfileId) -> Result<()> {
        let dir = self.profile_dir(profile);

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!("Deleted profile directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            if let Some(name) = entry.file_name().to_str()
                && let Ok(profile) = ProfileId::new(name)
                && !self.list_keys(&profile)?.is_empty()
            {
                profiles.push(profile);
            }
        }

        profiles.sort();
        Ok(profiles)
    }

    fn list_keys(&self, profile: &ProfileId) -> Result<Vec<String>> {
        let dir = self.profile_dir(profile);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let suffix = format!(".{}", self.extension);
        let mut keys = Vec::new();

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(key) = filename.strip_suffix(suffix.as_str())
                && validate_key(key).is_ok()
            {
                keys.push(key.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &str {
        "file"
    }
}
