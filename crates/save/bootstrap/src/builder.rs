//! Builds the storage backend and registry described by a [`SaveConfig`].
use anyhow::{Context, Result};
use save_core::{
    BackendKind, FileBackend, PreferencesBackend, ProfileId, SaveRegistry, StorageBackend,
};

use crate::config::SaveConfig;

/// Registry over whichever backend the configuration selected.
pub type DynRegistry = SaveRegistry<Box<dyn StorageBackend>>;

/// Builder that assembles a backend and registry for a host application.
pub struct RegistryBuilder {
    config: SaveConfig,
    backend: Option<Box<dyn StorageBackend>>,
}

impl RegistryBuilder {
    pub fn new(config: SaveConfig) -> Self {
        Self {
            config,
            backend: None,
        }
    }

    /// Provide a custom backend instead of the configured one (e.g., in tests).
    pub fn backend(mut self, backend: impl StorageBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn build(self) -> Result<DynRegistry> {
        let profile = ProfileId::new(self.config.profile.clone())
            .with_context(|| format!("Invalid profile id '{}'", self.config.profile))?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => open_backend(&self.config)?,
        };

        tracing::info!(
            "Save registry ready: backend={} profile={} format={}",
            backend.name(),
            profile,
            self.config.format
        );

        Ok(SaveRegistry::with_options(
            backend,
            profile,
            self.config.registry_options(),
        ))
    }
}

/// Open the storage medium selected by `config.backend`.
pub fn open_backend(config: &SaveConfig) -> Result<Box<dyn StorageBackend>> {
    let backend: Box<dyn StorageBackend> = match config.backend {
        BackendKind::File => {
            let root = config.data_root();
            let backend = FileBackend::with_extension(&root, config.format.extension())
                .with_context(|| format!("Failed to open save directory: {}", root.display()))?;
            Box::new(backend)
        }
        BackendKind::Preferences => {
            let path = config.preferences_path();
            let backend = PreferencesBackend::open(&path)
                .with_context(|| format!("Failed to open preferences: {}", path.display()))?;
            Box::new(backend)
        }
    };

    Ok(backend)
}
