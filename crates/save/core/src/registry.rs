//! Registry of live record instances for the active profile.
//!
//! The registry holds at most one live instance per record type. The first
//! access reads the persisted bytes or, if nothing is stored yet, creates the
//! record's default and persists it immediately. Mutations are never written
//! implicitly: callers either batch edits through [`SaveRegistry::update`] or
//! mutate via [`SaveRegistry::instance_mut`] and commit with
//! [`SaveRegistry::save`] / [`SaveRegistry::save_dirty`].
//!
//! # Example
//!
//! ```
//! use save_core::{InMemoryBackend, ProfileId, Record, SaveRegistry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct GameData {
//!     first_open: bool,
//!     first_play: bool,
//! }
//!
//! impl Record for GameData {
//!     const KEY: &'static str = "GameData";
//! }
//!
//! let profile = ProfileId::new("main").unwrap();
//! let mut registry = SaveRegistry::new(InMemoryBackend::new(), profile);
//!
//! assert_eq!(registry.instance::<GameData>().unwrap(), &GameData::default());
//! registry.update::<GameData, _>(|data| data.first_open = true).unwrap();
//! assert!(registry.instance::<GameData>().unwrap().first_open);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::backend::StorageBackend;
use crate::codec::Format;
use crate::error::{Result, StorageError};
use crate::profile::{ProfileId, validate_key};
use crate::record::Record;

/// What to do when persisted bytes cannot be decoded into the record type.
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
pub enum CorruptRecordPolicy {
    /// Surface [`StorageError::Deserialization`] and leave the blob untouched
    #[default]
    Fail,
    /// Log a warning and overwrite the blob with the record's default
    ResetToDefault,
}

/// Registry behaviour fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    pub format: Format,
    pub on_corrupt: CorruptRecordPolicy,
}

/// Type-erased view of a live record.
trait LiveRecord: Any {
    fn key(&self) -> &'static str;
    fn encode(&self, format: Format) -> Result<Vec<u8>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Record> LiveRecord for T {
    fn key(&self) -> &'static str {
        T::KEY
    }

    fn encode(&self, format: Format) -> Result<Vec<u8>> {
        format.encode(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Slot {
    record: Box<dyn LiveRecord>,
    dirty: bool,
}

impl Slot {
    fn new<T: Record>(record: T) -> Self {
        Self {
            record: Box::new(record),
            dirty: false,
        }
    }

    fn get<T: Record>(&self) -> &T {
        self.record
            .as_any()
            .downcast_ref::<T>()
            .unwrap_or_else(|| unreachable!("slot for {} holds another type", T::KEY))
    }

    fn get_mut<T: Record>(&mut self) -> &mut T {
        self.record
            .as_any_mut()
            .downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("slot for {} holds another type", T::KEY))
    }
}

/// Per-profile registry of live records over a storage backend.
///
/// Single-threaded by construction (`&mut self` API). Several registries may
/// share a backend through `Arc`, but nothing coordinates their writes.
pub struct SaveRegistry<B: StorageBackend> {
    backend: B,
    profile: ProfileId,
    options: RegistryOptions,
    slots: HashMap<TypeId, Slot>,
    /// Record type that owns each key; outlives unloads and profile switches.
    claims: HashMap<&'static str, TypeId>,
}

impl<B: StorageBackend> SaveRegistry<B> {
    /// Create a registry with default options (JSON, fail on corrupt records).
    pub fn new(backend: B, profile: ProfileId) -> Self {
        Self::with_options(backend, profile, RegistryOptions::default())
    }

    pub fn with_options(backend: B, profile: ProfileId, options: RegistryOptions) -> Self {
        tracing::debug!(
            "Registry for profile {} on {} backend ({}, on_corrupt={})",
            profile,
            backend.name(),
            options.format,
            options.on_corrupt
        );

        Self {
            backend,
            profile,
            options,
            slots: HashMap::new(),
            claims: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Return the live instance of `T`, loading or creating it on first access.
    pub fn instance<T: Record>(&mut self) -> Result<&T> {
        Ok(self.slot::<T>()?.get::<T>())
    }

    /// Mutable access to the live instance of `T`.
    ///
    /// Marks the record dirty; nothing is written until [`Self::save`],
    /// [`Self::save_dirty`], or [`Self::save_all`].
    pub fn instance_mut<T: Record>(&mut self) -> Result<&mut T> {
        let slot = self.slot::<T>()?;
        slot.dirty = true;
        Ok(slot.get_mut::<T>())
    }

    /// Re-read `T` from the backend, discarding unsaved in-memory changes.
    pub fn load<T: Record>(&mut self) -> Result<&T> {
        let discarded = self.slots.remove(&TypeId::of::<T>());
        if discarded.is_some_and(|slot| slot.dirty) {
            tracing::debug!("Discarding unsaved changes to {}", T::KEY);
        }

        self.instance::<T>()
    }

    /// Persist the live instance of `T` under the active profile.
    pub fn save<T: Record>(&mut self) -> Result<()> {
        let slot = load_slot::<T>(
            &mut self.slots,
            &mut self.claims,
            &self.backend,
            &self.profile,
            self.options,
        )?;
        let bytes = slot.record.encode(self.options.format)?;
        self.backend.write(&self.profile, T::KEY, &bytes)?;
        slot.dirty = false;
        Ok(())
    }

    /// Apply a batch of edits to `T` and commit them with a single write.
    ///
    /// If the write fails the edits stay in memory and the record stays dirty.
    pub fn update<T: Record, R>(&mut self, edit: impl FnOnce(&mut T) -> R) -> Result<R> {
        let slot = load_slot::<T>(
            &mut self.slots,
            &mut self.claims,
            &self.backend,
            &self.profile,
            self.options,
        )?;
        let out = edit(slot.get_mut::<T>());
        slot.dirty = true;

        let bytes = slot.record.encode(self.options.format)?;
        self.backend.write(&self.profile, T::KEY, &bytes)?;
        slot.dirty = false;

        Ok(out)
    }

    /// Persist every record changed through [`Self::instance_mut`] since its
    /// last save. Returns how many records were written.
    pub fn save_dirty(&mut self) -> Result<usize> {
        self.write_slots(|slot| slot.dirty)
    }

    /// Persist every loaded record. Returns how many records were written.
    pub fn save_all(&mut self) -> Result<usize> {
        self.write_slots(|_| true)
    }

    /// Whether `T` has a live instance ("loaded" as opposed to "not yet loaded").
    pub fn is_loaded<T: Record>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Whether `T` has unsaved in-memory changes.
    pub fn is_dirty<T: Record>(&self) -> bool {
        self.slots
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.dirty)
    }

    /// Number of live record instances.
    pub fn loaded_count(&self) -> usize {
        self.slots.len()
    }

    /// Drop the live instance of `T` without writing it.
    ///
    /// Returns `true` if an instance was loaded.
    pub fn unload<T: Record>(&mut self) -> bool {
        self.slots.remove(&TypeId::of::<T>()).is_some()
    }

    /// Whether bytes for `T` are persisted under the active profile.
    pub fn exists<T: Record>(&self) -> Result<bool> {
        validate_key(T::KEY)?;
        check_claim::<T>(&self.claims)?;
        self.backend.exists(&self.profile, T::KEY)
    }

    /// Remove `T`'s persisted bytes and live instance.
    ///
    /// The next access recreates the default. If the backend fails, the live
    /// instance (and any unsaved edits) is kept.
    pub fn delete_record<T: Record>(&mut self) -> Result<bool> {
        validate_key(T::KEY)?;
        check_claim::<T>(&self.claims)?;
        let removed = self.backend.delete(&self.profile, T::KEY)?;
        self.slots.remove(&TypeId::of::<T>());

        if removed {
            tracing::info!("Deleted record {} from profile {}", T::KEY, self.profile);
        }
        Ok(removed)
    }

    /// Remove every record of the active profile, persisted and live.
    pub fn delete_profile(&mut self) -> Result<()> {
        self.slots.clear();
        self.backend.delete_profile(&self.profile)?;

        tracing::info!(
            "Deleted profile {} from {} backend",
            self.profile,
            self.backend.name()
        );
        Ok(())
    }

    /// Make `profile` the active profile.
    ///
    /// Dirty records of the current profile are saved first; all live
    /// instances are then dropped, since they belong to the old profile.
    pub fn switch_profile(&mut self, profile: ProfileId) -> Result<()> {
        if profile == self.profile {
            return Ok(());
        }

        self.save_dirty()?;
        self.slots.clear();

        tracing::info!("Switched profile {} -> {}", self.profile, profile);
        self.profile = profile;
        Ok(())
    }

    /// Profiles with at least one persisted record.
    pub fn profiles(&self) -> Result<Vec<ProfileId>> {
        self.backend.list_profiles()
    }

    /// Record keys persisted under the active profile.
    pub fn record_keys(&self) -> Result<Vec<String>> {
        self.backend.list_keys(&self.profile)
    }

    fn slot<T: Record>(&mut self) -> Result<&mut Slot> {
        load_slot::<T>(
            &mut self.slots,
            &mut self.claims,
            &self.backend,
            &self.profile,
            self.options,
        )
    }

    fn write_slots(&mut self, mut select: impl FnMut(&Slot) -> bool) -> Result<usize> {
        let mut written = 0;

        for slot in self.slots.values_mut().filter(|slot| select(slot)) {
            let key = slot.record.key();
            let bytes = slot.record.encode(self.options.format)?;
            self.backend.write(&self.profile, key, &bytes)?;
            slot.dirty = false;
            written += 1;
        }

        if written > 0 {
            tracing::debug!("Saved {} records for profile {}", written, self.profile);
        }
        Ok(written)
    }
}

impl<B: StorageBackend> Drop for SaveRegistry<B> {
    fn drop(&mut self) {
        let unsaved: Vec<&'static str> = self
            .slots
            .values()
            .filter(|slot| slot.dirty)
            .map(|slot| slot.record.key())
            .collect();

        if !unsaved.is_empty() {
            tracing::warn!(
                "Registry for profile {} dropped with unsaved records: {:?}",
                self.profile,
                unsaved
            );
        }
    }
}

/// Fail if `T::KEY` already belongs to a different record type.
fn check_claim<T: Record>(claims: &HashMap<&'static str, TypeId>) -> Result<()> {
    match claims.get(T::KEY) {
        Some(owner) if *owner != TypeId::of::<T>() => Err(StorageError::KeyConflict {
            key: T::KEY.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Find the live slot for `T`, fetching the record on first access.
fn load_slot<'a, T: Record>(
    slots: &'a mut HashMap<TypeId, Slot>,
    claims: &mut HashMap<&'static str, TypeId>,
    backend: &impl StorageBackend,
    profile: &ProfileId,
    options: RegistryOptions,
) -> Result<&'a mut Slot> {
    let slot = match slots.entry(TypeId::of::<T>()) {
        Entry::Occupied(occupied) => occupied.into_mut(),
        Entry::Vacant(vacant) => {
            check_claim::<T>(claims)?;
            let record = fetch::<T>(backend, profile, options)?;
            claims.insert(T::KEY, TypeId::of::<T>());
            vacant.insert(Slot::new(record))
        }
    };
    Ok(slot)
}

/// Read `T` for `profile`, creating and persisting the default if absent.
fn fetch<T: Record>(
    backend: &impl StorageBackend,
    profile: &ProfileId,
    options: RegistryOptions,
) -> Result<T> {
    validate_key(T::KEY)?;

    // A backend may already report a mangled entry as a decode failure.
    let decoded = match backend.read_optional(profile, T::KEY) {
        Ok(Some(bytes)) => options.format.decode::<T>(T::KEY, &bytes),
        Ok(None) => {
            let record = T::default();
            backend.write(profile, T::KEY, &options.format.encode(&record)?)?;
            tracing::info!("Created default {} for profile {}", T::KEY, profile);
            return Ok(record);
        }
        Err(err) => Err(err),
    };

    match decoded {
        Ok(record) => {
            tracing::debug!("Loaded {} for profile {}", T::KEY, profile);
            Ok(record)
        }
        Err(err @ StorageError::Deserialization { .. })
            if options.on_corrupt == CorruptRecordPolicy::ResetToDefault =>
        {
            tracing::warn!(
                "Resetting {} for profile {} to default: {}",
                T::KEY,
                profile,
                err
            );
            let record = T::default();
            backend.write(profile, T::KEY, &options.format.encode(&record)?)?;
            Ok(record)
        }
        Err(err) => Err(err),
    }
}
