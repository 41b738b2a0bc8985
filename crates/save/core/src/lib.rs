//! Per-profile keyed persistence for game save data.
//!
//! A [`Record`] is a serializable value with a fixed key. A [`SaveRegistry`]
//! keeps one live instance per record type for the active [`ProfileId`],
//! creating and persisting defaults on first access. Bytes go through a
//! [`StorageBackend`] chosen once at setup (see [`BackendKind`]).
//!
//! Modules are organized by responsibility:
//! - [`registry`] owns live instances and the load/save lifecycle
//! - [`backend`] provides the byte-level storage media
//! - [`codec`] turns records into bytes and back
//! - [`profile`] validates profile ids and record keys
//!
//! # Known limitations
//!
//! Everything is synchronous and single-process. Two processes (or two
//! registries) writing the same profile are not coordinated: the last write
//! wins and no file locks are taken.
pub mod backend;
pub mod codec;
pub mod profile;
pub mod registry;

mod error;
mod record;

pub use backend::{BackendKind, FileBackend, InMemoryBackend, PreferencesBackend, StorageBackend};
pub use codec::Format;
pub use error::{Result, StorageError};
pub use profile::{ProfileId, validate_key};
pub use record::Record;
pub use registry::{CorruptRecordPolicy, RegistryOptions, SaveRegistry};
