//! Record contract for values persisted through the registry.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A named, serializable unit of persisted application state.
///
/// Each record type owns exactly one slot per profile, addressed by
/// [`Record::KEY`]. `Default` supplies the value used when nothing has been
/// persisted yet.
///
/// ```
/// use save_core::Record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct GameData {
///     first_open: bool,
///     first_play: bool,
/// }
///
/// impl Record for GameData {
///     const KEY: &'static str = "GameData";
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Default + 'static {
    /// Storage key, unique among record types sharing a profile.
    ///
    /// A registry rejects a second type using an already claimed key with
    /// [`StorageError::KeyConflict`](crate::StorageError::KeyConflict).
    const KEY: &'static str;
}
