//! Key-value storage backend abstraction.
//!
//! This module defines the [`KeyValueStore`] trait, the device-local string
//! store the position cache persists into. It mirrors the shape of a mobile
//! async-storage API (string keys, string values) so the same record format can
//! be shared with the rest of the app.

use crate::domain::error::Result;

/// Abstraction over persistent string key-value backends.
///
/// Implementations are used behind a mutex by [`super::PositionStore`], so they
/// only need to be `Send`.
///
/// # Implementations
///
/// - [`super::JsonFileStore`]: JSON file with atomic writes (default)
/// - [`super::MemoryStore`]: process-local map, for tests and ephemeral sessions
///
/// # Examples
///
/// ```
/// use gym_discovery::storage::{KeyValueStore, MemoryStore};
///
/// let mut store = MemoryStore::default();
/// store.set("userLocation", "{}")?;
/// assert_eq!(store.get("userLocation")?.as_deref(), Some("{}"));
/// store.remove("userLocation")?;
/// assert!(store.get("userLocation")?.is_none());
/// # Ok::<(), gym_discovery::DiscoveryError>(())
/// ```
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, or `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, fully replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<()>;
}
