//! Persistent last-known-position cache with a bounded lifetime.
//!
//! The store keeps exactly one record under [`POSITION_KEY`]. Every save fully
//! overwrites it (last write wins). Reading a record older than the TTL deletes
//! it and reports a miss, so an expired fix can never be resurrected by a later
//! read.

use super::backend::KeyValueStore;
use super::memory::MemoryStore;
use super::models::{CachedPosition, PositionRecord};
use crate::domain::error::{DiscoveryError, Result};
use crate::domain::Position;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage key shared with the rest of the app.
pub const POSITION_KEY: &str = "userLocation";

/// Default record lifetime in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Last-known device position, its permission outcome, and its capture time.
///
/// The backend sits behind a mutex so the store can be shared (`Arc`) between
/// the location acquirer, which writes through on success, and the worker,
/// which reads it on mount.
pub struct PositionStore {
    backend: Mutex<Box<dyn KeyValueStore>>,
    ttl: Duration,
}

impl PositionStore {
    /// Creates a store over `backend` with the default 30 minute TTL.
    #[must_use]
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self {
            backend: Mutex::new(backend),
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    /// Creates a store backed by a [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }

    /// Overrides the record lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Record lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn backend(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a fix (or a denial when `position` is `None`) captured now.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidPosition`] for a non-finite or
    /// out-of-range position, or a storage error if the write fails.
    pub fn save(&self, position: Option<Position>, permission_granted: bool) -> Result<()> {
        self.save_at(position, permission_granted, Utc::now())
    }

    /// Like [`save`](Self::save) with an explicit capture time.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_at(
        &self,
        position: Option<Position>,
        permission_granted: bool,
        captured_at: DateTime<Utc>,
    ) -> Result<()> {
        let _span = tracing::debug_span!(
            "position_save",
            has_position = position.is_some(),
            permission = permission_granted
        )
        .entered();

        if let Some(p) = position {
            if !p.is_valid() {
                return Err(DiscoveryError::InvalidPosition(format!(
                    "refusing to store ({}, {})",
                    p.latitude, p.longitude
                )));
            }
        }

        let record = PositionRecord::new(position, permission_granted, captured_at);
        let json = serde_json::to_string(&record)?;
        self.backend().set(POSITION_KEY, &json)?;

        tracing::debug!("position record written");
        Ok(())
    }

    /// Loads the cached record, deleting it if it has expired.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself fails. A corrupt record is
    /// deleted and reported as a miss.
    pub fn load(&self) -> Result<Option<CachedPosition>> {
        self.load_at(Utc::now())
    }

    /// Like [`load`](Self::load) evaluated at `now`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Option<CachedPosition>> {
        let _span = tracing::debug_span!("position_load").entered();

        let mut backend = self.backend();
        let Some(raw) = backend.get(POSITION_KEY)? else {
            tracing::debug!("no cached position");
            return Ok(None);
        };

        let Some((record, captured_at)) = parse_record(&raw) else {
            tracing::warn!("discarding corrupt position record");
            backend.remove(POSITION_KEY)?;
            return Ok(None);
        };

        let age = now.signed_duration_since(captured_at);
        if age < Duration::zero() {
            tracing::warn!(captured_at = %captured_at, "position record is from the future, deleting");
            backend.remove(POSITION_KEY)?;
            return Ok(None);
        }
        if age > self.ttl {
            tracing::debug!(age_secs = age.num_seconds(), "cached position expired, deleting");
            backend.remove(POSITION_KEY)?;
            return Ok(None);
        }

        let position = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => Position::new(lat, lon)
                .map_err(|e| tracing::warn!(error = %e, "stored position is invalid"))
                .ok(),
            _ => None,
        };

        tracing::debug!(
            age_secs = age.num_seconds(),
            has_position = position.is_some(),
            permission = record.permission,
            "cached position loaded"
        );

        Ok(Some(CachedPosition {
            position,
            captured_at,
            permission_granted: record.permission,
        }))
    }

    /// Clears the permission flag on the existing record.
    ///
    /// The stored fix and its capture time are left untouched, so the record
    /// still expires on its original schedule. No-op when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or write fails.
    pub fn revoke_permission(&self) -> Result<()> {
        let mut backend = self.backend();
        let Some(raw) = backend.get(POSITION_KEY)? else {
            return Ok(());
        };

        let Some((mut record, _)) = parse_record(&raw) else {
            tracing::warn!("discarding corrupt position record");
            return backend.remove(POSITION_KEY);
        };

        if !record.permission {
            return Ok(());
        }
        record.permission = false;
        let json = serde_json::to_string(&record)?;
        backend.set(POSITION_KEY, &json)?;

        tracing::debug!("cached permission flag cleared");
        Ok(())
    }

    /// Deletes the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend deletion fails.
    pub fn clear(&self) -> Result<()> {
        self.backend().remove(POSITION_KEY)
    }
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn parse_record(raw: &str) -> Option<(PositionRecord, DateTime<Utc>)> {
    let record: PositionRecord = serde_json::from_str(raw).ok()?;
    let captured_at = DateTime::<Utc>::from_timestamp_millis(record.timestamp)?;
    Some((record, captured_at))
}
