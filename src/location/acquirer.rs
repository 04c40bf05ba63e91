//! Position acquisition with a client-side watchdog and single-flight calls.
//!
//! [`LocationAcquirer::acquire`] wraps the platform [`Geolocator`] in a
//! `tokio::time::timeout` of `timeout_ms + grace`, validates the fix, and
//! writes the outcome through to the [`PositionStore`]. Concurrent callers
//! share one platform request.

use super::{AcquireOptions, Fix, PlatformError};
use crate::domain::{LocationError, Position};
use crate::storage::PositionStore;
use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::Instrument;

/// Extra time the watchdog allows on top of the platform timeout.
pub const DEFAULT_WATCHDOG_GRACE_MS: u64 = 5_000;

/// Platform geolocation capability.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Produces one fix. May never resolve; the caller enforces the deadline.
    async fn current_position(&self, options: AcquireOptions) -> Result<Fix, PlatformError>;
}

type Acquisition = Shared<BoxFuture<'static, Result<Position, LocationError>>>;

/// Acquires the device position.
pub struct LocationAcquirer {
    geolocator: Arc<dyn Geolocator>,
    store: Arc<PositionStore>,
    grace: Duration,
    in_flight: Mutex<Option<Acquisition>>,
}

impl LocationAcquirer {
    pub fn new(geolocator: Arc<dyn Geolocator>, store: Arc<PositionStore>) -> Self {
        Self {
            geolocator,
            store,
            grace: Duration::from_millis(DEFAULT_WATCHDOG_GRACE_MS),
            in_flight: Mutex::new(None),
        }
    }

    /// Overrides the watchdog grace period.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    fn slot(&self) -> MutexGuard<'_, Option<Acquisition>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires one validated position.
    ///
    /// While an acquisition is pending, further calls await the same result
    /// instead of issuing another platform request; their `options` are
    /// ignored.
    ///
    /// On success the position is saved with `permission = true`. On any
    /// failure the cached record's permission flag is cleared, keeping the
    /// stored fix and its timestamp. Store write failures are logged only.
    ///
    /// # Errors
    ///
    /// - [`LocationError::Timeout`] if the platform or the watchdog gives up
    /// - [`LocationError::PositionUnavailable`] for unusable or stale fixes
    /// - the mapped platform code otherwise
    pub async fn acquire(&self, options: AcquireOptions) -> Result<Position, LocationError> {
        let acquisition = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => {
                    tracing::debug!("joining in-flight acquisition");
                    pending.clone()
                }
                _ => {
                    let fresh = attempt(
                        Arc::clone(&self.geolocator),
                        Arc::clone(&self.store),
                        self.grace,
                        options,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let result = acquisition.await;

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|done| done.peek().is_some()) {
            *slot = None;
        }
        result
    }
}

impl std::fmt::Debug for LocationAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationAcquirer")
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

async fn attempt(
    geolocator: Arc<dyn Geolocator>,
    store: Arc<PositionStore>,
    grace: Duration,
    options: AcquireOptions,
) -> Result<Position, LocationError> {
    let span = tracing::debug_span!(
        "acquire_location",
        timeout_ms = options.timeout_ms,
        high_accuracy = options.high_accuracy
    );

    async move {
        let watchdog = Duration::from_millis(options.timeout_ms) + grace;
        let result = match tokio::time::timeout(watchdog, geolocator.current_position(options)).await
        {
            Err(_) => {
                tracing::warn!(watchdog_ms = watchdog.as_millis() as u64, "location watchdog fired");
                Err(LocationError::Timeout)
            }
            Ok(Err(e)) => {
                tracing::warn!(code = e.code, message = %e.message, "platform location error");
                Err(LocationError::from_platform_code(e.code))
            }
            Ok(Ok(fix)) => validate_fix(&fix, options),
        };

        match &result {
            Ok(position) => {
                tracing::info!(%position, "position acquired");
                if let Err(e) = store.save(Some(*position), true) {
                    tracing::warn!(error = %e, "failed to persist position");
                }
            }
            Err(reason) => {
                tracing::info!(%reason, "acquisition failed");
                if let Err(e) = store.revoke_permission() {
                    tracing::warn!(error = %e, "failed to clear cached permission");
                }
            }
        }
        result
    }
    .instrument(span)
    .await
}

fn validate_fix(fix: &Fix, options: AcquireOptions) -> Result<Position, LocationError> {
    let position = Position::new(fix.latitude, fix.longitude).map_err(|e| {
        tracing::warn!(error = %e, "platform returned an invalid fix");
        LocationError::PositionUnavailable
    })?;

    let age_ms = Utc::now()
        .signed_duration_since(fix.timestamp)
        .num_milliseconds();
    if age_ms > 0 && age_ms.unsigned_abs() > options.max_age_ms {
        tracing::warn!(age_ms, max_age_ms = options.max_age_ms, "platform returned a stale fix");
        return Err(LocationError::PositionUnavailable);
    }

    Ok(position)
}
