//! Device location: permission handling and position acquisition.
//!
//! The platform is reached only through two capability traits,
//! [`LocationPermissionApi`] and [`Geolocator`]. Everything above this module
//! sees the tri-state [`PermissionStatus`] and the
//! [`LocationError`](crate::domain::LocationError) taxonomy, never raw
//! platform errors.

pub mod acquirer;
pub mod permission;

pub use acquirer::{Geolocator, LocationAcquirer, DEFAULT_WATCHDOG_GRACE_MS};
pub use permission::{LocationPermissionApi, PermissionGate};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// An error reported by a platform capability.
///
/// `code` follows the geolocation convention: 1 permission denied, 2 position
/// unavailable, 3 timeout, 4 service unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("platform error {code}: {message}")]
pub struct PlatformError {
    pub code: i32,
    pub message: String,
}

impl PlatformError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// OS location permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Not decided yet, or the platform could not tell.
    Undetermined,
}

impl PermissionStatus {
    /// Returns `true` for [`Granted`](Self::Granted) and [`Denied`](Self::Denied).
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Undetermined)
    }
}

/// Options passed to a single acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Platform timeout in milliseconds.
    pub timeout_ms: u64,
    /// Oldest acceptable fix in milliseconds.
    pub max_age_ms: u64,
    pub high_accuracy: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_age_ms: 60_000,
            high_accuracy: true,
        }
    }
}

/// A raw fix as reported by the platform, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// When the platform produced the fix.
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy in meters, if known.
    pub accuracy_m: Option<f64>,
}

impl Fix {
    /// A fix taken right now with unknown accuracy.
    #[must_use]
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
            accuracy_m: None,
        }
    }
}
