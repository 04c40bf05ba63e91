//! Error types for the gym discovery client.
//!
//! This module defines the crate-wide error type [`DiscoveryError`] together with
//! the two capability-level taxonomies the state machine reasons about:
//! [`LocationError`] for device positioning and [`SearchError`] for the remote
//! catalog. All of them are implemented with `thiserror`.

use thiserror::Error;

/// The main error type for gym discovery operations.
///
/// Most variants wrap a more specific error. Location and search failures are
/// normally captured by the state machine and never reach this type; they only
/// appear here when a caller invokes a capability directly (for example
/// [`crate::DiscoveryCoordinator::gym_detail`]).
///
/// # Examples
///
/// ```
/// use gym_discovery::DiscoveryError;
///
/// fn validate_radius(km: f64) -> Result<(), DiscoveryError> {
///     if km <= 0.0 {
///         return Err(DiscoveryError::Config(format!("radius must be positive, got {km}")));
///     }
///     Ok(())
/// }
/// assert!(validate_radius(0.0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Reading or writing the persisted position record failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Coordinates are not finite or out of range.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Device positioning failed.
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// The remote catalog could not be queried.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Failure reasons for acquiring the device position.
///
/// Mapped from the platform geolocation error codes, plus the client-side
/// watchdog which reports [`LocationError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LocationError {
    /// The user or OS refused location access (platform code 1).
    #[error("location permission denied")]
    PermissionDenied,

    /// No fix could be produced, GPS is off, or the fix failed validation
    /// (platform code 2 and unknown codes).
    #[error("position unavailable")]
    PositionUnavailable,

    /// The platform or the client watchdog gave up waiting (platform code 3).
    #[error("location request timed out")]
    Timeout,

    /// The positioning service itself is missing or disabled (platform code 4).
    #[error("location service unavailable")]
    ServiceUnavailable,
}

impl LocationError {
    /// Maps a platform geolocation error code onto the taxonomy.
    ///
    /// Unknown codes are treated as [`LocationError::PositionUnavailable`].
    #[must_use]
    pub const fn from_platform_code(code: i32) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            4 => Self::ServiceUnavailable,
            _ => Self::PositionUnavailable,
        }
    }
}

/// Failure reasons for catalog queries.
///
/// An empty result is not an error; "not found" responses are normalized into
/// an empty page before they could become one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Transport failure or a non-success HTTP status other than "not found".
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the transport timeout.
    #[error("search request timed out")]
    Timeout,

    /// The request was rejected locally and never sent.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// A specialized `Result` type for gym discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
