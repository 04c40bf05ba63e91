//! Discovery phases and failure causes.
//!
//! # State Machine
//!
//! ```text
//! Init → Restoring → Ready(pos) → Searching → Results
//!            └→ CheckingPermission → Acquiring ──┘
//!                    ├→ AwaitingUserChoice ─┤
//!                    └→ Denied              └→ Error(reason)
//! ```
//!
//! No phase is terminal: `Error` and `Denied` accept a manual retry, and
//! `Results` accepts load-more, radius changes, and refresh.

use crate::domain::{LocationError, Position, SearchError};
use thiserror::Error;

/// Phase of the discovery state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryPhase {
    /// Nothing has happened yet (or a radius change is restarting the search).
    Init,
    /// Reading the position cache.
    Restoring,
    /// Probing the OS permission.
    CheckingPermission,
    /// Permission undetermined; waiting on the allow/skip prompt.
    AwaitingUserChoice,
    /// A position request is in flight.
    Acquiring,
    /// A validated position is available; a search follows immediately.
    Ready(Position),
    /// The current page request is in flight.
    Searching,
    /// The session holds results (possibly none).
    Results,
    Error(DiscoveryFailure),
    /// The user or OS refused location access.
    Denied,
}

impl DiscoveryPhase {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Restoring => "restoring",
            Self::CheckingPermission => "checking_permission",
            Self::AwaitingUserChoice => "awaiting_user_choice",
            Self::Acquiring => "acquiring",
            Self::Ready(_) => "ready",
            Self::Searching => "searching",
            Self::Results => "results",
            Self::Error(_) => "error",
            Self::Denied => "denied",
        }
    }

    /// Phases waiting on the worker.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Restoring | Self::CheckingPermission | Self::Acquiring | Self::Searching
        )
    }
}

/// Why discovery stopped in [`DiscoveryPhase::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryFailure {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// A search was requested without a validated position.
    #[error("location unavailable")]
    LocationUnavailable,
}

impl DiscoveryFailure {
    /// Cause-matched message for the error banner.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Location(LocationError::PermissionDenied) => {
                "Location access is turned off. Allow it to see gyms near you."
            }
            Self::Location(LocationError::PositionUnavailable) => {
                "We couldn't find your location. Check your GPS settings and try again."
            }
            Self::Location(LocationError::Timeout) => {
                "Finding your location took too long. Check your GPS settings and try again."
            }
            Self::Location(LocationError::ServiceUnavailable) => {
                "Location services aren't available on this device right now."
            }
            Self::Search(SearchError::Timeout) => "The gym directory took too long to respond.",
            Self::Search(SearchError::Network(_)) => {
                "We couldn't reach the gym directory. Check your connection and try again."
            }
            Self::Search(SearchError::InvalidRequest(_)) => {
                "Something went wrong while searching. Please try again."
            }
            Self::LocationUnavailable => "Your location isn't available yet.",
        }
    }

    /// Whether the banner should point at the device GPS settings.
    #[must_use]
    pub const fn suggests_gps_settings(&self) -> bool {
        matches!(
            self,
            Self::Location(LocationError::PositionUnavailable | LocationError::Timeout)
        )
    }

    /// Whether a retry must start over at the permission probe rather than
    /// at acquisition.
    #[must_use]
    pub const fn retry_rechecks_permission(&self) -> bool {
        matches!(
            self,
            Self::Location(LocationError::PermissionDenied) | Self::LocationUnavailable
        )
    }
}
