//! View model types representing renderable discovery state.
//!
//! View models are computed from application state via
//! `AppState::compute_viewmodel()` and contain no business logic, only
//! display-ready data: pre-formatted labels, highlight ranges, and the single
//! banner or prompt the current phase calls for.
//!
//! # Example
//!
//! ```rust
//! use gym_discovery::ui::viewmodel::{DiscoveryViewModel, HeaderInfo};
//!
//! let vm = DiscoveryViewModel {
//!     header: HeaderInfo {
//!         title: "Gyms near you".to_string(),
//!         subtitle: "Within 10 km".to_string(),
//!     },
//!     ..DiscoveryViewModel::default()
//! };
//! assert!(vm.rows.is_empty());
//! ```

use crate::domain::Position;

/// Complete discovery screen view model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryViewModel {
    pub header: HeaderInfo,

    /// List rows after the quick filter, in catalog order.
    pub rows: Vec<GymRow>,

    /// Map markers for the listed gyms that have real coordinates.
    pub markers: Vec<MapMarker>,

    /// Device position used for the search, if known.
    pub user_position: Option<Position>,

    /// Error or denial banner.
    pub banner: Option<Banner>,

    /// Allow/skip prompt shown while permission is undetermined.
    pub prompt: Option<PermissionPrompt>,

    /// Shown when a completed search has nothing to list.
    pub empty_state: Option<EmptyState>,

    /// A position or page request is in flight.
    pub is_loading: bool,

    pub can_load_more: bool,
}

/// Header display information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    /// Radius and count summary, e.g. "12 gyms within 10 km".
    pub subtitle: String,
}

/// One list row.
#[derive(Debug, Clone, PartialEq)]
pub struct GymRow {
    pub id: String,
    pub name: String,
    pub address: String,
    /// One decimal, e.g. "4.5", or "New" when unrated.
    pub rating_label: String,
    pub price_label: String,
    pub gym_type: String,
    pub is_selected: bool,

    /// Character ranges of `name` matched by the quick filter.
    ///
    /// Each tuple is `(start_index, end_index)` in character indices.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// One map marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub gym_id: String,
    pub title: String,
    pub position: Position,
    pub is_selected: bool,
}

/// Cause-matched error banner with a retry affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub retry_label: String,
    /// Offer a shortcut to the device GPS settings.
    pub suggest_gps_settings: bool,
}

/// Location permission prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPrompt {
    pub message: String,
    pub allow_label: String,
    pub skip_label: String,
}

/// Empty state message display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Primary message (e.g., "No gyms in this radius").
    pub message: String,

    /// Secondary explanatory text (e.g., "Try a larger radius").
    pub subtitle: String,
}
