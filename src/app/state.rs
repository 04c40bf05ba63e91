//! Application state management and view model computation.
//!
//! [`AppState`] is the single source of truth for the discovery screen. The
//! event handler mutates it; the coordinator reads it to publish phases and
//! compute view models.
//!
//! # State Components
//!
//! - **Phase**: Current [`DiscoveryPhase`], plus every phase entered since the
//!   coordinator last drained them
//! - **Session**: Accumulated gyms, pagination, radius, and the request key of
//!   the one search the session is waiting for
//! - **Position**: Last validated device position
//! - **View**: [`ViewSync`] selection, map readiness and list filter

use super::modes::{DiscoveryFailure, DiscoveryPhase};
use crate::domain::{GymSummary, Position};
use crate::location::AcquireOptions;
use crate::search::{SearchDefaults, SearchPage};
use crate::ui::viewmodel::{
    Banner, DiscoveryViewModel, EmptyState, GymRow, HeaderInfo, MapMarker, PermissionPrompt,
};
use crate::ui::ViewSync;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::HashSet;

/// Identity of one page request within a discovery session.
///
/// A response is merged only if its key equals the session's pending key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestKey {
    /// Session generation; bumped on every reset.
    pub generation: u64,
    pub radius_km: f64,
    pub page: u32,
}

/// Gyms and pagination for the current radius.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySession {
    gyms: Vec<GymSummary>,
    seen: HashSet<String>,
    current_page: u32,
    has_more: bool,
    radius_km: f64,
    last_error: Option<DiscoveryFailure>,
    pending: Option<RequestKey>,
    generation: u64,
}

impl DiscoverySession {
    #[must_use]
    pub fn new(radius_km: f64) -> Self {
        Self {
            gyms: Vec::new(),
            seen: HashSet::new(),
            current_page: 1,
            has_more: true,
            radius_km,
            last_error: None,
            pending: None,
            generation: 0,
        }
    }

    /// Accumulated gyms in insertion order, unique by id.
    #[must_use]
    pub fn gyms(&self) -> &[GymSummary] {
        &self.gyms
    }

    /// Last page merged (1 after a reset).
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&DiscoveryFailure> {
        self.last_error.as_ref()
    }

    /// Key of the request the session is waiting for.
    #[must_use]
    pub const fn pending(&self) -> Option<RequestKey> {
        self.pending
    }

    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Empties the session for `radius_km` and invalidates any pending request.
    pub fn reset(&mut self, radius_km: f64) {
        self.gyms.clear();
        self.seen.clear();
        self.current_page = 1;
        self.has_more = true;
        self.radius_km = radius_km;
        self.last_error = None;
        self.pending = None;
        self.generation += 1;
    }

    /// Marks `page` as the request the session is now waiting for.
    pub fn begin(&mut self, page: u32) -> RequestKey {
        let key = RequestKey {
            generation: self.generation,
            radius_km: self.radius_km,
            page,
        };
        self.pending = Some(key);
        key
    }

    /// Returns `true` if `key` is the request the session is waiting for.
    #[must_use]
    pub fn is_current(&self, key: &RequestKey) -> bool {
        self.pending.as_ref() == Some(key)
    }

    /// Merges a page. Returns `false` (and changes nothing) for stale keys.
    ///
    /// Page 1 replaces the list; later pages append gyms whose id has not
    /// been seen.
    pub fn accept(&mut self, key: &RequestKey, page: SearchPage) -> bool {
        if !self.is_current(key) {
            return false;
        }
        self.pending = None;

        if key.page == 1 {
            self.gyms.clear();
            self.seen.clear();
        }

        let received = page.gyms.len();
        for gym in page.gyms {
            if self.seen.insert(gym.id.clone()) {
                self.gyms.push(gym);
            }
        }

        self.current_page = key.page;
        self.has_more = !page.is_last_page;
        self.last_error = None;

        tracing::debug!(
            page = key.page,
            received,
            total = self.gyms.len(),
            has_more = self.has_more,
            "page merged into session"
        );
        true
    }

    /// Records a failed request. Returns `false` for stale keys.
    pub fn fail(&mut self, key: &RequestKey, error: DiscoveryFailure) -> bool {
        if !self.is_current(key) {
            return false;
        }
        self.pending = None;
        self.last_error = Some(error);
        true
    }
}

/// Session-constant settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub search: SearchDefaults,
    pub default_radius_km: f64,
    pub acquire: AcquireOptions,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            search: SearchDefaults::default(),
            default_radius_km: 10.0,
            acquire: AcquireOptions::default(),
        }
    }
}

/// A gym that passes the list filter, with the name ranges it matched on.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleGym<'a> {
    pub gym: &'a GymSummary,
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Central application state container.
#[derive(Debug, Clone)]
pub struct AppState {
    pub phase: DiscoveryPhase,
    pub session: DiscoverySession,

    /// Last validated position, from the cache or a fresh acquisition.
    pub position: Option<Position>,

    pub settings: DiscoverySettings,
    pub view: ViewSync,

    /// An `AcquireLocation` message is outstanding.
    pub acquiring: bool,

    /// Phases entered since the coordinator last drained them, in order.
    pub transitions: Vec<DiscoveryPhase>,
}

impl AppState {
    #[must_use]
    pub fn new(settings: DiscoverySettings) -> Self {
        Self {
            phase: DiscoveryPhase::Init,
            session: DiscoverySession::new(settings.default_radius_km),
            position: None,
            settings,
            view: ViewSync::new(),
            acquiring: false,
            transitions: Vec::new(),
        }
    }

    /// Enters `phase` and records the transition.
    pub fn transition(&mut self, phase: DiscoveryPhase) {
        tracing::info!(from = self.phase.name(), to = phase.name(), "phase transition");
        self.transitions.push(phase.clone());
        self.phase = phase;
    }

    /// Takes the recorded transitions.
    pub fn drain_transitions(&mut self) -> Vec<DiscoveryPhase> {
        std::mem::take(&mut self.transitions)
    }

    /// Session gyms that pass the list filter.
    #[must_use]
    pub fn visible_gyms(&self) -> Vec<VisibleGym<'_>> {
        filter_gyms(self.session.gyms(), self.view.list_query())
    }

    /// Computes the renderable view model.
    #[must_use]
    pub fn compute_viewmodel(&self) -> DiscoveryViewModel {
        let visible = self.visible_gyms();
        let selected = self.view.selected_gym();

        let rows: Vec<GymRow> = visible
            .iter()
            .map(|v| Self::compute_row(v, selected))
            .collect();

        let markers = visible
            .iter()
            .filter(|v| !v.gym.has_placeholder_coordinates())
            .map(|v| MapMarker {
                gym_id: v.gym.id.clone(),
                title: v.gym.name.clone(),
                position: v.gym.coordinates,
                is_selected: selected == Some(v.gym.id.as_str()),
            })
            .collect();

        DiscoveryViewModel {
            header: self.compute_header(visible.len()),
            empty_state: self.compute_empty_state(visible.len()),
            rows,
            markers,
            user_position: self.position,
            banner: self.compute_banner(),
            prompt: self.compute_prompt(),
            is_loading: self.phase.is_busy(),
            can_load_more: matches!(self.phase, DiscoveryPhase::Results)
                && self.session.has_more()
                && !self.session.in_flight(),
        }
    }

    fn compute_row(visible: &VisibleGym<'_>, selected: Option<&str>) -> GymRow {
        let gym = visible.gym;
        let rating_label = if gym.rating > 0.0 {
            format!("{:.1}", gym.rating)
        } else {
            "New".to_string()
        };

        GymRow {
            id: gym.id.clone(),
            name: gym.name.clone(),
            address: gym.address.clone(),
            rating_label,
            price_label: gym.price_label(),
            gym_type: gym.gym_type.clone(),
            is_selected: selected == Some(gym.id.as_str()),
            highlight_ranges: visible.highlight_ranges.clone(),
        }
    }

    fn compute_header(&self, visible_count: usize) -> HeaderInfo {
        let radius = self.session.radius_km();
        let subtitle = match &self.phase {
            DiscoveryPhase::Results => {
                let noun = if visible_count == 1 { "gym" } else { "gyms" };
                format!("{visible_count} {noun} within {radius} km")
            }
            DiscoveryPhase::Searching => format!("Searching within {radius} km"),
            DiscoveryPhase::Restoring
            | DiscoveryPhase::CheckingPermission
            | DiscoveryPhase::Acquiring => "Finding your location".to_string(),
            _ => format!("Within {radius} km"),
        };
        HeaderInfo {
            title: "Gyms near you".to_string(),
            subtitle,
        }
    }

    fn compute_banner(&self) -> Option<Banner> {
        match &self.phase {
            DiscoveryPhase::Error(failure) => Some(Banner {
                message: failure.user_message().to_string(),
                retry_label: "Retry".to_string(),
                suggest_gps_settings: failure.suggests_gps_settings(),
            }),
            DiscoveryPhase::Denied => Some(Banner {
                message: "Location access is off. Enable it to discover gyms near you."
                    .to_string(),
                retry_label: "Try again".to_string(),
                suggest_gps_settings: false,
            }),
            _ => None,
        }
    }

    fn compute_prompt(&self) -> Option<PermissionPrompt> {
        matches!(self.phase, DiscoveryPhase::AwaitingUserChoice).then(|| PermissionPrompt {
            message: "Allow location access to find gyms near you.".to_string(),
            allow_label: "Allow".to_string(),
            skip_label: "Not now".to_string(),
        })
    }

    fn compute_empty_state(&self, visible_count: usize) -> Option<EmptyState> {
        if !matches!(self.phase, DiscoveryPhase::Results) || visible_count > 0 {
            return None;
        }
        if self.session.gyms().is_empty() {
            Some(EmptyState {
                message: "No gyms in this radius".to_string(),
                subtitle: "Try a larger radius".to_string(),
            })
        } else {
            Some(EmptyState {
                message: format!("No gyms match \"{}\"", self.view.list_query()),
                subtitle: "Clear the filter to see all results".to_string(),
            })
        }
    }
}

/// Filters `gyms` by fuzzy-matching every whitespace-separated token of
/// `query` against the gym name.
///
/// An empty query keeps every gym with no highlights.
#[must_use]
pub fn filter_gyms<'a>(gyms: &'a [GymSummary], query: &str) -> Vec<VisibleGym<'a>> {
    use fuzzy_matcher::FuzzyMatcher;

    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return gyms
            .iter()
            .map(|gym| VisibleGym {
                gym,
                highlight_ranges: Vec::new(),
            })
            .collect();
    }

    let _span = tracing::debug_span!("filter_gyms", total = gyms.len(), tokens = tokens.len())
        .entered();
    let matcher = SkimMatcherV2::default();

    gyms.iter()
        .filter_map(|gym| {
            let mut indices = Vec::new();
            for token in &tokens {
                let (_score, matched) = matcher.fuzzy_indices(&gym.name, token)?;
                indices.extend(matched);
            }
            Some(VisibleGym {
                gym,
                highlight_ranges: coalesce(indices),
            })
        })
        .collect()
}

/// Coalesces character indices into `(start, end)` ranges (exclusive end).
fn coalesce(mut indices: Vec<usize>) -> Vec<(usize, usize)> {
    indices.sort_unstable();
    indices.dedup();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}
