//! Map/list consistency.
//!
//! [`ViewSync`] owns the interaction state shared by the map and the list:
//! which gym is selected, whether the map has signalled readiness, and any
//! recenter that arrived too early. Every handler returns at most one
//! [`ViewCommand`]; executing it is the coordinator's job and failures there
//! are ignored.

use crate::domain::{GymSummary, Position};

/// A command for the map or list surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// Move the map viewport to `Position`.
    CenterOn(Position),
    /// Scroll the list so the row at `index` is visible.
    ScrollToRow { index: usize, gym_id: String },
}

/// Selection and viewport bookkeeping for the discovery screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSync {
    map_ready: bool,
    pending_center: Option<Position>,
    selected_gym: Option<String>,
    list_query: String,
}

impl ViewSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected gym id.
    #[must_use]
    pub fn selected_gym(&self) -> Option<&str> {
        self.selected_gym.as_deref()
    }

    /// Quick-filter text applied to the list.
    #[must_use]
    pub fn list_query(&self) -> &str {
        &self.list_query
    }

    #[must_use]
    pub const fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    /// Recenter waiting for the map to become ready.
    #[must_use]
    pub const fn pending_center(&self) -> Option<Position> {
        self.pending_center
    }

    /// Replaces the quick-filter text. Returns `true` if it changed.
    pub fn set_list_query(&mut self, query: &str) -> bool {
        let query = query.trim();
        if self.list_query == query {
            return false;
        }
        self.list_query = query.to_string();
        true
    }

    /// A marker was tapped: select the gym and scroll its row into view.
    ///
    /// `visible` is the list as currently shown (after filtering). A gym that
    /// is not in it is neither selected nor scrolled to.
    pub fn on_marker_select(&mut self, gym_id: &str, visible: &[&GymSummary]) -> Option<ViewCommand> {
        let index = visible.iter().position(|gym| gym.id == gym_id)?;
        self.selected_gym = Some(gym_id.to_string());
        Some(ViewCommand::ScrollToRow {
            index,
            gym_id: gym_id.to_string(),
        })
    }

    /// A list row was tapped: select the gym and center the map on it.
    ///
    /// Nothing is centered while the map is not ready or when the gym has
    /// placeholder coordinates.
    pub fn on_list_select(&mut self, gym_id: &str, visible: &[&GymSummary]) -> Option<ViewCommand> {
        let gym = visible.iter().find(|gym| gym.id == gym_id)?;
        self.selected_gym = Some(gym_id.to_string());

        if !self.map_ready {
            tracing::debug!(gym_id, "map not ready, skipping recenter on gym");
            return None;
        }
        if gym.has_placeholder_coordinates() {
            return None;
        }
        Some(ViewCommand::CenterOn(gym.coordinates))
    }

    /// The user position changed: recenter now, or once the map is ready.
    pub fn on_position_updated(&mut self, position: Position) -> Option<ViewCommand> {
        if self.map_ready {
            Some(ViewCommand::CenterOn(position))
        } else {
            tracing::debug!(%position, "map not ready, deferring recenter");
            self.pending_center = Some(position);
            None
        }
    }

    /// The map became ready. Only the first signal has an effect.
    pub fn on_map_ready(&mut self) -> Option<ViewCommand> {
        if self.map_ready {
            return None;
        }
        self.map_ready = true;
        self.pending_center.take().map(ViewCommand::CenterOn)
    }

    /// Drops the selection if the selected gym is no longer listed.
    pub fn retain_selection(&mut self, gyms: &[GymSummary]) {
        if let Some(selected) = &self.selected_gym {
            if !gyms.iter().any(|gym| &gym.id == selected) {
                tracing::debug!(gym_id = %selected, "selected gym left the list");
                self.selected_gym = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gyms() -> Vec<GymSummary> {
        vec![
            GymSummary::new("a", "Alpha", Position::new(28.60, 77.20).unwrap()),
            GymSummary::new("b", "Bravo", Position::new(28.61, 77.21).unwrap()),
            GymSummary::new("c", "Charlie", Position::ORIGIN),
        ]
    }

    #[test]
    fn marker_select_scrolls_to_row() {
        let gyms = gyms();
        let visible: Vec<&GymSummary> = gyms.iter().collect();
        let mut sync = ViewSync::new();

        assert_eq!(
            sync.on_marker_select("b", &visible),
            Some(ViewCommand::ScrollToRow {
                index: 1,
                gym_id: "b".to_string()
            })
        );
        assert_eq!(sync.selected_gym(), Some("b"));
    }

    #[test]
    fn marker_for_hidden_gym_keeps_selection() {
        let gyms = gyms();
        let visible: Vec<&GymSummary> = gyms[..2].iter().collect();
        let mut sync = ViewSync::new();
        sync.on_marker_select("a", &visible);

        assert_eq!(sync.on_marker_select("c", &visible), None);
        assert_eq!(sync.on_marker_select("zz", &visible), None);
        assert_eq!(sync.selected_gym(), Some("a"));
    }

    #[test]
    fn list_select_centers_only_when_ready() {
        let gyms = gyms();
        let visible: Vec<&GymSummary> = gyms.iter().collect();
        let mut sync = ViewSync::new();

        assert_eq!(sync.on_list_select("a", &visible), None);
        assert_eq!(sync.selected_gym(), Some("a"));

        sync.on_map_ready();
        assert_eq!(
            sync.on_list_select("a", &visible),
            Some(ViewCommand::CenterOn(gyms[0].coordinates))
        );
        assert_eq!(sync.on_list_select("c", &visible), None);
    }

    #[test]
    fn position_update_waits_for_map_ready_once() {
        let here = Position::new(28.6139, 77.2090).unwrap();
        let mut sync = ViewSync::new();

        assert_eq!(sync.on_position_updated(here), None);
        assert_eq!(sync.on_map_ready(), Some(ViewCommand::CenterOn(here)));
        assert_eq!(sync.on_map_ready(), None);
        assert_eq!(sync.on_position_updated(here), Some(ViewCommand::CenterOn(here)));
    }

    #[test]
    fn selection_is_dropped_when_gym_disappears() {
        let gyms = gyms();
        let visible: Vec<&GymSummary> = gyms.iter().collect();
        let mut sync = ViewSync::new();
        sync.on_marker_select("c", &visible);

        sync.retain_selection(&gyms[..2]);
        assert_eq!(sync.selected_gym(), None);
    }
}
