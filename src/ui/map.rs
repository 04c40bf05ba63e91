//! Map and list surface capability.

use super::sync::ViewCommand;
use crate::domain::Position;
use thiserror::Error;

/// Failure reported by a surface. Always non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("surface error: {0}")]
pub struct SurfaceError(pub String);

/// The rendered map and list, as far as the coordinator needs to drive them.
pub trait MapSurface: Send + Sync {
    /// Moves the map viewport.
    fn center_on(&self, position: Position) -> Result<(), SurfaceError>;

    /// Scrolls the list to the row at `index`.
    fn scroll_list_to(&self, index: usize) -> Result<(), SurfaceError>;
}

/// Executes `command` on `surface`, logging and discarding any failure.
pub fn apply(surface: &dyn MapSurface, command: &ViewCommand) {
    let result = match command {
        ViewCommand::CenterOn(position) => surface.center_on(*position),
        ViewCommand::ScrollToRow { index, .. } => surface.scroll_list_to(*index),
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, ?command, "view command failed, ignoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct BrokenMap {
        attempts: Mutex<usize>,
    }

    impl MapSurface for BrokenMap {
        fn center_on(&self, _position: Position) -> Result<(), SurfaceError> {
            *self.attempts.lock().unwrap() += 1;
            Err(SurfaceError("map view unmounted".to_string()))
        }

        fn scroll_list_to(&self, _index: usize) -> Result<(), SurfaceError> {
            *self.attempts.lock().unwrap() += 1;
            Err(SurfaceError("list view unmounted".to_string()))
        }
    }

    #[test]
    fn failures_are_swallowed() {
        let map = BrokenMap::default();
        apply(&map, &ViewCommand::CenterOn(Position::ORIGIN));
        apply(
            &map,
            &ViewCommand::ScrollToRow {
                index: 3,
                gym_id: "g".to_string(),
            },
        );
        assert_eq!(*map.attempts.lock().unwrap(), 2);
    }
}
