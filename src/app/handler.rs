//! Event handling and state transition logic.
//!
//! This module implements the discovery state machine as a pure function over
//! [`AppState`]: it never touches a capability, it only mutates state and
//! returns [`Action`]s for the coordinator to execute.
//!
//! # Architecture
//!
//! 1. Events arrive from user controls or as worker responses
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `AppState` and `DiscoverySession` methods,
//!    with every phase change recorded by `AppState::transition`
//! 4. Actions are collected and returned for execution
//!
//! # Event Types
//!
//! - **Lifecycle**: `Mount`, `Focus`, `MapReady`
//! - **Permission**: `AllowLocation`, `SkipLocation`
//! - **Controls**: `RetryLocation`, `Refresh`, `SetRadius`, `LoadMore`
//! - **Selection**: `SelectGym`, `SelectMarker`, `FilterList`
//! - **Worker**: `WorkerResponse` with typed message variants
//!
//! # Example
//!
//! ```rust
//! use gym_discovery::app::{handle_event, Action, AppState, DiscoveryPhase, Event};
//! use gym_discovery::app::state::DiscoverySettings;
//! use gym_discovery::worker::WorkerMessage;
//!
//! let mut state = AppState::new(DiscoverySettings::default());
//! let (changed, actions) = handle_event(&mut state, &Event::Mount)?;
//! assert!(changed);
//! assert_eq!(state.phase, DiscoveryPhase::Restoring);
//! assert_eq!(actions, vec![Action::PostToWorker(WorkerMessage::LoadCachedPosition)]);
//! # Ok::<(), gym_discovery::DiscoveryError>(())
//! ```

use super::modes::{DiscoveryFailure, DiscoveryPhase};
use super::state::{filter_gyms, AppState};
use crate::app::Action;
use crate::domain::error::Result;
use crate::domain::{GymSummary, Position};
use crate::location::PermissionStatus;
use crate::search::SearchRequest;
use crate::ui::ViewCommand;
use crate::worker::{WorkerMessage, WorkerResponse};

/// Events triggered by user controls, the screen lifecycle, or the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The screen was created.
    Mount,
    /// The screen came back to the foreground.
    Focus,
    /// The user accepted the location prompt.
    AllowLocation,
    /// The user dismissed the location prompt.
    SkipLocation,
    /// Retry after an error or denial.
    RetryLocation,
    /// Re-acquire the position and restart the search.
    Refresh,
    /// Change the search radius in kilometers.
    SetRadius(f64),
    /// Fetch the next page.
    LoadMore,
    /// A list row was tapped.
    SelectGym(String),
    /// A map marker was tapped.
    SelectMarker(String),
    /// The map finished loading (only the first signal matters).
    MapReady,
    /// Quick-filter text for the loaded list.
    FilterList(String),
    /// Wraps a response from the worker.
    WorkerResponse(WorkerResponse),
}

type Outcome = (bool, Vec<Action>);

/// Processes an event, mutates application state, and returns actions to execute.
///
/// The boolean is `true` when the state changed and observers should
/// re-render. Events that do not apply to the current phase are ignored.
///
/// # Errors
///
/// Currently infallible; the `Result` keeps the signature stable for
/// handlers that need to reject malformed input.
///
/// # Tracing
///
/// Each call creates a debug-level span with the event and current phase.
pub fn handle_event(state: &mut AppState, event: &Event) -> Result<Outcome> {
    let _span = tracing::debug_span!(
        "handle_event",
        event_type = ?event,
        phase = state.phase.name()
    )
    .entered();

    let outcome = match event {
        Event::Mount => on_mount(state),
        Event::Focus => on_focus(state),
        Event::AllowLocation => on_allow(state),
        Event::SkipLocation => on_skip(state),
        Event::RetryLocation => on_retry(state),
        Event::Refresh => on_refresh(state),
        Event::SetRadius(km) => on_set_radius(state, *km),
        Event::LoadMore => on_load_more(state),
        Event::SelectGym(id) => on_select_gym(state, id),
        Event::SelectMarker(id) => on_select_marker(state, id),
        Event::MapReady => {
            let command = state.view.on_map_ready();
            (true, view_actions(command))
        }
        Event::FilterList(query) => (state.view.set_list_query(query), vec![]),
        Event::WorkerResponse(response) => on_worker_response(state, response),
    };
    Ok(outcome)
}

fn unchanged() -> Outcome {
    (false, vec![])
}

fn view_actions(command: Option<ViewCommand>) -> Vec<Action> {
    command.map(Action::View).into_iter().collect()
}

fn on_mount(state: &mut AppState) -> Outcome {
    if state.phase != DiscoveryPhase::Init {
        tracing::debug!("already mounted");
        return unchanged();
    }
    enter_restoring(state)
}

/// Re-runs the restore path after an error or denial; otherwise keeps the
/// current results.
fn on_focus(state: &mut AppState) -> Outcome {
    match state.phase {
        DiscoveryPhase::Init => enter_restoring(state),
        DiscoveryPhase::Error(_) | DiscoveryPhase::Denied => {
            state.transition(DiscoveryPhase::Init);
            enter_restoring(state)
        }
        _ => unchanged(),
    }
}

fn enter_restoring(state: &mut AppState) -> Outcome {
    state.transition(DiscoveryPhase::Restoring);
    (true, vec![Action::PostToWorker(WorkerMessage::LoadCachedPosition)])
}

fn enter_checking_permission(state: &mut AppState) -> Outcome {
    state.transition(DiscoveryPhase::CheckingPermission);
    (true, vec![Action::PostToWorker(WorkerMessage::CheckPermission)])
}

/// At most one acquisition is outstanding; re-entering `Acquiring` while one
/// is pending waits for it.
fn enter_acquiring(state: &mut AppState) -> Outcome {
    state.transition(DiscoveryPhase::Acquiring);
    if state.acquiring {
        tracing::debug!("acquisition already in flight");
        return (true, vec![]);
    }
    state.acquiring = true;
    (
        true,
        vec![Action::PostToWorker(WorkerMessage::AcquireLocation {
            options: state.settings.acquire,
        })],
    )
}

fn enter_denied(state: &mut AppState) -> Outcome {
    state.transition(DiscoveryPhase::Denied);
    (true, vec![Action::PostToWorker(WorkerMessage::RecordDenial)])
}

/// Enters `Ready(position)` and immediately starts a page-1 search.
fn enter_ready(state: &mut AppState, position: Position) -> Outcome {
    state.position = Some(position);
    state.transition(DiscoveryPhase::Ready(position));

    let mut actions = view_actions(state.view.on_position_updated(position));
    let (_, search) = start_search(state);
    actions.extend(search);
    (true, actions)
}

/// Resets the session and issues the page-1 fetch.
///
/// Without a validated position no request is issued and the machine stops
/// in `Error(LocationUnavailable)`.
fn start_search(state: &mut AppState) -> Outcome {
    let Some(position) = state.position.filter(Position::is_valid) else {
        tracing::warn!("search requested without a valid position");
        state.transition(DiscoveryPhase::Error(DiscoveryFailure::LocationUnavailable));
        return (true, vec![]);
    };

    let radius = state.session.radius_km();
    state.session.reset(radius);
    let key = state.session.begin(1);
    let request = SearchRequest::new(position, radius, key.page, &state.settings.search);

    state.transition(DiscoveryPhase::Searching);
    (
        true,
        vec![Action::PostToWorker(WorkerMessage::FetchPage { key, request })],
    )
}

fn on_allow(state: &mut AppState) -> Outcome {
    if state.phase != DiscoveryPhase::AwaitingUserChoice {
        return unchanged();
    }
    (false, vec![Action::PostToWorker(WorkerMessage::RequestPermission)])
}

fn on_skip(state: &mut AppState) -> Outcome {
    if state.phase != DiscoveryPhase::AwaitingUserChoice {
        return unchanged();
    }
    enter_denied(state)
}

fn on_retry(state: &mut AppState) -> Outcome {
    let recheck = match &state.phase {
        DiscoveryPhase::Denied => true,
        DiscoveryPhase::Error(failure) => failure.retry_rechecks_permission(),
        _ => {
            tracing::debug!("nothing to retry");
            return unchanged();
        }
    };

    if recheck {
        enter_checking_permission(state)
    } else {
        enter_acquiring(state)
    }
}

fn on_refresh(state: &mut AppState) -> Outcome {
    if matches!(
        state.phase,
        DiscoveryPhase::Init
            | DiscoveryPhase::Restoring
            | DiscoveryPhase::CheckingPermission
            | DiscoveryPhase::AwaitingUserChoice
    ) {
        tracing::debug!("refresh ignored before a position is known");
        return unchanged();
    }

    // After a refusal the gate must be passed again before touching the sensor.
    let refused = match &state.phase {
        DiscoveryPhase::Denied => true,
        DiscoveryPhase::Error(failure) => failure.retry_rechecks_permission(),
        _ => false,
    };

    let radius = state.session.radius_km();
    state.session.reset(radius);

    if state.position.is_some() && !refused {
        enter_acquiring(state)
    } else {
        enter_checking_permission(state)
    }
}

fn on_set_radius(state: &mut AppState, radius_km: f64) -> Outcome {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        tracing::warn!(radius_km, "ignoring invalid radius");
        return unchanged();
    }
    if (radius_km - state.session.radius_km()).abs() < f64::EPSILON {
        return unchanged();
    }

    state.session.reset(radius_km);

    let can_search = matches!(
        state.phase,
        DiscoveryPhase::Ready(_)
            | DiscoveryPhase::Searching
            | DiscoveryPhase::Results
            | DiscoveryPhase::Error(DiscoveryFailure::Search(_))
    );
    let Some(position) = state.position.filter(|_| can_search) else {
        tracing::debug!(radius_km, "radius stored for the next search");
        return (true, vec![]);
    };

    state.transition(DiscoveryPhase::Init);
    state.transition(DiscoveryPhase::Ready(position));
    start_search(state)
}

fn on_load_more(state: &mut AppState) -> Outcome {
    if state.phase != DiscoveryPhase::Results
        || !state.session.has_more()
        || state.session.in_flight()
    {
        tracing::debug!(
            has_more = state.session.has_more(),
            in_flight = state.session.in_flight(),
            "load more ignored"
        );
        return unchanged();
    }
    let Some(position) = state.position else {
        return unchanged();
    };

    let key = state.session.begin(state.session.current_page() + 1);
    let request = SearchRequest::new(
        position,
        key.radius_km,
        key.page,
        &state.settings.search,
    );

    state.transition(DiscoveryPhase::Searching);
    (
        true,
        vec![Action::PostToWorker(WorkerMessage::FetchPage { key, request })],
    )
}

fn on_select_gym(state: &mut AppState, gym_id: &str) -> Outcome {
    let visible: Vec<&GymSummary> = filter_gyms(state.session.gyms(), state.view.list_query())
        .into_iter()
        .map(|v| v.gym)
        .collect();

    let command = state.view.on_list_select(gym_id, &visible);
    (true, view_actions(command))
}

fn on_select_marker(state: &mut AppState, gym_id: &str) -> Outcome {
    let visible: Vec<&GymSummary> = filter_gyms(state.session.gyms(), state.view.list_query())
        .into_iter()
        .map(|v| v.gym)
        .collect();

    let command = state.view.on_marker_select(gym_id, &visible);
    (true, view_actions(command))
}

fn on_worker_response(state: &mut AppState, response: &WorkerResponse) -> Outcome {
    match response {
        WorkerResponse::CachedPositionLoaded(cached) => {
            if state.phase != DiscoveryPhase::Restoring {
                return unchanged();
            }
            match cached.as_ref().and_then(|c| c.usable_position()) {
                Some(position) => {
                    tracing::info!(%position, "using cached position");
                    enter_ready(state, position)
                }
                None => enter_checking_permission(state),
            }
        }

        WorkerResponse::PermissionChecked(status) => {
            if state.phase != DiscoveryPhase::CheckingPermission {
                return unchanged();
            }
            match status {
                PermissionStatus::Granted => enter_acquiring(state),
                PermissionStatus::Undetermined => {
                    state.transition(DiscoveryPhase::AwaitingUserChoice);
                    (true, vec![])
                }
                PermissionStatus::Denied => enter_denied(state),
            }
        }

        WorkerResponse::PermissionRequested(status) => {
            if state.phase != DiscoveryPhase::AwaitingUserChoice {
                return unchanged();
            }
            match status {
                PermissionStatus::Granted => enter_acquiring(state),
                PermissionStatus::Denied => enter_denied(state),
                PermissionStatus::Undetermined => {
                    tracing::debug!("permission prompt inconclusive, keeping prompt");
                    unchanged()
                }
            }
        }

        WorkerResponse::LocationAcquired(position) => {
            state.acquiring = false;
            if state.phase != DiscoveryPhase::Acquiring {
                tracing::debug!("position arrived outside acquiring, keeping it");
                state.position = Some(*position);
                return unchanged();
            }
            enter_ready(state, *position)
        }

        WorkerResponse::LocationFailed(reason) => {
            state.acquiring = false;
            if state.phase != DiscoveryPhase::Acquiring {
                return unchanged();
            }
            state.transition(DiscoveryPhase::Error(DiscoveryFailure::Location(*reason)));
            (true, vec![])
        }

        WorkerResponse::PageFetched { key, page } => {
            if !state.session.accept(key, page.clone()) {
                tracing::debug!(?key, "discarding stale page");
                return unchanged();
            }
            state.view.retain_selection(state.session.gyms());
            state.transition(DiscoveryPhase::Results);
            (true, vec![])
        }

        WorkerResponse::PageFailed { key, error } => {
            let failure = DiscoveryFailure::Search(error.clone());
            if !state.session.fail(key, failure.clone()) {
                tracing::debug!(?key, "discarding stale failure");
                return unchanged();
            }
            state.transition(DiscoveryPhase::Error(failure));
            (true, vec![])
        }

        WorkerResponse::DenialRecorded => unchanged(),
    }
}
