//! Async driver for the discovery state machine.
//!
//! [`DiscoveryCoordinator`] owns the [`AppState`] and is the only place where
//! the pure [`handle_event`] meets the outside world:
//!
//! ```text
//! control ──► handle_event ──► Action::PostToWorker ──► JoinSet task ──► DiscoveryWorker
//!                 ▲                                                          │
//!                 └──────────── Event::WorkerResponse ◄──── step()/settle() ◄┘
//! ```
//!
//! Worker messages run concurrently as Tokio tasks; their responses are fed back
//! one at a time in completion order, so the state machine itself never runs
//! concurrently with itself. Stale search responses are dropped by the state
//! machine's request-key check, not by cancelling tasks.
//!
//! Every phase the state machine enters is published on a
//! [`broadcast`](tokio::sync::broadcast) channel, in order.
//!
//! Controls spawn tasks and therefore must be called from within a Tokio
//! runtime.

use crate::app::{handle_event, Action, AppState, DiscoveryPhase, DiscoverySettings, Event};
use crate::domain::{GymDetail, Result};
use crate::ui::{map, DiscoveryViewModel, MapSurface, ViewCommand};
use crate::worker::{DiscoveryWorker, WorkerMessage, WorkerResponse};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::Instrument;

const PHASE_CHANNEL_CAPACITY: usize = 64;

/// Runs discovery for one screen.
pub struct DiscoveryCoordinator {
    state: AppState,
    worker: Arc<DiscoveryWorker>,
    map: Option<Arc<dyn MapSurface>>,
    tasks: JoinSet<WorkerResponse>,
    phases: broadcast::Sender<DiscoveryPhase>,
}

impl DiscoveryCoordinator {
    /// Creates an idle coordinator in [`DiscoveryPhase::Init`].
    pub fn new(settings: DiscoverySettings, worker: Arc<DiscoveryWorker>) -> Self {
        let (phases, _) = broadcast::channel(PHASE_CHANNEL_CAPACITY);
        Self {
            state: AppState::new(settings),
            worker,
            map: None,
            tasks: JoinSet::new(),
            phases,
        }
    }

    /// Attaches the map/list surface that receives view commands.
    #[must_use]
    pub fn with_map(mut self, map: Arc<dyn MapSurface>) -> Self {
        self.map = Some(map);
        self
    }

    /// Receives every phase entered from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryPhase> {
        self.phases.subscribe()
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> &DiscoveryPhase {
        &self.state.phase
    }

    #[must_use]
    pub fn view_model(&self) -> DiscoveryViewModel {
        self.state.compute_viewmodel()
    }

    /// Number of worker tasks whose responses have not been processed yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Feeds one event through the state machine and executes its actions.
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`handle_event`].
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let _span = tracing::debug_span!("dispatch", phase = self.state.phase.name()).entered();

        let (changed, actions) = handle_event(&mut self.state, &event)?;

        for phase in self.state.drain_transitions() {
            // No subscribers is fine.
            let _ = self.phases.send(phase);
        }

        for action in actions {
            match action {
                Action::PostToWorker(message) => self.post(message),
                Action::View(command) => self.apply_view(&command),
            }
        }

        Ok(changed)
    }

    fn post(&mut self, message: WorkerMessage) {
        let span = tracing::debug_span!("worker_task", operation = message.name());
        let worker = Arc::clone(&self.worker);
        self.tasks
            .spawn(async move { worker.process(message).await }.instrument(span));
    }

    fn apply_view(&self, command: &ViewCommand) {
        match &self.map {
            Some(surface) => map::apply(surface.as_ref(), command),
            None => tracing::debug!(?command, "no map surface attached, dropping view command"),
        }
    }

    /// Waits for the next worker response and feeds it back.
    ///
    /// Returns `false` without waiting when no worker task is pending. A task
    /// that panicked is logged and skipped.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub async fn step(&mut self) -> Result<bool> {
        loop {
            match self.tasks.join_next().await {
                None => return Ok(false),
                Some(Ok(response)) => {
                    self.dispatch(Event::WorkerResponse(response))?;
                    return Ok(true);
                }
                Some(Err(e)) => tracing::error!(error = %e, "worker task failed"),
            }
        }
    }

    /// Processes worker responses until none are pending.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub async fn settle(&mut self) -> Result<()> {
        while self.step().await? {}
        Ok(())
    }

    /// The screen was created: restore the cached position or start over.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn mount(&mut self) -> Result<()> {
        self.dispatch(Event::Mount).map(drop)
    }

    /// The screen regained focus.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn focus(&mut self) -> Result<()> {
        self.dispatch(Event::Focus).map(drop)
    }

    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn allow_location(&mut self) -> Result<()> {
        self.dispatch(Event::AllowLocation).map(drop)
    }

    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn skip_location(&mut self) -> Result<()> {
        self.dispatch(Event::SkipLocation).map(drop)
    }

    /// Retries after an error or denial.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn retry_location(&mut self) -> Result<()> {
        self.dispatch(Event::RetryLocation).map(drop)
    }

    /// Re-acquires the position and restarts the search from page 1.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn refresh(&mut self) -> Result<()> {
        self.dispatch(Event::Refresh).map(drop)
    }

    /// Changes the search radius, resetting the session.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn set_radius(&mut self, radius_km: f64) -> Result<()> {
        self.dispatch(Event::SetRadius(radius_km)).map(drop)
    }

    /// Fetches the next page if one exists and no fetch is in flight.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn load_more(&mut self) -> Result<()> {
        self.dispatch(Event::LoadMore).map(drop)
    }

    /// A list row was selected: center the map on that gym.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn select_gym(&mut self, gym_id: &str) -> Result<()> {
        self.dispatch(Event::SelectGym(gym_id.to_string())).map(drop)
    }

    /// A map marker was selected: scroll the list to that gym.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn select_marker(&mut self, gym_id: &str) -> Result<()> {
        self.dispatch(Event::SelectMarker(gym_id.to_string())).map(drop)
    }

    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn map_ready(&mut self) -> Result<()> {
        self.dispatch(Event::MapReady).map(drop)
    }

    /// # Errors
    ///
    /// Propagates errors from [`dispatch`](Self::dispatch).
    pub fn filter_list(&mut self, query: &str) -> Result<()> {
        self.dispatch(Event::FilterList(query.to_string())).map(drop)
    }

    /// Looks up a gym profile directly, outside the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Search`](crate::DiscoveryError::Search) if the
    /// catalog cannot be queried. An unknown gym is `Ok(None)`.
    pub async fn gym_detail(&self, gym_id: &str) -> Result<Option<GymDetail>> {
        let detail = self
            .worker
            .search()
            .fetch_detail(gym_id)
            .instrument(tracing::info_span!("gym_detail", gym_id))
            .await?;
        Ok(detail)
    }
}

impl std::fmt::Debug for DiscoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryCoordinator")
            .field("phase", &self.state.phase)
            .field("pending", &self.tasks.len())
            .field("has_map", &self.map.is_some())
            .finish_non_exhaustive()
    }
}
