//! Actions representing side effects to be executed by the coordinator.
//!
//! The event handler returns a `Vec<Action>` after processing each event,
//! allowing multiple side effects to be queued atomically. The coordinator
//! executes them in order: worker messages are spawned as tasks, view
//! commands are applied to the map surface synchronously.

use crate::ui::ViewCommand;
use crate::worker::WorkerMessage;

/// Commands representing side effects to be executed by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Runs a capability call on the worker. Its response comes back as
    /// `Event::WorkerResponse`.
    PostToWorker(WorkerMessage),

    /// Drives the map or list. Failures are ignored.
    View(ViewCommand),
}
