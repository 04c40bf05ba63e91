//! Application layer: the discovery state machine.
//!
//! This module sits between the coordinator (which owns tasks, channels and
//! capabilities) and the worker. Everything in it is synchronous and
//! deterministic, so the whole state machine can be tested without a runtime.
//!
//! # Architecture
//!
//! The application layer follows a unidirectional data flow pattern:
//!
//! ```text
//! User Controls → Events → Event Handler → State Mutations → Actions → Side Effects
//!                              ↑                                    ↓
//!                              └───────── Worker Responses ─────────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`handler`]: Event processing logic and state transitions
//! - [`modes`]: Discovery phases and failure causes
//! - [`state`]: State container, discovery session, and view model computation

pub mod actions;
pub mod handler;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{DiscoveryFailure, DiscoveryPhase};
pub use state::{AppState, DiscoverySession, DiscoverySettings, RequestKey};
