//! Worker for platform, storage, and network operations.
//!
//! The state machine never calls a capability directly. It emits
//! `Action::PostToWorker`, the coordinator runs the message on a task, and the
//! response comes back as an event.
//!
//! # Architecture
//!
//! - `messages`: Request/response protocol types
//! - `handler`: Worker implementation and message processing logic

pub mod handler;
pub mod messages;

pub use handler::DiscoveryWorker;
pub use messages::{WorkerMessage, WorkerResponse};
