//! Worker message types.
//!
//! This module defines the request and response protocol between the state
//! machine and the worker that talks to the platform, the position store, and
//! the catalog. Search messages carry the [`RequestKey`] they were issued
//! under so that the state machine can drop answers to superseded requests.

use crate::app::state::RequestKey;
use crate::domain::{LocationError, Position, SearchError};
use crate::location::{AcquireOptions, PermissionStatus};
use crate::search::{SearchPage, SearchRequest};
use crate::storage::CachedPosition;

/// Messages sent from the state machine to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Read the position cache (expired records are deleted).
    LoadCachedPosition,

    /// Probe the OS permission without prompting.
    CheckPermission,

    /// Show the OS permission prompt if still undetermined.
    RequestPermission,

    /// Acquire a fresh device position.
    AcquireLocation {
        options: AcquireOptions,
    },

    /// Fetch one discovery page.
    FetchPage {
        /// Identity of the request within its session.
        key: RequestKey,
        request: SearchRequest,
    },

    /// Persist an explicit permission denial (`position = null`).
    RecordDenial,
}

impl WorkerMessage {
    /// Short operation name for logs and spans.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadCachedPosition => "load_cached_position",
            Self::CheckPermission => "check_permission",
            Self::RequestPermission => "request_permission",
            Self::AcquireLocation { .. } => "acquire_location",
            Self::FetchPage { .. } => "fetch_page",
            Self::RecordDenial => "record_denial",
        }
    }
}

/// Responses sent from the worker back to the state machine.
///
/// Capability failures are part of the payload; the worker itself never
/// fails a message.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
    /// Result of reading the cache; `None` on a miss, expiry, or store error.
    CachedPositionLoaded(Option<CachedPosition>),

    PermissionChecked(PermissionStatus),

    PermissionRequested(PermissionStatus),

    LocationAcquired(Position),

    LocationFailed(LocationError),

    PageFetched {
        key: RequestKey,
        page: SearchPage,
    },

    PageFailed {
        key: RequestKey,
        error: SearchError,
    },

    /// The denial was written (or the write failed and was logged).
    DenialRecorded,
}
