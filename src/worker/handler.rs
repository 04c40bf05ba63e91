//! Worker implementation for side-effecting operations.
//!
//! The worker owns every capability the state machine needs (position store,
//! permission gate, location acquirer, search client) and turns each
//! [`WorkerMessage`] into exactly one [`WorkerResponse`]. It is shared behind
//! an `Arc` and each message is processed on its own task, so a slow fetch
//! never blocks a permission probe.

use crate::app::state::RequestKey;
use crate::domain::error::Result;
use crate::location::{LocationAcquirer, PermissionGate};
use crate::search::{ProximitySearchClient, SearchRequest};
use crate::storage::PositionStore;
use crate::worker::{WorkerMessage, WorkerResponse};
use std::sync::Arc;

/// Executes worker messages against the injected capabilities.
#[derive(Debug)]
pub struct DiscoveryWorker {
    store: Arc<PositionStore>,
    gate: PermissionGate,
    acquirer: LocationAcquirer,
    search: ProximitySearchClient,
}

impl DiscoveryWorker {
    /// Creates a worker. The acquirer should write through to the same
    /// `store`.
    pub fn new(
        store: Arc<PositionStore>,
        gate: PermissionGate,
        acquirer: LocationAcquirer,
        search: ProximitySearchClient,
    ) -> Self {
        Self {
            store,
            gate,
            acquirer,
            search,
        }
    }

    /// Search client, for direct detail lookups.
    #[must_use]
    pub const fn search(&self) -> &ProximitySearchClient {
        &self.search
    }

    /// Processes one message.
    pub async fn process(&self, message: WorkerMessage) -> WorkerResponse {
        tracing::debug!(operation = message.name(), "worker processing message");

        match message {
            WorkerMessage::LoadCachedPosition => self.handle_load_cached(),
            WorkerMessage::CheckPermission => {
                WorkerResponse::PermissionChecked(self.gate.check().await)
            }
            WorkerMessage::RequestPermission => {
                WorkerResponse::PermissionRequested(self.gate.request().await)
            }
            WorkerMessage::AcquireLocation { options } => {
                match self.acquirer.acquire(options).await {
                    Ok(position) => WorkerResponse::LocationAcquired(position),
                    Err(reason) => WorkerResponse::LocationFailed(reason),
                }
            }
            WorkerMessage::FetchPage { key, request } => self.handle_fetch_page(key, &request).await,
            WorkerMessage::RecordDenial => self.handle_record_denial(),
        }
    }

    /// Logs a store result, falling back to `default` on failure.
    ///
    /// Store failures never reach the state machine: a failed read is a cache
    /// miss and a failed write is only a lost optimization.
    fn handle_store_result<T>(operation: &str, result: Result<T>, default: T) -> T {
        match result {
            Ok(value) => {
                tracing::debug!(operation, "store operation successful");
                value
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "store operation failed");
                default
            }
        }
    }

    fn handle_load_cached(&self) -> WorkerResponse {
        let cached = Self::handle_store_result("load cached position", self.store.load(), None);
        WorkerResponse::CachedPositionLoaded(cached)
    }

    fn handle_record_denial(&self) -> WorkerResponse {
        Self::handle_store_result("record denial", self.store.save(None, false), ());
        WorkerResponse::DenialRecorded
    }

    async fn handle_fetch_page(
        &self,
        key: RequestKey,
        request: &SearchRequest,
    ) -> WorkerResponse {
        match self.search.fetch_page(request).await {
            Ok(page) => WorkerResponse::PageFetched { key, page },
            Err(error) => {
                tracing::warn!(%error, page = key.page, "page fetch failed");
                WorkerResponse::PageFailed { key, error }
            }
        }
    }
}
