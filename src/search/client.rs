//! Proximity search client.

use super::normalize::{normalize_detail, normalize_discover};
use super::request::{detail_path, SearchPage, SearchRequest, DISCOVER_PATH};
use super::transport::CatalogTransport;
use crate::domain::{GymDetail, SearchError};
use std::sync::Arc;
use tracing::Instrument;

/// Queries the remote catalog.
///
/// The client is stateless: page merging and staleness checks belong to the
/// discovery session, which knows which request it is waiting for.
#[derive(Clone)]
pub struct ProximitySearchClient {
    transport: Arc<dyn CatalogTransport>,
}

impl ProximitySearchClient {
    pub fn new(transport: Arc<dyn CatalogTransport>) -> Self {
        Self { transport }
    }

    /// Fetches one page of gyms.
    ///
    /// A not-found status yields an empty final page.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidRequest`] if the request fails validation; the
    ///   transport is not called
    /// - [`SearchError::Network`] / [`SearchError::Timeout`] from the transport
    ///   or for non-success statuses
    pub async fn fetch_page(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        request.validate()?;

        let span = tracing::info_span!(
            "fetch_page",
            radius_km = request.radius_km,
            page = request.page,
            limit = request.limit
        );

        async {
            let response = self
                .transport
                .get(DISCOVER_PATH, &request.query_pairs())
                .await?;
            let page = normalize_discover(response.status, &response.body, request.limit)?;
            tracing::info!(
                gyms = page.gyms.len(),
                is_last_page = page.is_last_page,
                "page fetched"
            );
            Ok::<_, SearchError>(page)
        }
        .instrument(span)
        .await
    }

    /// Fetches a gym profile, `None` if the catalog does not know it.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_page`](Self::fetch_page); an empty id is rejected
    /// locally.
    pub async fn fetch_detail(&self, id: &str) -> Result<Option<GymDetail>, SearchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SearchError::InvalidRequest("gym id is empty".to_string()));
        }

        let path = detail_path(id)?;
        let response = self
            .transport
            .get(&path, &[])
            .instrument(tracing::debug_span!("fetch_detail", gym_id = %id))
            .await?;
        normalize_detail(response.status, &response.body)
    }
}

impl std::fmt::Debug for ProximitySearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximitySearchClient").finish_non_exhaustive()
    }
}
