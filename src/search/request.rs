//! Discovery query and page types.

use crate::domain::{GymSummary, Position, SearchError};

/// Path of the proximity search endpoint.
pub const DISCOVER_PATH: &str = "/gyms/discover";

/// Path of the gym profile endpoint for `id`.
///
/// The id is percent-encoded as a single path segment, so `/`, `?` or `#`
/// inside it cannot reach another endpoint.
///
/// # Errors
///
/// [`SearchError::InvalidRequest`] for an empty id or a dot segment.
///
/// ```
/// use gym_discovery::search::detail_path;
///
/// assert_eq!(detail_path("a/b?c").unwrap(), "/gyms/profile/a%2Fb%3Fc");
/// ```
pub fn detail_path(id: &str) -> Result<String, SearchError> {
    if matches!(id, "" | "." | "..") {
        return Err(SearchError::InvalidRequest(format!("invalid gym id {id:?}")));
    }
    let mut url = reqwest::Url::parse("http://catalog.invalid/gyms/profile")
        .map_err(|e| SearchError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| SearchError::InvalidRequest("profile path cannot take segments".to_string()))?
        .push(id);
    Ok(url.path().to_string())
}

/// Query parameters that stay constant for a whole discovery session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    pub limit: u32,
    pub sort: String,
    pub filter: String,
    /// Free-text search; omitted from the query when empty.
    pub search: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            limit: 20,
            sort: "distance".to_string(),
            filter: "all".to_string(),
            search: String::new(),
        }
    }
}

/// One discovery query.
///
/// Built fresh for every fetch. Within a session only `page` and `radius_km`
/// vary; everything else comes from [`SearchDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub filter: String,
    pub search: String,
}

impl SearchRequest {
    /// Builds the request for `page` around `position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gym_discovery::search::{SearchDefaults, SearchRequest};
    /// use gym_discovery::Position;
    ///
    /// let at = Position::new(28.6139, 77.2090)?;
    /// let request = SearchRequest::new(at, 10.0, 1, &SearchDefaults::default());
    /// assert_eq!(request.limit, 20);
    /// assert_eq!(request.sort, "distance");
    /// # Ok::<(), gym_discovery::DiscoveryError>(())
    /// ```
    #[must_use]
    pub fn new(position: Position, radius_km: f64, page: u32, defaults: &SearchDefaults) -> Self {
        Self {
            lat: position.latitude,
            lon: position.longitude,
            radius_km,
            page,
            limit: defaults.limit,
            sort: defaults.sort.clone(),
            filter: defaults.filter.clone(),
            search: defaults.search.clone(),
        }
    }

    /// Rejects requests that must never reach the network.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] for non-finite coordinates, a
    /// non-positive radius, page 0 or limit 0.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(SearchError::InvalidRequest(format!(
                "coordinates ({}, {}) are not finite",
                self.lat, self.lon
            )));
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(SearchError::InvalidRequest(format!(
                "radius {} km is not positive",
                self.radius_km
            )));
        }
        if self.page == 0 {
            return Err(SearchError::InvalidRequest("page numbers start at 1".to_string()));
        }
        if self.limit == 0 {
            return Err(SearchError::InvalidRequest("limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Query string pairs in wire order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.lat.to_string()),
            ("lon", self.lon.to_string()),
            ("radius", self.radius_km.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.clone()),
            ("filter", self.filter.clone()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

/// One normalized page of results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub gyms: Vec<GymSummary>,
    /// `true` when the catalog returned fewer entries than requested.
    pub is_last_page: bool,
}

impl SearchPage {
    /// The empty, final page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            gyms: Vec::new(),
            is_last_page: true,
        }
    }
}
