//! HTTP access to the remote catalog.
//!
//! The transport only moves bytes: it reports the status code and raw body
//! and leaves every interpretation (not-found, envelopes, aliases) to
//! [`crate::search::normalize`].

use crate::domain::SearchError;
use async_trait::async_trait;
use std::time::Duration;

/// Raw catalog response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Catalog transport capability.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Issues `GET path?query`.
    ///
    /// Any status code is a successful transport result; only failures to
    /// obtain a response at all are errors.
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<TransportResponse, SearchError>;
}

/// [`CatalogTransport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Network`] if the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialize).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<TransportResponse, SearchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, params = query.len(), "catalog GET");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        tracing::debug!(status, bytes = body.len(), "catalog responded");
        Ok(TransportResponse { status, body })
    }
}

fn classify(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        tracing::warn!(error = %e, "catalog request timed out");
        SearchError::Timeout
    } else {
        tracing::warn!(error = %e, "catalog unreachable");
        SearchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let transport =
            HttpTransport::new("https://api.example.test/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "https://api.example.test/v1");
    }
}
