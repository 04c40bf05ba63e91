//! Remote catalog search.
//!
//! # Modules
//!
//! - `request`: [`SearchRequest`], [`SearchDefaults`] and [`SearchPage`]
//! - `transport`: [`CatalogTransport`] capability and the `reqwest` implementation
//! - `normalize`: status/body normalization and lenient gym parsing
//! - `client`: [`ProximitySearchClient`]

pub mod client;
pub mod normalize;
pub mod request;
pub mod transport;

pub use client::ProximitySearchClient;
pub use request::{detail_path, SearchDefaults, SearchPage, SearchRequest, DISCOVER_PATH};
pub use transport::{CatalogTransport, HttpTransport, TransportResponse};
