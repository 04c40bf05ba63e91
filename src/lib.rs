//! Gym discovery: a location-aware client for a remote gym catalog.
//!
//! The crate takes a screen from "nothing known" to a paginated list of gyms
//! near the device:
//! - Gated access to the OS location permission (allow/skip prompt when undecided)
//! - Position acquisition with a client-side watchdog and single-flight calls
//! - A persisted last-known position with a 30 minute time-to-live
//! - Paginated proximity search with radius changes, load-more and refresh
//! - Map/list selection sync and a fuzzy quick filter over the loaded list

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs) / host application                   │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Coordinator (coordinator.rs)                       │  ← Tasks, channels
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling, phase transitions                │
//! │  - Discovery session (pages, staleness)             │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Bridge     │   │ Worker        │   │ Storage       │
//! │ (ui/)         │   │ (worker/)     │   │ (storage/)    │
//! │ - ViewSync    │   │ - Capability  │   │ - Key-value   │
//! │ - MapSurface  │   │   calls       │   │ - PositionStore│
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌───────────────────────────────┐ ┌───────────────────┐
//! │ Location (location/)          │ │ Search (search/)  │
//! │ - PermissionGate              │ │ - HTTP transport  │
//! │ - LocationAcquirer            │ │ - Normalization   │
//! └───────────────────────────────┘ └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Pure state machine with an event/action model
//! - [`coordinator`]: Async driver that runs worker tasks and publishes phases
//! - [`domain`]: Positions, gyms, and error taxonomies
//! - [`infrastructure`]: Data directory resolution
//! - [`location`]: Permission gate and position acquisition
//! - [`search`]: Catalog transport and proximity search client
//! - [`storage`]: Key-value backends and the position cache
//! - [`ui`]: View sync, map surface capability, view model and text renderer
//! - [`worker`]: Executes capability calls for the state machine
//! - [`observability`]: `tracing` with OpenTelemetry file export
//!
//! # Example
//!
//! ```rust,no_run
//! use gym_discovery::{initialize, Config, Platform};
//! # async fn run(platform: Platform) -> gym_discovery::Result<()> {
//! let config = Config::from_env();
//! let mut coordinator = initialize(&config, platform)?;
//!
//! coordinator.mount()?;
//! coordinator.settle().await?;
//! println!("{:?}", coordinator.phase());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod coordinator;
pub mod domain;
pub mod infrastructure;
pub mod location;
pub mod observability;
pub mod search;
pub mod storage;
pub mod ui;
pub mod worker;

pub use app::{handle_event, Action, AppState, DiscoveryFailure, DiscoveryPhase, DiscoverySettings, Event};
pub use coordinator::DiscoveryCoordinator;
pub use domain::{DiscoveryError, GymDetail, GymSummary, LocationError, Position, Result, SearchError};

use location::{AcquireOptions, Geolocator, LocationAcquirer, LocationPermissionApi, PermissionGate};
use search::{HttpTransport, ProximitySearchClient, SearchDefaults};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{JsonFileStore, PositionStore};
use ui::MapSurface;
use worker::DiscoveryWorker;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "GYM_DISCOVERY_";

/// Longest accepted position cache lifetime, one year.
pub const MAX_TTL_MINUTES: i64 = 525_600;

/// Client configuration.
///
/// Every field has a default, so any source may set only what it needs. Keys
/// are the field names in every source (`page_limit`, `trace_level`, ...).
///
/// # Example
///
/// ```toml
/// api_base_url = "https://api.example.com/api"
/// default_radius_km = 5
/// page_limit = 30
/// trace_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog base URL, without the `/gyms/...` path.
    pub api_base_url: String,

    /// Radius of the first search in kilometers. Default: 10
    pub default_radius_km: f64,

    /// Gyms per page. Default: 20
    pub page_limit: u32,

    pub sort: String,
    pub filter: String,
    pub search: String,

    /// Platform location timeout. Default: 30000
    pub location_timeout_ms: u64,

    /// Oldest acceptable fix. Default: 60000
    pub location_max_age_ms: u64,

    /// Added to the platform timeout to form the client watchdog. Default: 5000
    pub watchdog_grace_ms: u64,

    pub high_accuracy: bool,

    /// Lifetime of the cached position. Default: 30
    pub cache_ttl_minutes: i64,

    /// Per-request HTTP timeout. Default: 15
    pub request_timeout_secs: u64,

    /// Where `store.json` and the trace file live.
    ///
    /// Default: `~/.local/share/gym-discovery`
    pub data_dir: Option<String>,

    /// Tracing level.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,

    /// Also print log events to stderr.
    pub log_to_stderr: bool,
}

impl Default for Config {
    fn default() -> Self {
        let search = SearchDefaults::default();
        let acquire = AcquireOptions::default();
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            default_radius_km: 10.0,
            page_limit: search.limit,
            sort: search.sort,
            filter: search.filter,
            search: search.search,
            location_timeout_ms: acquire.timeout_ms,
            location_max_age_ms: acquire.max_age_ms,
            watchdog_grace_ms: location::DEFAULT_WATCHDOG_GRACE_MS,
            high_accuracy: acquire.high_accuracy,
            cache_ttl_minutes: storage::DEFAULT_TTL_MINUTES,
            request_timeout_secs: 15,
            data_dir: None,
            trace_level: None,
            log_to_stderr: false,
        }
    }
}

impl Config {
    /// Parses configuration from a string map.
    ///
    /// Unknown keys are ignored. A value that does not parse, or a number
    /// that is out of range (zero limit, non-positive radius), falls back to
    /// its default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use gym_discovery::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("default_radius_km".to_string(), "5".to_string());
    /// map.insert("page_limit".to_string(), "lots".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.default_radius_km, 5.0);
    /// assert_eq!(config.page_limit, 20);
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            config
                .get(key)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let number = |key: &str| text(key).and_then(|s| s.parse::<f64>().ok());
        let unsigned = |key: &str| text(key).and_then(|s| s.parse::<u64>().ok());
        let flag = |key: &str| {
            text(key).and_then(|s| match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            })
        };

        Self {
            api_base_url: text("api_base_url").unwrap_or(defaults.api_base_url),
            default_radius_km: number("default_radius_km").unwrap_or(defaults.default_radius_km),
            page_limit: unsigned("page_limit")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.page_limit),
            sort: text("sort").unwrap_or(defaults.sort),
            filter: text("filter").unwrap_or(defaults.filter),
            search: text("search").unwrap_or(defaults.search),
            location_timeout_ms: unsigned("location_timeout_ms")
                .unwrap_or(defaults.location_timeout_ms),
            location_max_age_ms: unsigned("location_max_age_ms")
                .unwrap_or(defaults.location_max_age_ms),
            watchdog_grace_ms: unsigned("watchdog_grace_ms").unwrap_or(defaults.watchdog_grace_ms),
            high_accuracy: flag("high_accuracy").unwrap_or(defaults.high_accuracy),
            cache_ttl_minutes: unsigned("cache_ttl_minutes")
                .and_then(|n| i64::try_from(n).ok())
                .unwrap_or(defaults.cache_ttl_minutes),
            request_timeout_secs: unsigned("request_timeout_secs")
                .unwrap_or(defaults.request_timeout_secs),
            data_dir: text("data_dir"),
            trace_level: text("trace_level"),
            log_to_stderr: flag("log_to_stderr").unwrap_or(defaults.log_to_stderr),
        }
        .sanitized()
    }

    /// Replaces out-of-range numbers with their defaults.
    ///
    /// Radius, page limit, location timeout, watchdog grace and request
    /// timeout must be positive. The cache TTL must lie in
    /// `1..=MAX_TTL_MINUTES`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: u64, fallback: u64| if value > 0 { value } else { fallback };
        Self {
            default_radius_km: if self.default_radius_km.is_finite() && self.default_radius_km > 0.0 {
                self.default_radius_km
            } else {
                defaults.default_radius_km
            },
            page_limit: if self.page_limit > 0 {
                self.page_limit
            } else {
                defaults.page_limit
            },
            location_timeout_ms: positive(self.location_timeout_ms, defaults.location_timeout_ms),
            watchdog_grace_ms: positive(self.watchdog_grace_ms, defaults.watchdog_grace_ms),
            cache_ttl_minutes: if (1..=MAX_TTL_MINUTES).contains(&self.cache_ttl_minutes) {
                self.cache_ttl_minutes
            } else {
                defaults.cache_ttl_minutes
            },
            request_timeout_secs: positive(self.request_timeout_secs, defaults.request_timeout_secs),
            ..self
        }
    }

    /// Reads `GYM_DISCOVERY_*` environment variables.
    ///
    /// `GYM_DISCOVERY_PAGE_LIMIT=30` sets `page_limit`, and so on.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Like [`from_env`](Self::from_env) over an explicit variable list.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let map: BTreeMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|rest| (rest.to_ascii_lowercase(), value))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Loads a TOML file. Missing keys take their defaults and out-of-range
    /// numbers are treated as in [`from_map`](Self::from_map).
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Io`] if the file cannot be read and
    /// [`DiscoveryError::Config`] if it is not valid TOML for this struct.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        toml::from_str::<Self>(&contents)
            .map(Self::sanitized)
            .map_err(|e| DiscoveryError::Config(format!("{}: {e}", path.display())))
    }

    /// Session-constant settings for the state machine.
    #[must_use]
    pub fn settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            search: SearchDefaults {
                limit: self.page_limit,
                sort: self.sort.clone(),
                filter: self.filter.clone(),
                search: self.search.clone(),
            },
            default_radius_km: self.default_radius_km,
            acquire: AcquireOptions {
                timeout_ms: self.location_timeout_ms,
                max_age_ms: self.location_max_age_ms,
                high_accuracy: self.high_accuracy,
            },
        }
    }
}

/// Device capabilities supplied by the host.
#[derive(Clone)]
pub struct Platform {
    pub permissions: Arc<dyn LocationPermissionApi>,
    pub geolocator: Arc<dyn Geolocator>,
    /// Map and list surface, if the host renders one.
    pub map: Option<Arc<dyn MapSurface>>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("has_map", &self.map.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds a coordinator wired to the file-backed position cache and the HTTP
/// catalog.
///
/// The position cache lives at `<data_dir>/store.json`. Tracing is not
/// initialized here; call [`observability::init_tracing`] first if wanted.
///
/// # Errors
///
/// - [`DiscoveryError::Io`] if the data directory or store file cannot be
///   prepared. An unparseable store file is deleted and recreated.
/// - [`DiscoveryError::Config`] if `cache_ttl_minutes` is not a usable
///   duration (only possible when `config` was built by hand)
/// - [`DiscoveryError::Search`] if the HTTP client cannot be built
pub fn initialize(config: &Config, platform: Platform) -> Result<DiscoveryCoordinator> {
    tracing::debug!(api_base_url = %config.api_base_url, "initializing gym discovery");

    let data_dir = infrastructure::get_data_dir(config.data_dir.as_deref());
    std::fs::create_dir_all(&data_dir)?;

    let store_path = data_dir.join("store.json");
    let backend = match JsonFileStore::new(store_path.clone()) {
        Err(DiscoveryError::Storage(reason)) => {
            // Only a cache lives here; start over rather than refuse to run.
            tracing::warn!(path = ?store_path, %reason, "discarding unreadable store");
            std::fs::remove_file(&store_path)?;
            JsonFileStore::new(store_path)?
        }
        other => other?,
    };
    let ttl = chrono::Duration::try_minutes(config.cache_ttl_minutes)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .ok_or_else(|| {
            DiscoveryError::Config(format!(
                "cache_ttl_minutes out of range: {}",
                config.cache_ttl_minutes
            ))
        })?;
    let store = Arc::new(PositionStore::new(Box::new(backend)).with_ttl(ttl));

    let transport = HttpTransport::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let acquirer = LocationAcquirer::new(platform.geolocator, Arc::clone(&store))
        .with_grace(Duration::from_millis(config.watchdog_grace_ms));

    let worker = DiscoveryWorker::new(
        store,
        PermissionGate::new(platform.permissions),
        acquirer,
        ProximitySearchClient::new(Arc::new(transport)),
    );

    let coordinator = DiscoveryCoordinator::new(config.settings(), Arc::new(worker));
    Ok(match platform.map {
        Some(map) => coordinator.with_map(map),
        None => coordinator,
    })
}
