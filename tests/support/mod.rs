//! Deterministic fakes for every capability the coordinator talks to.

#![allow(dead_code)]

use async_trait::async_trait;
use gym_discovery::app::DiscoverySettings;
use gym_discovery::location::{
    AcquireOptions, Fix, Geolocator, LocationAcquirer, LocationPermissionApi, PermissionGate,
    PermissionStatus, PlatformError,
};
use gym_discovery::search::{CatalogTransport, ProximitySearchClient, TransportResponse};
use gym_discovery::storage::PositionStore;
use gym_discovery::ui::{MapSurface, SurfaceError};
use gym_discovery::worker::DiscoveryWorker;
use gym_discovery::{DiscoveryCoordinator, Position, SearchError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DELHI: (f64, f64) = (28.6139, 77.2090);

pub fn delhi() -> Position {
    Position::new(DELHI.0, DELHI.1).unwrap()
}

pub struct FakePermissions {
    status: Mutex<PermissionStatus>,
    answer: Mutex<PermissionStatus>,
    checks: AtomicUsize,
    requests: AtomicUsize,
}

impl FakePermissions {
    /// `check` reports `status`; `request` answers with `answer`.
    pub fn new(status: PermissionStatus, answer: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            answer: Mutex::new(answer),
            checks: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn set_status(&self, status: PermissionStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationPermissionApi for FakePermissions {
    async fn check(&self) -> Result<PermissionStatus, PlatformError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(*self.status.lock().unwrap())
    }

    async fn request(&self) -> Result<PermissionStatus, PlatformError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        *self.status.lock().unwrap() = answer;
        Ok(answer)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GeoBehavior {
    At(f64, f64),
    Fail(i32),
    /// Never answers; only the watchdog ends the call.
    Hang,
}

pub struct FakeGeolocator {
    behavior: Mutex<GeoBehavior>,
    calls: AtomicUsize,
}

impl FakeGeolocator {
    pub fn new(behavior: GeoBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, behavior: GeoBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocator for FakeGeolocator {
    async fn current_position(&self, _options: AcquireOptions) -> Result<Fix, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            GeoBehavior::At(lat, lon) => Ok(Fix::now(lat, lon)),
            GeoBehavior::Fail(code) => Err(PlatformError::new(code, "scripted failure")),
            GeoBehavior::Hang => std::future::pending().await,
        }
    }
}

/// One recorded catalog call.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl Query {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn radius(&self) -> f64 {
        self.param("radius").and_then(|r| r.parse().ok()).unwrap_or(f64::NAN)
    }

    pub fn page(&self) -> u32 {
        self.param("page").and_then(|p| p.parse().ok()).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: String) -> Self {
        Self {
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = Box<dyn Fn(&Query) -> Reply + Send + Sync>;

pub struct FakeCatalog {
    responder: Responder,
    queries: Mutex<Vec<Query>>,
}

impl FakeCatalog {
    pub fn new(responder: impl Fn(&Query) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Full pages of `limit` gyms, tagged with the radius, until `total` is
    /// reached.
    pub fn with_total(total: usize, limit: usize) -> Self {
        Self::new(move |query| {
            let start = (query.page() as usize).saturating_sub(1) * limit;
            let count = total.saturating_sub(start).min(limit);
            Reply::ok(gyms_body(&format!("r{}", query.radius()), start, count))
        })
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn discover_queries(&self) -> Vec<Query> {
        self.queries()
            .into_iter()
            .filter(|q| q.path == "/gyms/discover")
            .collect()
    }
}

#[async_trait]
impl CatalogTransport for FakeCatalog {
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<TransportResponse, SearchError> {
        let recorded = Query {
            path: path.to_string(),
            params: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        };
        self.queries.lock().unwrap().push(recorded.clone());

        let reply = (self.responder)(&recorded);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        Ok(TransportResponse::new(reply.status, reply.body))
    }
}

/// `{"success":true,"data":[...]}` with `count` gyms `{tag}-{start}`, ... .
pub fn gyms_body(tag: &str, start: usize, count: usize) -> String {
    let entries: Vec<String> = (start..start + count)
        .map(|i| {
            format!(
                r#"{{"_id":"{tag}-{i}","name":"Gym {i}","address":"Sector {i}","lat":{},"lng":{},"rating":4.2,"dailyPassPrice":199,"type":"gym"}}"#,
                DELHI.0 + i as f64 * 0.001,
                DELHI.1
            )
        })
        .collect();
    format!(r#"{{"success":true,"data":[{}]}}"#, entries.join(","))
}

#[derive(Default)]
pub struct RecordingMap {
    commands: Mutex<Vec<String>>,
}

impl RecordingMap {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl MapSurface for RecordingMap {
    fn center_on(&self, position: Position) -> Result<(), SurfaceError> {
        self.commands.lock().unwrap().push(format!("center {position}"));
        Ok(())
    }

    fn scroll_list_to(&self, index: usize) -> Result<(), SurfaceError> {
        self.commands.lock().unwrap().push(format!("scroll {index}"));
        Ok(())
    }
}

/// All fakes plus the shared position store.
pub struct Harness {
    pub store: Arc<PositionStore>,
    pub permissions: Arc<FakePermissions>,
    pub geolocator: Arc<FakeGeolocator>,
    pub catalog: Arc<FakeCatalog>,
    pub map: Arc<RecordingMap>,
}

impl Harness {
    pub fn new(permissions: FakePermissions, geo: GeoBehavior, catalog: FakeCatalog) -> Self {
        Self {
            store: Arc::new(PositionStore::in_memory()),
            permissions: Arc::new(permissions),
            geolocator: Arc::new(FakeGeolocator::new(geo)),
            catalog: Arc::new(catalog),
            map: Arc::new(RecordingMap::default()),
        }
    }

    /// Granted permission, a Delhi fix, and 45 gyms per radius.
    pub fn happy() -> Self {
        Self::new(
            FakePermissions::granted(),
            GeoBehavior::At(DELHI.0, DELHI.1),
            FakeCatalog::with_total(45, 20),
        )
    }

    pub fn coordinator(&self) -> DiscoveryCoordinator {
        let acquirer = LocationAcquirer::new(self.geolocator.clone(), Arc::clone(&self.store));
        let worker = DiscoveryWorker::new(
            Arc::clone(&self.store),
            PermissionGate::new(self.permissions.clone()),
            acquirer,
            ProximitySearchClient::new(self.catalog.clone()),
        );
        DiscoveryCoordinator::new(DiscoverySettings::default(), Arc::new(worker))
            .with_map(self.map.clone())
    }
}
