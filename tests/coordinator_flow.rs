mod support;

use chrono::{Duration as ChronoDuration, Utc};
use gym_discovery::location::PermissionStatus;
use gym_discovery::{DiscoveryFailure, DiscoveryPhase, LocationError};
use std::time::Duration;
use support::{
    delhi, gyms_body, FakeCatalog, FakePermissions, GeoBehavior, Harness, Reply, DELHI,
};
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<DiscoveryPhase>) -> Vec<DiscoveryPhase> {
    let mut phases = Vec::new();
    while let Ok(phase) = rx.try_recv() {
        phases.push(phase);
    }
    phases
}

fn names(phases: &[DiscoveryPhase]) -> Vec<&'static str> {
    phases.iter().map(DiscoveryPhase::name).collect()
}

#[tokio::test]
async fn fresh_cache_skips_permission_and_location() {
    let harness = Harness::happy();
    harness.store.save(Some(delhi()), true).unwrap();

    let mut coordinator = harness.coordinator();
    let mut phases = coordinator.subscribe();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(
        drain(&mut phases),
        vec![
            DiscoveryPhase::Restoring,
            DiscoveryPhase::Ready(delhi()),
            DiscoveryPhase::Searching,
            DiscoveryPhase::Results,
        ]
    );
    assert_eq!(harness.permissions.checks(), 0);
    assert_eq!(harness.geolocator.calls(), 0);
    assert_eq!(harness.catalog.discover_queries().len(), 1);
    assert_eq!(coordinator.state().session.gyms().len(), 20);
}

#[tokio::test]
async fn expired_cache_is_dropped_and_permission_checked() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::Fail(2),
        FakeCatalog::with_total(45, 20),
    );
    harness
        .store
        .save_at(Some(delhi()), true, Utc::now() - ChronoDuration::minutes(31))
        .unwrap();

    let mut coordinator = harness.coordinator();
    let mut phases = coordinator.subscribe();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(
        names(&drain(&mut phases)),
        vec!["restoring", "checking_permission", "acquiring", "error"]
    );
    assert_eq!(harness.permissions.checks(), 1);
    assert!(harness.store.load().unwrap().is_none());
    assert!(harness.catalog.queries().is_empty());

    let banner = coordinator.view_model().banner.unwrap();
    assert!(banner.suggest_gps_settings);
}

#[tokio::test]
async fn first_search_uses_acquired_position_and_defaults() {
    let harness = Harness::happy();
    let mut coordinator = harness.coordinator();

    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    let queries = harness.catalog.discover_queries();
    assert_eq!(queries.len(), 1);

    let query = &queries[0];
    let lat: f64 = query.param("lat").unwrap().parse().unwrap();
    let lon: f64 = query.param("lon").unwrap().parse().unwrap();
    assert!((lat - DELHI.0).abs() < 1e-9);
    assert!((lon - DELHI.1).abs() < 1e-9);
    assert_eq!(query.radius(), 10.0);
    assert_eq!(query.page(), 1);
    assert_eq!(query.param("limit"), Some("20"));
    assert_eq!(query.param("sort"), Some("distance"));
    assert_eq!(query.param("filter"), Some("all"));
    assert_eq!(query.param("search"), None);

    let cached = harness.store.load().unwrap().unwrap();
    assert_eq!(cached.usable_position(), Some(delhi()));
}

#[tokio::test]
async fn pages_accumulate_until_a_short_page() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::with_total(27, 20),
    );
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    // A full page means there may be more.
    assert!(coordinator.state().session.has_more());
    assert!(coordinator.view_model().can_load_more);

    coordinator.load_more().unwrap();
    coordinator.settle().await.unwrap();

    let session = &coordinator.state().session;
    assert_eq!(session.gyms().len(), 27);
    assert_eq!(session.current_page(), 2);
    assert!(!session.has_more());

    coordinator.load_more().unwrap();
    assert_eq!(coordinator.pending(), 0);
    coordinator.settle().await.unwrap();
    assert_eq!(harness.catalog.discover_queries().len(), 2);
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
}

#[tokio::test]
async fn not_found_is_an_empty_result() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::new(|_| Reply::status(404)),
    );
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    assert!(coordinator.state().session.gyms().is_empty());
    assert!(!coordinator.state().session.has_more());

    let view = coordinator.view_model();
    assert!(view.banner.is_none());
    assert_eq!(view.empty_state.unwrap().message, "No gyms in this radius");
}

#[tokio::test]
async fn server_error_ends_in_search_error() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::new(|_| Reply::status(500)),
    );
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert!(matches!(
        coordinator.phase(),
        DiscoveryPhase::Error(DiscoveryFailure::Search(_))
    ));
    assert!(!coordinator.view_model().banner.unwrap().suggest_gps_settings);
}

#[tokio::test]
async fn denial_then_retry_rechecks_permission() {
    let harness = Harness::new(
        FakePermissions::new(PermissionStatus::Denied, PermissionStatus::Denied),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::with_total(45, 20),
    );
    let mut coordinator = harness.coordinator();
    let mut phases = coordinator.subscribe();

    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(
        drain(&mut phases),
        vec![
            DiscoveryPhase::Restoring,
            DiscoveryPhase::CheckingPermission,
            DiscoveryPhase::Denied,
        ]
    );
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Denied);

    let record = harness.store.load().unwrap().unwrap();
    assert_eq!(record.position, None);
    assert!(!record.permission_granted);

    harness.permissions.set_status(PermissionStatus::Granted);
    coordinator.retry_location().unwrap();
    assert_eq!(drain(&mut phases), vec![DiscoveryPhase::CheckingPermission]);

    coordinator.settle().await.unwrap();
    assert_eq!(
        names(&drain(&mut phases)),
        vec!["acquiring", "ready", "searching", "results"]
    );
    assert_eq!(harness.geolocator.calls(), 1);
    assert_eq!(harness.catalog.discover_queries().len(), 1);
}

#[tokio::test]
async fn undetermined_permission_waits_for_the_user() {
    let harness = Harness::new(
        FakePermissions::new(PermissionStatus::Undetermined, PermissionStatus::Granted),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::with_total(5, 20),
    );
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(coordinator.phase(), &DiscoveryPhase::AwaitingUserChoice);
    assert!(coordinator.view_model().prompt.is_some());
    assert_eq!(harness.permissions.requests(), 0);

    coordinator.allow_location().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(harness.permissions.requests(), 1);
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    assert_eq!(coordinator.state().session.gyms().len(), 5);
}

#[tokio::test]
async fn skipping_the_prompt_denies_without_prompting() {
    let harness = Harness::new(
        FakePermissions::new(PermissionStatus::Undetermined, PermissionStatus::Granted),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::with_total(5, 20),
    );
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    coordinator.skip_location().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(coordinator.phase(), &DiscoveryPhase::Denied);
    assert_eq!(harness.permissions.requests(), 0);
    assert_eq!(harness.geolocator.calls(), 0);
    assert!(harness.catalog.queries().is_empty());
}

#[tokio::test]
async fn radius_change_resets_the_session() {
    let harness = Harness::happy();
    harness.store.save(Some(delhi()), true).unwrap();
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();
    coordinator.load_more().unwrap();
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.state().session.gyms().len(), 40);

    let mut phases = coordinator.subscribe();
    coordinator.set_radius(5.0).unwrap();

    let session = &coordinator.state().session;
    assert!(session.gyms().is_empty());
    assert_eq!(session.current_page(), 1);
    assert_eq!(session.radius_km(), 5.0);
    assert_eq!(
        drain(&mut phases),
        vec![
            DiscoveryPhase::Init,
            DiscoveryPhase::Ready(delhi()),
            DiscoveryPhase::Searching,
        ]
    );

    coordinator.settle().await.unwrap();
    let last = harness.catalog.discover_queries().pop().unwrap();
    assert_eq!(last.radius(), 5.0);
    assert_eq!(last.page(), 1);
    assert!(coordinator
        .state()
        .session
        .gyms()
        .iter()
        .all(|g| g.id.starts_with("r5-")));
    assert_eq!(harness.geolocator.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_response_for_the_old_radius_is_discarded() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::new(|query| {
            let tag = format!("r{}", query.radius());
            let delay = if query.radius() == 10.0 { 100 } else { 10 };
            Reply::ok(gyms_body(&tag, 0, 3)).after(Duration::from_millis(delay))
        }),
    );
    harness.store.save(Some(delhi()), true).unwrap();

    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    // Cache lookup resolves and the radius-10 fetch goes out.
    assert!(coordinator.step().await.unwrap());
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Searching);

    coordinator.set_radius(5.0).unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(harness.catalog.discover_queries().len(), 2);
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    let ids: Vec<&str> = coordinator
        .state()
        .session
        .gyms()
        .iter()
        .map(|g| g.id.as_str())
        .collect();
    assert_eq!(ids, vec!["r5-0", "r5-1", "r5-2"]);
}

#[tokio::test(start_paused = true)]
async fn early_response_for_the_old_radius_is_discarded() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::new(|query| {
            let tag = format!("r{}", query.radius());
            let delay = if query.radius() == 10.0 { 10 } else { 100 };
            Reply::ok(gyms_body(&tag, 0, 2)).after(Duration::from_millis(delay))
        }),
    );
    harness.store.save(Some(delhi()), true).unwrap();

    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.step().await.unwrap();
    coordinator.set_radius(5.0).unwrap();

    // The radius-10 page lands first and must not produce results.
    coordinator.step().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Searching);
    assert!(coordinator.state().session.gyms().is_empty());

    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    assert!(coordinator
        .state()
        .session
        .gyms()
        .iter()
        .all(|g| g.id.starts_with("r5-")));
}

#[tokio::test(start_paused = true)]
async fn hung_location_request_times_out() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::Hang,
        FakeCatalog::with_total(5, 20),
    );
    let mut coordinator = harness.coordinator();

    let started = tokio::time::Instant::now();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    assert_eq!(
        coordinator.phase(),
        &DiscoveryPhase::Error(DiscoveryFailure::Location(LocationError::Timeout))
    );
    assert!(started.elapsed() >= Duration::from_secs(35));
    assert!(harness.catalog.queries().is_empty());

    // Timeout retries go straight back to acquisition.
    harness.geolocator.set(GeoBehavior::At(DELHI.0, DELHI.1));
    coordinator.retry_location().unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Acquiring);
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);
    assert_eq!(harness.permissions.checks(), 1);
}

#[tokio::test]
async fn refresh_reacquires_and_restarts_at_page_one() {
    let harness = Harness::happy();
    harness
        .store
        .save(Some(gym_discovery::Position::new(19.076, 72.8777).unwrap()), true)
        .unwrap();
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();
    coordinator.load_more().unwrap();
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.state().session.current_page(), 2);

    coordinator.refresh().unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Acquiring);
    assert!(coordinator.state().session.gyms().is_empty());
    coordinator.settle().await.unwrap();

    assert_eq!(harness.geolocator.calls(), 1);
    assert_eq!(coordinator.state().position, Some(delhi()));
    assert_eq!(coordinator.state().session.current_page(), 1);
    let last = harness.catalog.discover_queries().pop().unwrap();
    assert_eq!(last.page(), 1);
}

#[tokio::test]
async fn refresh_after_os_refusal_goes_through_the_gate() {
    let harness = Harness::happy();
    harness.store.save(Some(delhi()), true).unwrap();
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Results);

    harness.geolocator.set(GeoBehavior::Fail(1));
    harness.permissions.set_status(PermissionStatus::Denied);
    coordinator.refresh().unwrap();
    coordinator.settle().await.unwrap();
    assert_eq!(
        coordinator.phase(),
        &DiscoveryPhase::Error(DiscoveryFailure::Location(LocationError::PermissionDenied))
    );
    assert_eq!(harness.geolocator.calls(), 1);
    let checks = harness.permissions.checks();

    coordinator.refresh().unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::CheckingPermission);
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Denied);

    coordinator.refresh().unwrap();
    coordinator.settle().await.unwrap();
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Denied);
    assert_eq!(harness.permissions.checks(), checks + 2);
    assert_eq!(harness.geolocator.calls(), 1);
}

#[tokio::test]
async fn map_and_list_stay_in_sync() {
    let harness = Harness::happy();
    harness.store.save(Some(delhi()), true).unwrap();
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    // Recentering waits for the map.
    assert!(harness.map.commands().is_empty());
    coordinator.map_ready().unwrap();
    assert_eq!(harness.map.commands(), vec![format!("center {}", delhi())]);

    coordinator.select_marker("r10-5").unwrap();
    assert_eq!(harness.map.commands().last().unwrap(), "scroll 5");
    assert_eq!(coordinator.state().view.selected_gym(), Some("r10-5"));

    coordinator.select_gym("r10-3").unwrap();
    let gym = coordinator.state().session.gyms()[3].coordinates;
    assert_eq!(
        harness.map.commands().last().unwrap(),
        &format!("center {gym}")
    );

    coordinator.select_gym("missing").unwrap();
    assert_eq!(harness.map.commands().len(), 3);
}

#[tokio::test]
async fn quick_filter_narrows_the_view_model() {
    let harness = Harness::happy();
    harness.store.save(Some(delhi()), true).unwrap();
    let mut coordinator = harness.coordinator();
    coordinator.mount().unwrap();
    coordinator.settle().await.unwrap();

    coordinator.filter_list("Gym 12").unwrap();
    let view = coordinator.view_model();
    assert!(!view.rows.is_empty());
    assert!(view.rows.len() < 20);
    assert!(view.rows.iter().any(|row| row.id == "r10-12"));
    assert!(view.rows.iter().all(|row| !row.highlight_ranges.is_empty()));
}

#[tokio::test]
async fn gym_detail_reads_the_profile_endpoint() {
    let harness = Harness::new(
        FakePermissions::granted(),
        GeoBehavior::At(DELHI.0, DELHI.1),
        FakeCatalog::new(|query| match query.path.as_str() {
            "/gyms/profile/g1" => Reply::ok(
                r#"{"success":true,"data":{"_id":"g1","name":"Iron Temple","lat":28.6,"lng":77.2,"description":"Free weights"}}"#
                    .to_string(),
            ),
            _ => Reply::status(404),
        }),
    );
    let coordinator = harness.coordinator();

    let detail = coordinator.gym_detail("g1").await.unwrap().unwrap();
    assert_eq!(detail.summary.name, "Iron Temple");
    assert_eq!(detail.description.as_deref(), Some("Free weights"));

    assert!(coordinator.gym_detail("nope").await.unwrap().is_none());
    assert_eq!(coordinator.phase(), &DiscoveryPhase::Init);
}
