//! Integration tests for the supervisor run loop.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use edge_appliance::config::{Config, ServicesConfig};
use edge_appliance::error::AppError;
use edge_appliance::supervisor::{self, health::HealthRegistry, health::ServiceState};
use edge_appliance::supervisor::registry::ServiceEntry;
use edge_appliance::subsystems::runtime::{ServiceContext, ServiceFuture};

// ── helpers ──────────────────────────────────────────────────────────────────

fn services(dir: &TempDir) -> Arc<ServicesConfig> {
    Arc::new(Config::test_default(dir.path()).services)
}

fn waiter(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(async move {
        ctx.health.set_running().await;
        ctx.shutdown.cancelled().await;
        Ok(())
    })
}

fn failing(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(async move { Err(ctx.fail("boom")) })
}

fn quick_ok(_ctx: ServiceContext) -> ServiceFuture {
    Box::pin(async { Ok(()) })
}

fn stubborn(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(async move {
        ctx.health.set_running().await;
        std::future::pending::<()>().await;
        Ok(())
    })
}

async fn blow_up() -> Result<(), AppError> {
    panic!("service blew up")
}

fn panicking(_ctx: ServiceContext) -> ServiceFuture {
    Box::pin(blow_up())
}

async fn wait_for_state(health: &HealthRegistry, id: &str, state: ServiceState) {
    loop {
        if health.get(id).await.is_some_and(|h| h.state == state) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ── tests ────────────────────────────────────────────────────────────────────

static COUNTED_STARTS: AtomicUsize = AtomicUsize::new(0);

fn counted(ctx: ServiceContext) -> ServiceFuture {
    COUNTED_STARTS.fetch_add(1, Ordering::SeqCst);
    waiter(ctx)
}

#[tokio::test]
async fn building_a_list_starts_nothing() {
    let list = vec![ServiceEntry::new("counted", counted), ServiceEntry::new("counted2", counted)];
    let copy = list.clone();
    assert_eq!(copy.len(), 2);
    assert_eq!(COUNTED_STARTS.load(Ordering::SeqCst), 0);

    let dir = TempDir::new().unwrap();
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    supervisor::run(list, services(&dir), HealthRegistry::new(), shutdown, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(COUNTED_STARTS.load(Ordering::SeqCst), 2);
}

#[cfg(all(feature = "service-ela", feature = "service-eva", feature = "service-eda"))]
#[tokio::test]
async fn resolving_a_profile_has_no_side_effects() {
    use edge_appliance::profile::Profile;
    use edge_appliance::supervisor::registry;

    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();

    let list = registry::services_for(Profile::Nts).unwrap();
    let again = registry::services_for(Profile::Nts).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(again.len(), 3);
    tokio::task::yield_now().await;

    assert!(health.snapshot().await.is_empty());
    assert!(!dir.path().join("images").exists());

    // Side effects only appear once the list is actually run.
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    supervisor::run(list, services(&dir), health.clone(), shutdown, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(health.snapshot().await.len(), 3);
    assert!(dir.path().join("images").is_dir());
}

static START_ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

fn ordered(ctx: ServiceContext) -> ServiceFuture {
    START_ORDER.lock().unwrap().push(ctx.name);
    waiter(ctx)
}

#[tokio::test]
async fn services_start_in_list_order() {
    let list = vec![
        ServiceEntry::new("third", ordered),
        ServiceEntry::new("first", ordered),
        ServiceEntry::new("second", ordered),
    ];
    let dir = TempDir::new().unwrap();
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    supervisor::run(list, services(&dir), HealthRegistry::new(), shutdown, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(*START_ORDER.lock().unwrap(), vec!["third", "first", "second"]);
}

#[tokio::test]
async fn empty_list_returns_immediately() {
    let dir = TempDir::new().unwrap();
    let shutdown = CancellationToken::new();
    let result = supervisor::run(
        vec![],
        services(&dir),
        HealthRegistry::new(),
        shutdown.clone(),
        Duration::from_secs(1),
    )
    .await;
    assert!(result.is_ok());
    assert!(!shutdown.is_cancelled());
}

#[tokio::test]
async fn failing_service_cancels_siblings() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = vec![ServiceEntry::new("waiter", waiter), ServiceEntry::new("failing", failing)];

    let err = supervisor::run(list, services(&dir), health.clone(), shutdown.clone(), Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Service { ref service, .. } if service == "failing"));
    assert!(shutdown.is_cancelled());
    assert_eq!(health.get("failing").await.unwrap().state, ServiceState::Failed);
    assert_eq!(health.get("waiter").await.unwrap().state, ServiceState::Stopped);
}

#[tokio::test]
async fn clean_exit_leaves_siblings_running() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = vec![ServiceEntry::new("quick", quick_ok), ServiceEntry::new("waiter", waiter)];

    let handle = tokio::spawn(supervisor::run(
        list,
        services(&dir),
        health.clone(),
        shutdown.clone(),
        Duration::from_secs(1),
    ));

    wait_for_state(&health, "quick", ServiceState::Stopped).await;
    wait_for_state(&health, "waiter", ServiceState::Running).await;
    assert!(!shutdown.is_cancelled());

    shutdown.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(health.get("waiter").await.unwrap().state, ServiceState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_service_is_aborted_after_grace() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let list = vec![ServiceEntry::new("stubborn", stubborn), ServiceEntry::new("waiter", waiter)];

    let err = supervisor::run(list, services(&dir), health.clone(), shutdown, Duration::from_millis(100))
        .await
        .unwrap_err();

    match err {
        AppError::ShutdownTimeout(names) => assert_eq!(names, vec!["stubborn".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    let stubborn = health.get("stubborn").await.unwrap();
    assert_eq!(stubborn.state, ServiceState::Failed);
    assert!(stubborn.message.contains("grace period"));
    assert_eq!(health.get("waiter").await.unwrap().state, ServiceState::Stopped);
}

#[tokio::test]
async fn panicking_service_is_reported_and_cancels() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = vec![ServiceEntry::new("waiter", waiter), ServiceEntry::new("panicky", panicking)];

    let err = supervisor::run(list, services(&dir), health.clone(), shutdown.clone(), Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ServicePanicked(_)));
    assert!(shutdown.is_cancelled());
    let panicky = health.get("panicky").await.unwrap();
    assert_eq!(panicky.state, ServiceState::Failed);
    assert_eq!(panicky.message, "panicked");
    assert!(err.to_string().contains("panicky"));
}

#[tokio::test(start_paused = true)]
async fn panicked_service_is_not_reported_as_aborted() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = vec![ServiceEntry::new("stubborn", stubborn), ServiceEntry::new("panicky", panicking)];

    let err = supervisor::run(list, services(&dir), health.clone(), shutdown.clone(), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ServicePanicked(_)));
    assert!(shutdown.is_cancelled());

    let panicky = health.get("panicky").await.unwrap();
    assert_eq!(panicky.state, ServiceState::Failed);
    assert_eq!(panicky.message, "panicked");

    let stubborn = health.get("stubborn").await.unwrap();
    assert_eq!(stubborn.state, ServiceState::Failed);
    assert_eq!(stubborn.message, "aborted after shutdown grace period");
}

#[tokio::test]
async fn panic_is_recorded_before_siblings_finish() {
    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = vec![ServiceEntry::new("stubborn", stubborn), ServiceEntry::new("panicky", panicking)];

    let handle = tokio::spawn(supervisor::run(
        list,
        services(&dir),
        health.clone(),
        shutdown.clone(),
        Duration::from_secs(30),
    ));

    // The stubborn sibling keeps the supervisor draining for the whole grace period.
    wait_for_state(&health, "panicky", ServiceState::Failed).await;
    assert_eq!(health.get("panicky").await.unwrap().message, "panicked");
    assert!(!handle.is_finished());

    handle.abort();
}

#[cfg(all(feature = "service-ela", feature = "service-eva", feature = "service-eda"))]
#[tokio::test]
async fn nts_profile_runs_and_stops_cleanly() {
    use edge_appliance::profile::Profile;
    use edge_appliance::supervisor::registry;

    let dir = TempDir::new().unwrap();
    let health = HealthRegistry::new();
    let shutdown = CancellationToken::new();
    let list = registry::services_for(Profile::Nts).unwrap();

    let handle = tokio::spawn(supervisor::run(
        list,
        services(&dir),
        health.clone(),
        shutdown.clone(),
        Duration::from_secs(1),
    ));

    for id in ["ela", "eva", "eda"] {
        wait_for_state(&health, id, ServiceState::Running).await;
    }
    assert!(health.all_healthy().await);
    assert!(dir.path().join("images").is_dir());

    shutdown.cancel();
    handle.await.unwrap().unwrap();

    let states: Vec<_> = health.snapshot().await.into_iter().map(|h| (h.id, h.state)).collect();
    assert_eq!(
        states,
        vec![
            ("eda".to_string(), ServiceState::Stopped),
            ("ela".to_string(), ServiceState::Stopped),
            ("eva".to_string(), ServiceState::Stopped),
        ]
    );
}
