// tests/coordinator_lifecycle.rs

mod common;
use crate::common::builders::{single_worker, updated, watch_target};
use crate::common::{init_tracing, wait_until, with_timeout, FakeRestarter, FakeSessionFactory};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use workerwatch::coordinator::ReloadCoordinator;
use workerwatch::exec::WorkerRestarter;
use workerwatch::types::{ChangeKind, WatchConfig};
use workerwatch::watch::{SessionFactory, WATCHER_LATENCY};

type TestResult = Result<(), Box<dyn Error>>;

fn coordinator(factory: &FakeSessionFactory, restarter: &Arc<FakeRestarter>) -> ReloadCoordinator {
    ReloadCoordinator::new(
        Arc::new(factory.clone()) as Arc<dyn SessionFactory>,
        Arc::clone(restarter) as Arc<dyn WorkerRestarter>,
    )
}

/// One watch target on `/srv/app` for `*.txt`.
fn txt_target() -> Vec<WatchConfig> {
    vec![watch_target("/srv/app", "*.txt")]
}

#[tokio::test]
async fn empty_inputs_are_a_successful_no_op() -> TestResult {
    init_tracing();
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    coord.init_watch(&[], &single_worker()).await?;
    coord.init_watch(&txt_target(), &[]).await?;

    assert_eq!(factory.calls(), 0);
    assert!(!coord.is_watching());
    assert_eq!(coord.epoch(), 0, "a no-op init does not start a generation");

    // Nothing active, so stopping is a no-op as well.
    coord.stop_watch().await;
    assert_eq!(coord.epoch(), 0);
    Ok(())
}

#[tokio::test]
async fn init_builds_and_starts_one_session_per_target() -> TestResult {
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    let targets = vec![
        WatchConfig::new("/srv/app/src", "**/*.php", true),
        WatchConfig::new("/srv/app/config", "*.yaml", false),
    ];
    coord.init_watch(&targets, &single_worker()).await?;

    assert!(coord.is_watching());
    assert_eq!(coord.epoch(), 1);
    assert!(!coord.state().is_reloading());

    let sessions = factory.sessions();
    assert_eq!(sessions.len(), 2);
    for (session, target) in sessions.iter().zip(&targets) {
        assert_eq!(session.paths(), vec![target.directory.clone()]);
        let options = session.options();
        assert_eq!(options.recursive, target.recursive);
        assert!(!options.follow_symlinks);
        assert_eq!(options.latency, WATCHER_LATENCY);
        assert_eq!(options.latency, Duration::from_millis(150));
        assert_eq!(options.event_types, ChangeKind::ALL.to_vec());
        assert!(session.is_started());
    }

    coord.stop_watch().await;
    Ok(())
}

#[tokio::test]
async fn construction_failure_starts_nothing() {
    let factory = FakeSessionFactory::failing_at(1);
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    let targets = vec![
        watch_target("/srv/a", "*.txt"),
        watch_target("/srv/b", "*.txt"),
        watch_target("/srv/c", "*.txt"),
    ];
    let result = coord.init_watch(&targets, &single_worker()).await;

    assert!(result.is_err());
    assert_eq!(factory.calls(), 2, "construction stops at the first failure");
    assert!(!coord.is_watching());

    let sessions = factory.sessions();
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_started());
    assert!(sessions[0].is_destroyed());
}

#[tokio::test]
async fn start_failure_tears_everything_down() {
    let factory = FakeSessionFactory::new();
    factory.fail_start();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    let targets = vec![watch_target("/srv/a", "*.txt"), watch_target("/srv/b", "*.txt")];
    assert!(coord.init_watch(&targets, &single_worker()).await.is_err());

    assert!(!coord.is_watching());
    for session in factory.sessions() {
        assert!(session.is_destroyed());
    }
}

#[tokio::test]
async fn matching_change_restarts_workers_once() -> TestResult {
    init_tracing();
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);
    coord.init_watch(&txt_target(), &single_worker()).await?;

    let session = &factory.sessions()[0];
    assert!(session.emit(vec![updated("/srv/app/a.txt")]));

    wait_until(Duration::from_secs(2), "restart of W", || restarter.completed() == 1).await;
    assert_eq!(restarter.calls(), vec![vec!["W".to_string()]]);

    coord.stop_watch().await;
    Ok(())
}

#[tokio::test]
async fn non_matching_change_never_restarts() -> TestResult {
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);
    coord.init_watch(&txt_target(), &single_worker()).await?;

    let session = &factory.sessions()[0];
    for _ in 0..5 {
        assert!(session.emit(vec![updated("/srv/app/a.json")]));
        tokio::time::sleep(WATCHER_LATENCY).await;
    }
    assert_eq!(restarter.started(), 0);

    coord.stop_watch().await;
    Ok(())
}

#[tokio::test]
async fn burst_in_one_batch_restarts_once() -> TestResult {
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);
    coord.init_watch(&txt_target(), &single_worker()).await?;

    let session = &factory.sessions()[0];
    assert!(session.emit(vec![updated("/srv/app/a.txt"), updated("/srv/app/a.txt")]));

    wait_until(Duration::from_secs(2), "restart", || restarter.completed() == 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(restarter.started(), 1);

    coord.stop_watch().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn changes_during_a_reload_are_coalesced_across_sessions() -> TestResult {
    init_tracing();
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::with_delay(Duration::from_millis(300)));
    let mut coord = coordinator(&factory, &restarter);

    let targets = vec![watch_target("/srv/a", "*.txt"), watch_target("/srv/b", "*.txt")];
    coord.init_watch(&targets, &single_worker()).await?;

    let sessions = factory.sessions();
    for i in 0..10 {
        for (session, dir) in sessions.iter().zip(["/srv/a", "/srv/b"]) {
            assert!(session.emit(vec![updated(&format!("{dir}/f{i}.txt"))]));
        }
    }

    wait_until(Duration::from_secs(3), "restart", || restarter.completed() >= 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(restarter.started(), 1);
    assert_eq!(restarter.max_concurrent(), 1);

    coord.stop_watch().await;
    Ok(())
}

#[tokio::test]
async fn stop_watch_destroys_sessions_and_invalidates_the_generation() -> TestResult {
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);
    coord.init_watch(&txt_target(), &single_worker()).await?;
    assert_eq!(coord.epoch(), 1);

    coord.stop_watch().await;

    assert!(!coord.is_watching());
    assert_eq!(coord.epoch(), 2);
    assert!(coord.state().is_reloading(), "gate stays blocked after shutdown");
    let session = &factory.sessions()[0];
    assert!(session.is_stopped());
    assert!(session.is_destroyed());
    assert!(!session.emit(vec![updated("/srv/app/a.txt")]));

    // Second stop is a no-op.
    coord.stop_watch().await;
    assert_eq!(coord.epoch(), 2);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(restarter.started(), 0);
    Ok(())
}

#[tokio::test]
async fn stop_failures_do_not_prevent_teardown() -> TestResult {
    let factory = FakeSessionFactory::new();
    factory.fail_stop();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    let targets = vec![watch_target("/srv/a", "*.txt"), watch_target("/srv/b", "*.txt")];
    coord.init_watch(&targets, &single_worker()).await?;

    with_timeout(coord.stop_watch()).await;

    for session in factory.sessions() {
        assert!(session.is_stopped());
        assert!(session.is_destroyed());
    }
    Ok(())
}

#[tokio::test]
async fn stop_watch_waits_for_in_flight_restart() -> TestResult {
    init_tracing();
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::held());
    let mut coord = coordinator(&factory, &restarter);
    coord.init_watch(&txt_target(), &single_worker()).await?;

    let session = factory.sessions()[0].clone();
    assert!(session.emit(vec![updated("/srv/app/a.txt")]));
    wait_until(Duration::from_secs(2), "restart to begin", || restarter.started() == 1).await;

    let stopper = tokio::spawn(async move {
        coord.stop_watch().await;
        coord
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!stopper.is_finished(), "stop_watch returned while a restart was running");
    assert!(session.is_destroyed(), "sessions are torn down before draining");
    assert_eq!(restarter.completed(), 0);

    restarter.release();
    let coord = with_timeout(stopper).await?;

    assert_eq!(restarter.completed(), 1);
    assert_eq!(coord.state().drain().in_flight(), 0);
    assert!(!coord.is_watching());
    Ok(())
}

#[tokio::test]
async fn reinit_replaces_the_previous_generation() -> TestResult {
    let factory = FakeSessionFactory::new();
    let restarter = Arc::new(FakeRestarter::new());
    let mut coord = coordinator(&factory, &restarter);

    coord.init_watch(&txt_target(), &single_worker()).await?;
    let first = factory.sessions()[0].clone();

    coord
        .init_watch(&[watch_target("/srv/next", "*.txt")], &single_worker())
        .await?;

    // init (1), stop of the first generation (2), init (3).
    assert_eq!(coord.epoch(), 3);
    assert!(first.is_destroyed());
    assert!(!first.emit(vec![updated("/srv/app/a.txt")]));

    let second = factory.sessions()[1].clone();
    assert_eq!(second.paths(), vec![PathBuf::from("/srv/next")]);
    assert!(second.is_started());
    assert!(!coord.state().is_reloading(), "init resets the gate to idle");

    assert!(second.emit(vec![updated("/srv/next/b.txt")]));
    wait_until(Duration::from_secs(2), "restart", || restarter.completed() == 1).await;

    coord.stop_watch().await;
    Ok(())
}
