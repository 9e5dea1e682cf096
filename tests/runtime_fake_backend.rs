// tests/runtime_fake_backend.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use sitevisor::config::StaticSiteRegistry;
use sitevisor::engine::RestartPolicy;
use sitevisor::protocol::{Command, Event};
use sitevisor::status::Snapshot;
use sitevisor::types::{Action, WorkerStatus};
use sitevisor_test_utils::builders::SiteListBuilder;
use sitevisor_test_utils::fake_backend::BackendCall;
use sitevisor_test_utils::harness::Harness;
use sitevisor_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn snapshot(id: &str, status: WorkerStatus, is_muted: bool, is_visible: bool) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        status,
        is_muted,
        is_visible,
    }
}

#[tokio::test]
async fn autostarted_site_reports_starting_then_running() -> TestResult {
    init_tracing();

    let sites = SiteListBuilder::new()
        .with_autostart("youtube")
        .with_id("radio")
        .build();
    let autostart = sites.autostart_ids();
    let mut h = Harness::start(
        Arc::new(StaticSiteRegistry::new(sites)),
        RestartPolicy::default(),
    );

    // Boot: start every autostart site.
    for id in autostart {
        h.handle.send_control(id, Action::Start).await?;
    }

    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Starting, false, false)
    );
    assert_eq!(h.workers.spawn_count("youtube"), 1);
    assert_eq!(h.workers.spawn_count("radio"), 0);

    h.workers.emit("youtube", Event::Running).await;

    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Running, false, false)
    );
    // The worker is told to stay hidden.
    assert_eq!(h.workers.commands_for("youtube"), vec![Command::Hide]);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn mute_while_running_then_dropped_while_reloading() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::default(),
    );

    h.handle.send_control("youtube", Action::Start).await?;
    h.next_snapshot().await;
    h.workers.emit("youtube", Event::Running).await;
    h.next_snapshot().await;

    h.handle.send_control("youtube", Action::Mute).await?;
    h.workers.emit("youtube", Event::Muted).await;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Running, true, false)
    );

    // Reload puts the site back into STARTING; a mute sent now is dropped.
    h.handle.send_control("youtube", Action::Reload).await?;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Starting, true, false)
    );
    h.handle.send_control("youtube", Action::Mute).await?;
    h.workers.emit("youtube", Event::Running).await;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Running, true, false)
    );

    assert_eq!(
        h.workers.commands_for("youtube"),
        vec![
            Command::Hide,
            Command::Mute,
            Command::Reload,
            // Resync after the reload finished, not the dropped control.
            Command::Mute,
            Command::Hide,
        ]
    );

    h.shutdown().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn crash_reports_crashed_then_restarts_after_delay() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("radio").registry(),
        RestartPolicy::default(),
    );

    h.handle.send_control("radio", Action::Start).await?;
    h.next_snapshot().await;
    h.workers.emit("radio", Event::Running).await;
    h.next_snapshot().await;

    h.workers.exit("radio", Some(1)).await;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("radio", WorkerStatus::Crashed, false, false)
    );
    let crashed_at = tokio::time::Instant::now();

    assert_eq!(
        h.next_snapshot().await,
        snapshot("radio", WorkerStatus::Starting, false, false)
    );
    assert!(crashed_at.elapsed() >= Duration::from_millis(3000));
    assert_eq!(h.workers.spawn_count("radio"), 2);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_leaves_site_crashed() -> TestResult {
    init_tracing();

    let policy = RestartPolicy::new(2, Duration::from_millis(100));
    let mut h = Harness::start(SiteListBuilder::new().with_id("radio").registry(), policy);

    h.handle.send_control("radio", Action::Start).await?;
    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Starting);

    for _ in 0..2 {
        h.workers.exit("radio", Some(1)).await;
        assert_eq!(h.next_snapshot().await.status, WorkerStatus::Crashed);
        assert_eq!(h.next_snapshot().await.status, WorkerStatus::Starting);
    }

    h.workers.exit("radio", Some(1)).await;
    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Crashed);

    // Well past any restart delay: nothing else happens.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.try_snapshot().is_none());
    assert_eq!(h.workers.spawn_count("radio"), 3);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn stop_reports_stopped_and_never_restarts() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::new(5, Duration::from_millis(10)),
    );

    h.handle.send_control("youtube", Action::Start).await?;
    h.next_snapshot().await;

    // Honoured even before the worker reported running.
    h.handle.send_control("youtube", Action::Stop).await?;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("youtube", WorkerStatus::Stopped, false, false)
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.try_snapshot().is_none());
    assert_eq!(h.workers.spawn_count("youtube"), 1);
    assert_eq!(h.workers.kill_count("youtube"), 1);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_reported_without_retry() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::new(5, Duration::from_millis(10)),
    );
    h.workers.fail_spawns_for("youtube");

    h.handle.send_control("youtube", Action::Start).await?;
    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Starting);
    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Crashed);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.try_snapshot().is_none());
    assert_eq!(h.workers.spawn_count("youtube"), 1);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn repeated_start_spawns_once() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::default(),
    );

    for _ in 0..3 {
        h.handle.control("youtube", Action::Start);
    }
    h.next_snapshot().await;
    h.workers.emit("youtube", Event::Running).await;
    h.next_snapshot().await;

    assert_eq!(h.workers.spawn_count("youtube"), 1);

    h.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_kills_live_workers() -> TestResult {
    init_tracing();

    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").with_id("radio").registry(),
        RestartPolicy::default(),
    );
    h.handle.send_control("youtube", Action::Start).await?;
    h.handle.send_control("radio", Action::Start).await?;
    h.next_snapshot().await;
    h.next_snapshot().await;

    h.workers.emit("radio", Event::Running).await;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("radio", WorkerStatus::Running, false, false)
    );

    h.handle.shutdown().await?;
    let mut last = vec![h.next_snapshot().await, h.next_snapshot().await];
    last.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(
        last,
        vec![
            snapshot("radio", WorkerStatus::Stopped, false, false),
            snapshot("youtube", WorkerStatus::Stopped, false, false),
        ]
    );

    let kills: Vec<_> = h
        .workers
        .calls()
        .into_iter()
        .filter(|c| matches!(c, BackendCall::Kill { .. }))
        .collect();
    assert_eq!(kills.len(), 2);
    Ok(())
}

#[tokio::test]
async fn autostart_list_longer_than_event_channel_boots_every_site() -> TestResult {
    init_tracing();

    let ids: Vec<String> = (0..20).map(|i| format!("site{i:02}")).collect();
    let mut builder = SiteListBuilder::new();
    for id in &ids {
        builder = builder.with_autostart(id);
    }
    let sites = builder.build();

    let mut h = Harness::boot(
        Arc::new(StaticSiteRegistry::new(sites.clone())),
        RestartPolicy::default(),
        2,
        sites.autostart_ids(),
    );

    let mut started = Vec::new();
    for _ in 0..ids.len() {
        let s = h.next_snapshot().await;
        assert_eq!(s.status, WorkerStatus::Starting);
        started.push(s.id);
    }
    started.sort();
    assert_eq!(started, ids);

    // The loop is draining, so control requests still get through.
    h.handle.send_control("site00", Action::Stop).await?;
    assert_eq!(
        h.next_snapshot().await,
        snapshot("site00", WorkerStatus::Stopped, false, false)
    );

    h.shutdown().await?;
    Ok(())
}
