// tests/console.rs

use tokio::sync::broadcast::error::RecvError;
use sitevisor::console::{parse_console_line, spawn_console, ConsoleInput};
use sitevisor::engine::RestartPolicy;
use sitevisor::types::{Action, WorkerStatus};
use sitevisor_test_utils::builders::SiteListBuilder;
use sitevisor_test_utils::harness::Harness;
use sitevisor_test_utils::{init_tracing, with_timeout};

fn control(id: &str, action: Action) -> ConsoleInput {
    ConsoleInput::Control {
        id: id.to_string(),
        action,
    }
}

#[test]
fn parses_action_then_site() {
    assert_eq!(parse_console_line("mute youtube"), Ok(control("youtube", Action::Mute)));
    assert_eq!(
        parse_console_line("  RELOAD   radio \n"),
        Ok(control("radio", Action::Reload))
    );
    assert_eq!(parse_console_line("quit"), Ok(ConsoleInput::Quit));
    assert_eq!(parse_console_line("exit"), Ok(ConsoleInput::Quit));
    assert_eq!(parse_console_line(""), Ok(ConsoleInput::Empty));
    assert_eq!(parse_console_line("# start youtube"), Ok(ConsoleInput::Empty));
}

#[test]
fn rejects_bad_lines() {
    let err = parse_console_line("launch youtube").unwrap_err();
    assert!(err.contains("invalid action"), "{err}");

    let err = parse_console_line("start").unwrap_err();
    assert!(err.contains("missing site id"), "{err}");

    let err = parse_console_line("start youtube now").unwrap_err();
    assert!(err.contains("trailing"), "{err}");
}

#[tokio::test]
async fn console_lines_reach_the_supervisor() {
    init_tracing();
    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::default(),
    );

    let input: &'static [u8] = b"start youtube\nnot a command\n\nstart youtube\n";
    with_timeout(spawn_console(input, h.handle.clone()))
        .await
        .unwrap();

    let first = h.next_snapshot().await;
    assert_eq!(first.id, "youtube");
    assert_eq!(first.status, WorkerStatus::Starting);
    assert_eq!(h.workers.spawn_count("youtube"), 1);

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn quit_stops_workers_and_the_loop() {
    init_tracing();
    let mut h = Harness::start(
        SiteListBuilder::new().with_id("youtube").registry(),
        RestartPolicy::default(),
    );

    let input: &'static [u8] = b"start youtube\nquit\nstop youtube\n";
    with_timeout(spawn_console(input, h.handle.clone()))
        .await
        .unwrap();

    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Starting);
    assert_eq!(h.next_snapshot().await.status, WorkerStatus::Stopped);
    // The loop is gone, so the broadcaster was dropped.
    let after = with_timeout(h.snapshots.recv()).await;
    assert!(matches!(after, Err(RecvError::Closed)), "{after:?}");
    assert_eq!(h.workers.kill_count("youtube"), 1);
}
