// tests/status_broadcaster.rs

use tokio::io::AsyncReadExt;
use sitevisor::status::{spawn_status_printer, Snapshot, StatusBroadcaster};
use sitevisor::types::WorkerStatus;
use sitevisor_test_utils::with_timeout;

fn snapshot(id: &str, status: WorkerStatus) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        status,
        is_muted: false,
        is_visible: true,
    }
}

#[test]
fn snapshot_serializes_with_lowercase_status() {
    let json = serde_json::to_value(snapshot("youtube", WorkerStatus::Crashed)).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "id": "youtube",
            "status": "crashed",
            "is_muted": false,
            "is_visible": true,
        })
    );
}

#[tokio::test]
async fn every_subscriber_sees_each_snapshot() {
    let status = StatusBroadcaster::new(8);
    let mut a = status.subscribe();
    let mut b = status.subscribe();
    assert_eq!(status.subscriber_count(), 2);

    status.publish(snapshot("radio", WorkerStatus::Starting));

    assert_eq!(a.recv().await.unwrap().status, WorkerStatus::Starting);
    assert_eq!(b.recv().await.unwrap().status, WorkerStatus::Starting);
}

#[tokio::test]
async fn publishing_without_subscribers_is_fine() {
    let status = StatusBroadcaster::new(0);
    status.publish(snapshot("radio", WorkerStatus::Running));

    let mut late = status.subscribe();
    status.publish(snapshot("radio", WorkerStatus::Stopped));
    assert_eq!(late.recv().await.unwrap().status, WorkerStatus::Stopped);
}

#[tokio::test]
async fn printer_writes_json_lines_until_closed() {
    let status = StatusBroadcaster::new(8);
    let (writer, mut reader) = tokio::io::duplex(4096);
    let printer = spawn_status_printer(status.subscribe(), writer);

    status.publish(snapshot("youtube", WorkerStatus::Starting));
    status.publish(snapshot("youtube", WorkerStatus::Running));
    drop(status);

    with_timeout(printer).await.unwrap();

    let mut out = String::new();
    reader.read_to_string(&mut out).await.unwrap();
    let lines: Vec<Snapshot> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            snapshot("youtube", WorkerStatus::Starting),
            snapshot("youtube", WorkerStatus::Running),
        ]
    );
}

#[tokio::test]
async fn lagging_printer_skips_to_latest() {
    let status = StatusBroadcaster::new(1);
    let (writer, mut reader) = tokio::io::duplex(4096);
    let printer = spawn_status_printer(status.subscribe(), writer);

    // The printer task has not run yet on this single-threaded runtime.
    status.publish(snapshot("radio", WorkerStatus::Starting));
    status.publish(snapshot("radio", WorkerStatus::Running));
    status.publish(snapshot("radio", WorkerStatus::Crashed));
    drop(status);

    with_timeout(printer).await.unwrap();

    let mut out = String::new();
    reader.read_to_string(&mut out).await.unwrap();
    let last: Snapshot = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(out.lines().count(), 1);
    assert_eq!(last.status, WorkerStatus::Crashed);
}
