mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::StubWorkspace;
use lakedeck::provider::models::{CreatedWarehouse, WarehouseHandle, WarehouseState};
use lakedeck::provisioner::{teardown, MemoryTracker, Provisioner, ResourceTracker, SessionId};
use lakedeck::state::sqlite::SqliteTracker;
use tempfile::TempDir;

fn handle(id: &str) -> WarehouseHandle {
    WarehouseHandle::created(
        &format!("{}-name", id),
        CreatedWarehouse {
            id: id.to_string(),
            state: WarehouseState::Starting,
        },
    )
}

fn create_sqlite_tracker() -> (TempDir, SqliteTracker) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("lakedeck.db");
    let tracker = SqliteTracker::open(path.to_str().unwrap()).unwrap();
    tracker.initialize().unwrap();
    (dir, tracker)
}

fn workspace(ids: &[&str]) -> StubWorkspace {
    ids.iter().fold(StubWorkspace::new(), |ws, id| {
        ws.with_warehouse(id, WarehouseState::Running)
    })
}

async fn assert_records_only_successes(tracker: &dyn ResourceTracker) {
    let session = SessionId::new("s1");
    let handles = vec![
        handle("a"),
        WarehouseHandle::failed("b", "rest error: boom"),
        handle("c"),
    ];
    let kept = tracker.record_all(&session, &handles).await.unwrap();
    assert_eq!(kept, 2);

    // re-recording the same id does not duplicate it
    tracker.record(&session, &handle("a")).await.unwrap();

    let tracked = tracker.tracked(&session).await.unwrap();
    let ids: Vec<&str> = tracked.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(tracked[0].connection_path, "/sql/1.0/warehouses/a");
    assert!(tracked.iter().all(|h| h.success));
}

#[tokio::test]
async fn test_memory_tracker_records_successes_in_order() {
    assert_records_only_successes(&MemoryTracker::new()).await;
}

#[tokio::test]
async fn test_sqlite_tracker_records_successes_in_order() {
    let (_dir, tracker) = create_sqlite_tracker();
    assert_records_only_successes(&tracker).await;
}

#[tokio::test]
async fn test_sqlite_tracker_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lakedeck.db");
    let path = path.to_str().unwrap();
    let session = SessionId::default();

    {
        let tracker = SqliteTracker::open(path).unwrap();
        tracker.initialize().unwrap();
        tracker.record(&session, &handle("x1")).await.unwrap();
        tracker.record(&session, &handle("x2")).await.unwrap();
    }

    let tracker = SqliteTracker::open(path).unwrap();
    tracker.initialize().unwrap();
    let tracked = tracker.tracked(&session).await.unwrap();
    assert_eq!(tracked.len(), 2);
    assert_eq!(tracked[1].state, WarehouseState::Starting);
    assert_eq!(tracker.sessions().unwrap(), vec![("default".to_string(), 2)]);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let tracker = MemoryTracker::new();
    let tab1 = SessionId::new("tab-1");
    let tab2 = SessionId::new("tab-2");
    tracker.record(&tab1, &handle("a")).await.unwrap();
    tracker.record(&tab2, &handle("b")).await.unwrap();

    let stub = Arc::new(workspace(&["a", "b"]));
    let p = Provisioner::new(stub.clone()).with_pacing(Duration::ZERO);
    let report = teardown(&p, &tracker, &tab1).await.unwrap();

    assert_eq!(report.deleted, vec!["a-name"]);
    assert!(tracker.tracked(&tab1).await.unwrap().is_empty());
    assert_eq!(tracker.tracked(&tab2).await.unwrap().len(), 1);
    assert_eq!(stub.calls(), vec!["stop:a", "delete:a"]);
}

async fn assert_teardown_forgets_everything(tracker: &dyn ResourceTracker) {
    let session = SessionId::new("workshop");
    for id in ["w1", "w2", "w3", "w4"] {
        tracker.record(&session, &handle(id)).await.unwrap();
    }

    let stub = Arc::new(workspace(&["w1", "w2", "w3", "w4"]).failing_deletes(&["w2", "w4"]));
    let p = Provisioner::new(stub.clone());
    let report = teardown(&p, tracker, &session).await.unwrap();

    assert_eq!(report.attempted, 4);
    assert_eq!(report.deleted, vec!["w1-name", "w3-name"]);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].contains("w2"));
    assert!(!report.all_deleted());
    assert!(tracker.tracked(&session).await.unwrap().is_empty());

    // every warehouse is stopped before its delete
    let calls = stub.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(&calls[..2], &["stop:w1", "delete:w1"]);
}

#[tokio::test]
async fn test_teardown_with_failures_leaves_nothing_tracked_in_memory() {
    assert_teardown_forgets_everything(&MemoryTracker::new()).await;
}

#[tokio::test]
async fn test_teardown_with_failures_leaves_nothing_tracked_in_sqlite() {
    let (_dir, tracker) = create_sqlite_tracker();
    assert_teardown_forgets_everything(&tracker).await;
}

#[tokio::test]
async fn test_teardown_of_empty_session() {
    let tracker = MemoryTracker::new();
    let p = Provisioner::new(Arc::new(StubWorkspace::new()));
    let report = teardown(&p, &tracker, &SessionId::default()).await.unwrap();
    assert_eq!(report.attempted, 0);
    assert!(report.all_deleted());
    assert_eq!(report.to_string(), "No tracked warehouses.");
}

#[tokio::test]
async fn test_teardown_report_text() {
    let tracker = MemoryTracker::new();
    let session = SessionId::default();
    tracker.record(&session, &handle("a")).await.unwrap();
    tracker.record(&session, &handle("b")).await.unwrap();

    let stub = Arc::new(workspace(&["a", "b"]).failing_deletes(&["b"]));
    let report = teardown(&Provisioner::new(stub), &tracker, &session)
        .await
        .unwrap();
    assert_eq!(
        report.to_string(),
        "Teardown complete! Warehouses: 1 of 2 deleted, 1 failed (b-name (b))."
    );
}

/// Tracker whose forget always fails, e.g. a locked database file.
struct StuckTracker(MemoryTracker);

#[async_trait]
impl ResourceTracker for StuckTracker {
    async fn record(&self, session: &SessionId, handle: &WarehouseHandle) -> anyhow::Result<()> {
        self.0.record(session, handle).await
    }

    async fn tracked(&self, session: &SessionId) -> anyhow::Result<Vec<WarehouseHandle>> {
        self.0.tracked(session).await
    }

    async fn forget(&self, _session: &SessionId, _ids: &[String]) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }
}

#[tokio::test]
async fn test_teardown_reports_deletions_when_forget_fails() {
    let tracker = StuckTracker(MemoryTracker::new());
    let session = SessionId::default();
    tracker.record(&session, &handle("a")).await.unwrap();
    tracker.record(&session, &handle("b")).await.unwrap();

    let stub = Arc::new(workspace(&["a", "b"]));
    let report = teardown(&Provisioner::new(stub.clone()), &tracker, &session)
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["a-name", "b-name"]);
    assert!(report.all_deleted());
    assert!(report.forget_error.unwrap().contains("database is locked"));
    assert_eq!(tracker.tracked(&session).await.unwrap().len(), 2);
    assert_eq!(stub.calls().len(), 4);
}
