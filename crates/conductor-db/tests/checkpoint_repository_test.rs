//! Integration tests for the checkpoint repository using in-memory
//! SurrealDB.

use conductor_core::repository::CheckpointRepository;
use conductor_db::repository::SurrealCheckpointRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    conductor_db::run_migrations(&db).await.unwrap();
    db
}

async fn record_count(db: &Surreal<Db>, owner_id: &str) -> u64 {
    let mut result = db
        .query(
            "SELECT count() AS total FROM kube_resource_version \
             WHERE owner_id = $owner_id GROUP ALL",
        )
        .bind(("owner_id", owner_id.to_string()))
        .await
        .unwrap();
    let rows: Vec<CountRow> = result.take(0).unwrap();
    rows.first().map(|r| r.total).unwrap_or(0)
}

#[tokio::test]
async fn get_or_create_starts_at_full_resync() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    let version = repo.get_or_create("sched-A").await.unwrap();
    assert_eq!(version, "0");
    assert_eq!(record_count(&db, "sched-A").await, 1);
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    let first = repo.get_or_create("sched-A").await.unwrap();
    let second = repo.get_or_create("sched-A").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(record_count(&db, "sched-A").await, 1);
}

#[tokio::test]
async fn checkpoint_advances_version() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db);

    repo.get_or_create("sched-A").await.unwrap();
    repo.checkpoint("sched-A", "42").await.unwrap();

    assert_eq!(repo.get_or_create("sched-A").await.unwrap(), "42");
}

#[tokio::test]
async fn empty_checkpoint_leaves_version_untouched() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db);

    repo.get_or_create("sched-A").await.unwrap();
    repo.checkpoint("sched-A", "42").await.unwrap();
    repo.checkpoint("sched-A", "").await.unwrap();

    assert_eq!(repo.get_or_create("sched-A").await.unwrap(), "42");
}

#[tokio::test]
async fn checkpoint_without_record_has_no_effect() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    repo.checkpoint("sched-B", "77").await.unwrap();

    assert_eq!(record_count(&db, "sched-B").await, 0);
    assert_eq!(repo.get_or_create("sched-B").await.unwrap(), "0");
}

#[tokio::test]
async fn reset_returns_sentinel_and_rewinds() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db);

    repo.get_or_create("sched-A").await.unwrap();
    repo.checkpoint("sched-A", "42").await.unwrap();

    assert_eq!(repo.reset("sched-A").await.unwrap(), "0");
    assert_eq!(repo.get_or_create("sched-A").await.unwrap(), "0");
}

#[tokio::test]
async fn reset_creates_missing_record() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    assert_eq!(repo.reset("sched-C").await.unwrap(), "0");
    assert_eq!(record_count(&db, "sched-C").await, 1);

    // Resetting twice is harmless.
    assert_eq!(repo.reset("sched-C").await.unwrap(), "0");
    assert_eq!(record_count(&db, "sched-C").await, 1);
}

#[tokio::test]
async fn owners_are_independent() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db);

    repo.get_or_create("sched-A").await.unwrap();
    repo.get_or_create("sched-B").await.unwrap();
    repo.checkpoint("sched-A", "100").await.unwrap();
    repo.reset("sched-B").await.unwrap();

    assert_eq!(repo.get_or_create("sched-A").await.unwrap(), "100");
    assert_eq!(repo.get_or_create("sched-B").await.unwrap(), "0");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_one_record() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.get_or_create("sched-race").await
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }

    assert!(versions.iter().all(|v| v == "0"));
    assert_eq!(record_count(&db, "sched-race").await, 1);
}

#[tokio::test]
async fn get_reads_without_creating() {
    let db = setup().await;
    let repo = SurrealCheckpointRepository::new(db.clone());

    assert!(repo.get("sched-A").await.unwrap().is_none());
    assert_eq!(record_count(&db, "sched-A").await, 0);

    repo.get_or_create("sched-A").await.unwrap();
    let record = repo.get("sched-A").await.unwrap().unwrap();
    assert_eq!(record.owner_id, "sched-A");
    assert!(record.is_full_resync());

    repo.checkpoint("sched-A", "42").await.unwrap();
    let record = repo.get("sched-A").await.unwrap().unwrap();
    assert_eq!(record.resource_version, "42");
    assert!(!record.is_full_resync());
}
