//! Restoring records written by older kiosk versions

use mediqueue_core::application::QueueService;
use mediqueue_core::domain::TicketStatus;
use mediqueue_core::port::announcer::SilentAnnouncer;
use mediqueue_core::port::time_provider::mocks::ManualTimeProvider;
use mediqueue_core::port::TimeProvider;
use mediqueue_infra_sqlite::{
    create_pool, run_migrations, SqliteStateStore, LEGACY_ASSUMED_WAIT_MS, STATE_KEY,
};
use serde_json::json;
use std::sync::Arc;

// 2024-03-10T09:00:00Z
const OPENING: i64 = 1_710_061_200_000;

async fn store() -> (Arc<SqliteStateStore>, sqlx::SqlitePool) {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let clock: Arc<dyn TimeProvider> = Arc::new(ManualTimeProvider::new(OPENING));
    (Arc::new(SqliteStateStore::new(pool.clone(), clock)), pool)
}

async fn load(store: &Arc<SqliteStateStore>) -> QueueService {
    QueueService::load(
        store.clone(),
        Arc::new(SilentAnnouncer),
        Arc::new(ManualTimeProvider::new(OPENING + 60 * 60_000)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_legacy_record_written_by_browser() {
    let (store, pool) = store().await;
    let legacy = json!({
        "queue": [
            { "number": "A001", "date": "3/10/2024", "time": "09:00", "status": "called",
              "calledTo": "Counter 1", "calledTime": "9:14:02 AM", "timestamp": OPENING },
            { "number": "A002", "date": "3/10/2024", "time": "09:02", "status": "waiting",
              "calledTo": null, "timestamp": OPENING + 120_000 }
        ],
        "currentTicketNumber": 2
    });

    // Write the blob directly, as the old front end did
    sqlx::query("INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, 0)")
        .bind(STATE_KEY)
        .bind(legacy.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let mut service = load(&store).await;
    let first = &service.tickets()[0];
    assert_eq!(first.status(), TicketStatus::Called);
    assert_eq!(first.called_at(), Some(OPENING + LEGACY_ASSUMED_WAIT_MS));

    // Next save writes the full form, timestamps included
    service.call_next("Counter 2").await.unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&store.export_raw().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        raw["queue"][0]["calledTimestamp"],
        json!(OPENING + LEGACY_ASSUMED_WAIT_MS)
    );
    assert_eq!(raw["queue"][1]["status"], "called");
    assert_eq!(raw["queue"][1]["calledTo"], "Counter 2");
}

#[tokio::test]
async fn test_import_replaces_state_and_raises_counter() {
    let (store, _pool) = store().await;
    let mut service = load(&store).await;
    service.create_ticket().await.unwrap();

    // Counter lags behind the tickets it holds
    let exported = json!({
        "queue": [
            { "number": "A004", "status": "waiting", "timestamp": OPENING },
            { "number": "A007", "status": "waiting", "timestamp": OPENING + 1 }
        ],
        "currentTicketNumber": 5
    });
    let snapshot = store.import_raw(&exported.to_string()).await.unwrap();
    assert_eq!(snapshot.tickets.len(), 2);

    let mut service = load(&store).await;
    let issued = service.create_ticket().await.unwrap();
    assert_eq!(issued.ticket.number.as_str(), "A008");
    assert_eq!(issued.position, 3);
}

#[tokio::test]
async fn test_export_round_trip_through_import() {
    let (source, _pool) = store().await;
    let mut service = load(&source).await;
    service.create_ticket().await.unwrap();
    service.create_ticket().await.unwrap();
    service.call_by_number("A002", "Counter 1").await.unwrap();
    let raw = source.export_raw().await.unwrap().unwrap();

    let (target, _pool) = store().await;
    target.import_raw(&raw).await.unwrap();
    let restored = load(&target).await;
    assert_eq!(restored.store().snapshot(), service.store().snapshot());
}

#[tokio::test]
async fn test_duplicate_numbers_never_reach_the_queue() {
    let (store, pool) = store().await;
    let mut service = load(&store).await;
    service.create_ticket().await.unwrap();

    let duplicated = json!({
        "queue": [
            { "number": "A001", "status": "waiting", "timestamp": OPENING },
            { "number": "A001", "status": "called", "calledTo": "Counter 1",
              "timestamp": OPENING, "calledTimestamp": OPENING + 60_000 }
        ],
        "currentTicketNumber": 1
    });
    assert!(store.import_raw(&duplicated.to_string()).await.is_err());
    assert_eq!(load(&store).await.tickets().len(), 1);

    // Written behind the adapter's back, load still refuses it
    sqlx::query("UPDATE local_storage SET value = ? WHERE key = ?")
        .bind(duplicated.to_string())
        .bind(STATE_KEY)
        .execute(&pool)
        .await
        .unwrap();
    let result = QueueService::load(
        store.clone(),
        Arc::new(SilentAnnouncer),
        Arc::new(ManualTimeProvider::new(OPENING)),
    )
    .await;
    assert!(result.is_err());
}
