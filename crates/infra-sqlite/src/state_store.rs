// SQLite StateStore Implementation

use crate::record::StoredState;
use async_trait::async_trait;
use mediqueue_core::domain::QueueSnapshot;
use mediqueue_core::error::{AppError, Result};
use mediqueue_core::port::{StateStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

/// Storage key for the queue record
pub const STATE_KEY: &str = "mediQueueData";

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLITE_BUSY - database is locked
            Some(code) if code.as_ref() == "5" => {
                AppError::Database(format!("Database locked (SQLITE_BUSY): {}", db_err.message()))
            }
            // SQLITE_FULL - database or disk is full
            Some(code) if code.as_ref() == "13" => {
                AppError::Database(format!("Database full: {}", db_err.message()))
            }
            Some(code) => AppError::Database(format!(
                "Database error [{}]: {}",
                code.as_ref(),
                db_err.message()
            )),
            None => AppError::Database(format!("Database error: {}", db_err.message())),
        },
        _ => AppError::Database(err.to_string()),
    }
}

/// Queue snapshot kept as one JSON document under [`STATE_KEY`]
pub struct SqliteStateStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteStateStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Raw stored JSON, if any (for export)
    pub async fn export_raw(&self) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?")
            .bind(STATE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    /// Replace the stored state with an exported JSON document
    ///
    /// The document is parsed and validated first so a malformed or
    /// inconsistent import never overwrites good state. Returns the snapshot
    /// it will load as.
    pub async fn import_raw(&self, json: &str) -> Result<QueueSnapshot> {
        let record: StoredState = serde_json::from_str(json)?;
        let snapshot = record.into_snapshot();
        snapshot
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.write(json).await?;
        info!(
            tickets = snapshot.tickets.len(),
            current_ticket_number = snapshot.current_ticket_number,
            "Imported queue state"
        );
        Ok(snapshot)
    }

    async fn write(&self, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(STATE_KEY)
        .bind(value)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let record = StoredState::from_snapshot(snapshot, &chrono::Local);
        let json = serde_json::to_string(&record)?;
        self.write(&json).await?;

        debug!(
            tickets = snapshot.tickets.len(),
            current_ticket_number = snapshot.current_ticket_number,
            "Queue state saved"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<QueueSnapshot>> {
        let Some(json) = self.export_raw().await? else {
            return Ok(None);
        };

        let record: StoredState = serde_json::from_str(&json)?;
        Ok(Some(record.into_snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use mediqueue_core::domain::{CounterId, Ticket, TicketNumber};
    use mediqueue_core::port::time_provider::SystemTimeProvider;

    async fn store() -> SqliteStateStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteStateStore::new(pool, Arc::new(SystemTimeProvider))
    }

    fn snapshot(count: u32) -> QueueSnapshot {
        let tickets = (1..=count)
            .map(|seq| Ticket::new(TicketNumber::from_sequence(seq), seq as i64 * 1000))
            .collect();
        QueueSnapshot {
            tickets,
            current_ticket_number: count,
        }
    }

    #[tokio::test]
    async fn test_load_empty() {
        let store = store().await;
        assert!(store.load().await.unwrap().is_none());
        assert!(store.export_raw().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = store().await;
        store.save(&snapshot(3)).await.unwrap();

        let mut second = snapshot(1);
        second.tickets[0].call(CounterId::new("Counter 1").unwrap(), 5000);
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, second);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM local_storage")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_without_overwrite() {
        let store = store().await;
        store.save(&snapshot(2)).await.unwrap();

        let err = store.import_raw("{ not json").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
        assert_eq!(store.load().await.unwrap().unwrap(), snapshot(2));
    }

    #[tokio::test]
    async fn test_import_rejects_duplicate_numbers() {
        let store = store().await;
        store.save(&snapshot(1)).await.unwrap();

        let duplicated = r#"{"queue":[{"number":"A001","status":"waiting","timestamp":1000},{"number":"A001","status":"waiting","timestamp":2000}],"currentTicketNumber":1}"#;
        let err = store.import_raw(duplicated).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.load().await.unwrap().unwrap(), snapshot(1));
    }

    #[tokio::test]
    async fn test_import_rejects_exhausted_counter() {
        let store = store().await;
        let err = store
            .import_raw(r#"{"queue":[],"currentTicketNumber":4294967295}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.export_raw().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_legacy_blob() {
        let store = store().await;
        let legacy = r#"{"queue":[{"number":"A001","date":"3/10/2024","time":"09:00","status":"called","calledTo":"Counter 1","calledTime":"9:14:02 AM","timestamp":1000000},{"number":"A002","date":"3/10/2024","time":"09:01","status":"waiting","calledTo":null,"timestamp":1060000}],"currentTicketNumber":2}"#;

        let imported = store.import_raw(legacy).await.unwrap();
        assert_eq!(imported.tickets.len(), 2);
        assert_eq!(imported.tickets[0].called_at(), Some(1_000_000 + 900_000));

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, imported);
    }
}
