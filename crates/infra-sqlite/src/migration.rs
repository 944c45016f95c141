// Migration Runner

use mediqueue_core::error::{AppError, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Ordered schema steps: (version, description, SQL)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "local storage table",
    include_str!("../migrations/001_local_storage.sql"),
)];

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(format!("Migration failed: {}", e))
}

async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let has_table: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await
    .map_err(db_err)?;

    if has_table == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(db_err)?;
    Ok(version.unwrap_or(0))
}

/// Bring the schema up to the latest version
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;
    debug!(current_version = current, "Checking schema version");

    for (version, description, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        info!(version, description, "Applying migration");
        apply(pool, sql).await?;
    }
    Ok(())
}

/// Statements of a migration file
///
/// `--` comment lines are dropped before splitting on `;`, so a semicolon
/// inside a comment never starts a statement.
fn statements(sql: &str) -> Vec<String> {
    let code = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Execute one migration file atomically
async fn apply(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    for statement in statements(sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
    }

    tx.commit().await.map_err(db_err)
}
