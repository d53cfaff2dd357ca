//! # Record Repository
//!
//! JSON documents keyed by `(collection, id)`. Upserts keep the original
//! row, so listing a collection returns records in first-insert order.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::collection::Collection;
use crate::error::DbResult;

/// Repository for the `records` table.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// Gets one payload by id.
    pub async fn get(&self, collection: Collection, id: &str) -> DbResult<Option<String>> {
        debug!(collection = %collection, id = %id, "Fetching record");

        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM records WHERE collection = ?1 AND id = ?2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(payload)
    }

    /// Lists all payloads of a collection in insertion order.
    pub async fn list(&self, collection: Collection) -> DbResult<Vec<String>> {
        let payloads: Vec<String> = sqlx::query_scalar(
            "SELECT payload FROM records WHERE collection = ?1 ORDER BY rowid ASC",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!(collection = %collection, count = payloads.len(), "Listed records");
        Ok(payloads)
    }

    pub async fn count(&self, collection: Collection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped writes
// =============================================================================

pub(crate) async fn upsert(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    payload: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO records (collection, id, payload, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (collection, id) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(payload)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn remove(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> DbResult<()> {
    sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
        .bind(collection.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn clear(conn: &mut SqliteConnection) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM records").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
