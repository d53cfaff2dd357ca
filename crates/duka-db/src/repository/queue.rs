//! # Order Queue Repository
//!
//! Durable queue of sales completed while offline.
//!
//! ## Queue Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offline sale ──► enqueue (attempts = 0)                                │
//! │                      │                                                  │
//! │        push ok ◄─────┴─────► push failed                                │
//! │           │                      │                                      │
//! │           ▼                      ▼                                      │
//! │  remove + upsert into      mark_failed (attempts + 1, last_error)       │
//! │  `sales` (one commit)      stays queued for the next drain              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// A queued payload with its sync bookkeeping.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct QueueEntry {
    pub id: String,
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub attempted_at: Option<DateTime<Utc>>,
}

/// Repository for the `order_queue` table.
#[derive(Debug, Clone)]
pub struct OrderQueueRepository {
    pool: SqlitePool,
}

impl OrderQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderQueueRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<QueueEntry>> {
        let entry = sqlx::query_as::<_, QueueEntry>(
            r#"
            SELECT id, payload, attempts, last_error, queued_at, attempted_at
            FROM order_queue
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// All queued entries, oldest first.
    pub async fn list(&self) -> DbResult<Vec<QueueEntry>> {
        let entries = sqlx::query_as::<_, QueueEntry>(
            r#"
            SELECT id, payload, attempts, last_error, queued_at, attempted_at
            FROM order_queue
            ORDER BY queued_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Records a failed push. The entry stays queued.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();
        debug!(id = %id, error = %error, "Recording queue failure");

        sqlx::query(
            r#"
            UPDATE order_queue SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped writes
// =============================================================================

/// Inserts or replaces the payload; attempt bookkeeping is preserved.
pub(crate) async fn enqueue(
    conn: &mut SqliteConnection,
    id: &str,
    payload: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_queue (id, payload, attempts, queued_at)
        VALUES (?1, ?2, 0, ?3)
        ON CONFLICT (id) DO UPDATE SET payload = excluded.payload
        "#,
    )
    .bind(id)
    .bind(payload)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn remove(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM order_queue WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn clear(conn: &mut SqliteConnection) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM order_queue")
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
