//! # Store Contract
//!
//! The persistence seam the engines are written against.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine                                                                 │
//! │    ├── store.get::<Product>(id)         reads, outside the batch        │
//! │    ├── batch.put(&shift)?                                               │
//! │    ├── batch.put(&product)?                                             │
//! │    ├── batch.put_in(OrderQueue, &sale)?                                 │
//! │    └── store.commit(batch)             ONE transaction: all or nothing  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never see a half-applied batch. Callers serialize their own
//! read-modify-write cycles (see duka-engine's aggregate locks).

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::collection::{Collection, Record};
use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{queue, records};

// =============================================================================
// Write Batch
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        collection: Collection,
        id: String,
        payload: String,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

/// An ordered set of writes committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    /// Upserts a record into its own collection.
    pub fn put<R: Record>(&mut self, record: &R) -> DbResult<()> {
        self.put_in(R::COLLECTION, record)
    }

    /// Upserts a record into an explicit collection (e.g. a sale into the
    /// order queue).
    pub fn put_in<R: Record>(&mut self, collection: Collection, record: &R) -> DbResult<()> {
        let payload = serde_json::to_string(record)?;
        self.ops.push(WriteOp::Put {
            collection,
            id: record.id().to_string(),
            payload,
        });
        Ok(())
    }

    pub fn delete<R: Record>(&mut self, id: &str) {
        self.delete_in(R::COLLECTION, id);
    }

    pub fn delete_in(&mut self, collection: Collection, id: &str) {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.to_string(),
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Key-value persistence per collection plus the durable order queue.
#[async_trait]
pub trait Store: Send + Sync {
    /// Raw JSON payload of one record.
    async fn fetch(&self, collection: Collection, id: &str) -> DbResult<Option<String>>;

    /// Raw JSON payloads of a collection, oldest first.
    async fn fetch_all(&self, collection: Collection) -> DbResult<Vec<String>>;

    /// Applies every operation of the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> DbResult<()>;

    /// Bumps the attempt counter of a queued record after a failed push.
    async fn record_queue_failure(&self, id: &str, error: &str) -> DbResult<()>;
}

/// Typed helpers over [`Store`].
#[async_trait]
pub trait StoreExt: Store {
    async fn get<R: Record>(&self, id: &str) -> DbResult<Option<R>> {
        self.get_in(R::COLLECTION, id).await
    }

    async fn get_in<R: Record>(&self, collection: Collection, id: &str) -> DbResult<Option<R>> {
        match self.fetch(collection, id).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn get_all<R: Record>(&self) -> DbResult<Vec<R>> {
        self.get_all_in(R::COLLECTION).await
    }

    async fn get_all_in<R: Record>(&self, collection: Collection) -> DbResult<Vec<R>> {
        self.fetch_all(collection)
            .await?
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Into::into))
            .collect()
    }

    /// Single-record commit.
    async fn put<R: Record>(&self, record: &R) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.put(record)?;
        self.commit(batch).await
    }

    async fn delete<R: Record>(&self, id: &str) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete::<R>(id);
        self.commit(batch).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

// =============================================================================
// SQLite implementation
// =============================================================================

#[async_trait]
impl Store for Database {
    async fn fetch(&self, collection: Collection, id: &str) -> DbResult<Option<String>> {
        match collection {
            Collection::OrderQueue => Ok(self.order_queue().get(id).await?.map(|e| e.payload)),
            _ => self.records().get(collection, id).await,
        }
    }

    async fn fetch_all(&self, collection: Collection) -> DbResult<Vec<String>> {
        match collection {
            Collection::OrderQueue => Ok(self
                .order_queue()
                .list()
                .await?
                .into_iter()
                .map(|e| e.payload)
                .collect()),
            _ => self.records().list(collection).await,
        }
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        for op in batch.ops() {
            match op {
                WriteOp::Put {
                    collection: Collection::OrderQueue,
                    id,
                    payload,
                } => queue::enqueue(&mut *tx, id, payload, now).await?,
                WriteOp::Put {
                    collection,
                    id,
                    payload,
                } => records::upsert(&mut *tx, *collection, id, payload, now).await?,
                WriteOp::Delete {
                    collection: Collection::OrderQueue,
                    id,
                } => queue::remove(&mut *tx, id).await?,
                WriteOp::Delete { collection, id } => {
                    records::remove(&mut *tx, *collection, id).await?
                }
            }
        }

        tx.commit().await?;
        debug!(ops = batch.len(), "Committed write batch");
        Ok(())
    }

    async fn record_queue_failure(&self, id: &str, error: &str) -> DbResult<()> {
        self.order_queue().mark_failed(id, error).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
