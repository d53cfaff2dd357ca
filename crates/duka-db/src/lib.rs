//! # duka-db: Persistence Store for Duka POS
//!
//! Local SQLite storage behind the [`Store`] contract.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  duka-engine (sale, shift, purchasing)     duka-sync (queue drain)      │
//! │       │                                          │                      │
//! │       ▼                                          ▼                      │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   Store / StoreExt     get, get_all, put, delete, commit        │   │
//! │  │   WriteBatch           many writes, one transaction             │   │
//! │  │   Database (pool.rs)   SqlitePool + migrations                  │   │
//! │  │   backup               export / validated restore / wipe        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: records (collection, id) → JSON, order_queue id → JSON         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{Database, DbConfig, StoreExt, WriteBatch};
//!
//! let db = Database::new(DbConfig::new("duka.db")).await?;
//!
//! let mut batch = WriteBatch::new();
//! batch.put(&product)?;
//! batch.put(&sale)?;
//! db.commit(batch).await?;
//!
//! let products: Vec<Product> = db.get_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod collection;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use backup::{export_backup, restore_backup, wipe, Backup};
pub use collection::{Collection, Record};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::queue::{OrderQueueRepository, QueueEntry};
pub use repository::records::RecordRepository;
pub use store::{Store, StoreExt, WriteBatch, WriteOp};
