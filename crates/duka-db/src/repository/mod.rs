//! # Repository Module
//!
//! Table-level access for the store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Store (trait, store.rs)                                                │
//! │     │  fetch / fetch_all / commit                                       │
//! │     ▼                                                                   │
//! │  RecordRepository      records table     (collection, id) → JSON        │
//! │  OrderQueueRepository  order_queue table id → JSON + attempt bookkeeping│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository holds a cloned pool for reads. Writes inside a commit
//! go through the `pub(crate)` functions that take a live connection, so
//! a whole batch shares one transaction.

pub mod queue;
pub mod records;
