//! # Aggregate Locks
//!
//! Per-aggregate async mutexes that serialize read-modify-write cycles.
//!
//! ## Lock Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale A: customer:c1  product:p1  product:p2  shift:u1                  │
//! │  sale B:              product:p1              shift:u2                  │
//! │                          ▲                                              │
//! │                          └── both take keys in sorted order, so B waits │
//! │                              for A's product:p1 and cannot hold a key   │
//! │                              A still needs                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Holders re-read every aggregate after locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

pub fn product_key(id: &str) -> String {
    format!("product:{}", id)
}

pub fn shift_key(user_id: &str) -> String {
    format!("shift:{}", user_id)
}

pub fn customer_key(id: &str) -> String {
    format!("customer:{}", id)
}

pub fn po_key(id: &str) -> String {
    format!("po:{}", id)
}

pub fn invoice_key(id: &str) -> String {
    format!("invoice:{}", id)
}

/// Guards uniqueness checks across the catalog, customers and suppliers.
pub const CATALOG_KEY: &str = "catalog";

/// Registry of named async mutexes. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AggregateLocks {
    registry: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held locks. Released on drop.
#[derive(Debug)]
pub struct LockSet {
    keys: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl AggregateLocks {
    pub fn new() -> Self {
        AggregateLocks::default()
    }

    /// Acquires every key, sorted and deduplicated.
    pub async fn lock_all<I, K>(&self, keys: I) -> LockSet
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let mutex = self.mutex_for(key);
            guards.push(mutex.lock_owned().await);
        }
        trace!(keys = ?keys, "Acquired aggregate locks");

        LockSet {
            keys,
            _guards: guards,
        }
    }

    fn mutex_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_keys_are_sorted_and_deduped() {
        let locks = AggregateLocks::new();
        let set = locks
            .lock_all(vec![product_key("b"), shift_key("u1"), product_key("a"), product_key("b")])
            .await;
        assert_eq!(set.keys(), ["product:a", "product:b", "shift:u1"]);
    }

    #[tokio::test]
    async fn test_same_key_waits_for_release() {
        let locks = AggregateLocks::new();
        let held = locks.lock_all([product_key("p1")]).await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            contender.lock_all([product_key("p1")]).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_keys_do_not_block() {
        let locks = AggregateLocks::new();
        let _a = locks.lock_all([product_key("p1")]).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock_all([product_key("p2")]),
        )
        .await;
        assert!(b.is_ok());
    }
}
