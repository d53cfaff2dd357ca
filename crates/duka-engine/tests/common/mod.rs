//! Shared fixtures for the engine scenario tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use duka_core::{
    Customer, PricingType, Product, ProductType, Sale, Settings, Supplier, WALK_IN_CUSTOMER_ID,
};
use duka_db::{Collection, Database, DbConfig, DbError, DbResult, Store, StoreExt, WriteBatch};
use duka_engine::{EngineContext, Session};

pub async fn database() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Context over a fresh database that already holds the walk-in customer.
pub async fn context() -> (EngineContext, Database) {
    context_with(Settings::default()).await
}

pub async fn context_with(settings: Settings) -> (EngineContext, Database) {
    let db = database().await;
    db.put(&Customer::walk_in(Utc::now())).await.unwrap();
    let ctx = EngineContext::new(Arc::new(db.clone()), settings);
    (ctx, db)
}

pub fn cashier() -> Session {
    Session::new("user-amina", "Amina")
}

/// VAT-inclusive inventory product. KSh 116.00 is KSh 100.00 + 16% VAT.
pub fn product(id: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: format!("SKU-{}", id.to_uppercase()),
        ean: None,
        name: format!("Product {}", id),
        category: "Groceries".to_string(),
        price_cents,
        pricing_type: PricingType::Inclusive,
        product_type: ProductType::Inventory,
        stock,
        cost_price_cents: Some(price_cents / 2),
        unit_of_measure: "pcs".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn service(id: &str, price_cents: i64) -> Product {
    Product {
        product_type: ProductType::Service,
        stock: 0,
        cost_price_cents: None,
        ..product(id, price_cents, 0)
    }
}

pub fn customer(id: &str, points: i64) -> Customer {
    Customer {
        id: id.to_string(),
        name: "Wanjiku Kamau".to_string(),
        phone: "0712345678".to_string(),
        email: None,
        date_added: Utc::now(),
        loyalty_points: points,
    }
}

pub fn supplier(id: &str, credit_terms: &str) -> Supplier {
    Supplier {
        id: id.to_string(),
        name: "Bidco Distributors".to_string(),
        contact: "0720111222".to_string(),
        email: None,
        credit_terms: credit_terms.to_string(),
    }
}

pub async fn stock_of(db: &Database, id: &str) -> i64 {
    db.get::<Product>(id).await.unwrap().unwrap().stock
}

pub async fn points_of(db: &Database, id: &str) -> i64 {
    db.get::<Customer>(id).await.unwrap().unwrap().loyalty_points
}

pub async fn walk_in(db: &Database) -> Customer {
    db.get::<Customer>(WALK_IN_CUSTOMER_ID)
        .await
        .unwrap()
        .unwrap()
}

// =============================================================================
// Failing store double
// =============================================================================

/// Delegates to a real database but refuses commits while `failing` is set.
pub struct FlakyStore {
    inner: Database,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        FlakyStore {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_commits(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn fetch(&self, collection: Collection, id: &str) -> DbResult<Option<String>> {
        self.inner.fetch(collection, id).await
    }

    async fn fetch_all(&self, collection: Collection) -> DbResult<Vec<String>> {
        self.inner.fetch_all(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed("disk I/O error".to_string()));
        }
        self.inner.commit(batch).await
    }

    async fn record_queue_failure(&self, id: &str, error: &str) -> DbResult<()> {
        self.inner.record_queue_failure(id, error).await
    }
}

// =============================================================================
// Settling store double
// =============================================================================

/// Delegates to a real database. Once armed, the first read that touches
/// `sales` or the order queue is followed by a sync settle: every queued
/// sale moves into `sales` in one commit, the way the coordinator does it.
pub struct SettlingStore {
    inner: Database,
    armed: AtomicBool,
}

impl SettlingStore {
    pub fn new(inner: Database) -> Self {
        SettlingStore {
            inner,
            armed: AtomicBool::new(false),
        }
    }

    pub fn settle_after_next_read(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn after_read(&self, collection: Collection) -> DbResult<()> {
        if !matches!(collection, Collection::Sales | Collection::OrderQueue) {
            return Ok(());
        }
        if !self.armed.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let queued: Vec<Sale> = self.inner.get_all_in(Collection::OrderQueue).await?;
        let mut batch = WriteBatch::new();
        for sale in queued {
            batch.delete_in(Collection::OrderQueue, &sale.id);
            batch.put(&Sale {
                synced: true,
                ..sale
            })?;
        }
        self.inner.commit(batch).await
    }
}

#[async_trait]
impl Store for SettlingStore {
    async fn fetch(&self, collection: Collection, id: &str) -> DbResult<Option<String>> {
        let found = self.inner.fetch(collection, id).await?;
        self.after_read(collection).await?;
        Ok(found)
    }

    async fn fetch_all(&self, collection: Collection) -> DbResult<Vec<String>> {
        let found = self.inner.fetch_all(collection).await?;
        self.after_read(collection).await?;
        Ok(found)
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        self.inner.commit(batch).await
    }

    async fn record_queue_failure(&self, id: &str, error: &str) -> DbResult<()> {
        self.inner.record_queue_failure(id, error).await
    }
}

/// Context over a [`SettlingStore`] holding the walk-in customer.
pub async fn settling_context() -> (EngineContext, Arc<SettlingStore>, Database) {
    let db = database().await;
    db.put(&Customer::walk_in(Utc::now())).await.unwrap();
    let store = Arc::new(SettlingStore::new(db.clone()));
    let ctx = EngineContext::new(store.clone(), Settings::default());
    (ctx, store, db)
}
