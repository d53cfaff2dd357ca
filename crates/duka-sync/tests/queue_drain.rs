//! Order queue drain scenarios against an in-memory store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Notify};
use tokio::time::{sleep, timeout};

use duka_core::{Money, Payment, PaymentMethod, Sale};
use duka_db::{Collection, Database, DbConfig, Store, StoreExt, WriteBatch};
use duka_sync::{RemoteEndpoint, SyncConfig, SyncCoordinator, SyncError, SyncResult};

// =============================================================================
// Fixtures
// =============================================================================

/// Records every push. Rejects ids in `reject`; never answers for `hang_on`.
#[derive(Default)]
struct MockEndpoint {
    pushed: Mutex<Vec<String>>,
    reject: HashSet<String>,
    hang_on: Option<String>,
    entered: Notify,
}

impl MockEndpoint {
    fn rejecting(id: &str) -> Self {
        MockEndpoint {
            reject: HashSet::from([id.to_string()]),
            ..Default::default()
        }
    }

    fn hanging_on(id: &str) -> Self {
        MockEndpoint {
            hang_on: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn pushed(&self) -> Vec<String> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteEndpoint for MockEndpoint {
    async fn push_sale(&self, sale: &Sale) -> SyncResult<()> {
        self.pushed.lock().unwrap().push(sale.id.clone());

        if self.hang_on.as_deref() == Some(sale.id.as_str()) {
            self.entered.notify_one();
            std::future::pending::<()>().await;
        }
        if self.reject.contains(&sale.id) {
            return Err(SyncError::Rejected {
                code: "BAD_TOTAL".to_string(),
                message: "total mismatch".to_string(),
            });
        }
        Ok(())
    }
}

async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn sale(id: &str) -> Sale {
    Sale {
        id: id.to_string(),
        items: vec![],
        subtotal_cents: 10_000,
        discount_cents: 0,
        tax_cents: 1_600,
        total_cents: 11_600,
        payments: vec![Payment::new(PaymentMethod::Cash, Money::from_cents(11_600))],
        change_cents: 0,
        customer_id: "cust001".to_string(),
        cashier_id: "user-amina".to_string(),
        cashier_name: "Amina".to_string(),
        shift_id: "shift-1".to_string(),
        points_earned: 0,
        points_used: 0,
        points_value_cents: 0,
        points_balance_after: 0,
        quotation_id: None,
        date: Utc::now(),
        synced: false,
    }
}

/// Queues the sales in order, the way an offline checkout does.
async fn enqueue(db: &Database, ids: &[&str]) {
    let mut batch = WriteBatch::new();
    for id in ids {
        batch.put_in(Collection::OrderQueue, &sale(id)).unwrap();
    }
    db.commit(batch).await.unwrap();
}

fn coordinator(db: &Database, endpoint: Arc<MockEndpoint>) -> SyncCoordinator {
    SyncCoordinator::new(Arc::new(db.clone()), endpoint, &SyncConfig::default())
}

// =============================================================================
// Drain
// =============================================================================

#[tokio::test]
async fn test_drain_moves_sales_into_primary_collection() {
    let db = database().await;
    enqueue(&db, &["INV-1", "INV-2", "INV-3"]).await;
    let endpoint = Arc::new(MockEndpoint::default());
    let (_tx, mut online) = watch::channel(true);

    let report = coordinator(&db, endpoint.clone())
        .drain(&mut online)
        .await
        .unwrap();

    assert_eq!(report.success_count, 3);
    assert_eq!(report.failed_count, 0);
    assert!(!report.interrupted);
    assert_eq!(report.synced, vec!["INV-1", "INV-2", "INV-3"]);
    // Oldest first
    assert_eq!(endpoint.pushed(), vec!["INV-1", "INV-2", "INV-3"]);

    assert_eq!(db.queued_count().await.unwrap(), 0);
    let sales: Vec<Sale> = db.get_all().await.unwrap();
    assert_eq!(sales.len(), 3);
    assert!(sales.iter().all(|s| s.synced));
}

#[tokio::test]
async fn test_failed_push_stays_queued_with_attempt_recorded() {
    let db = database().await;
    enqueue(&db, &["INV-1", "INV-2", "INV-3"]).await;
    let endpoint = Arc::new(MockEndpoint::rejecting("INV-2"));
    let (_tx, mut online) = watch::channel(true);

    let sync = coordinator(&db, endpoint.clone());
    let report = sync.drain(&mut online).await.unwrap();

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.synced, vec!["INV-1", "INV-3"]);

    let entry = db.order_queue().get("INV-2").await.unwrap().unwrap();
    assert_eq!(entry.attempts, 1);
    assert!(entry.last_error.unwrap().contains("BAD_TOTAL"));
    assert!(db.get::<Sale>("INV-2").await.unwrap().is_none());

    // Next drain tries again and bumps the counter.
    let report = sync.drain(&mut online).await.unwrap();
    assert_eq!(report.failed_count, 1);
    let entry = db.order_queue().get("INV-2").await.unwrap().unwrap();
    assert_eq!(entry.attempts, 2);
}

#[tokio::test]
async fn test_replayed_sale_yields_one_primary_record() {
    let db = database().await;
    let endpoint = Arc::new(MockEndpoint::default());
    let (_tx, mut online) = watch::channel(true);
    let sync = coordinator(&db, endpoint.clone());

    enqueue(&db, &["INV-1"]).await;
    sync.drain(&mut online).await.unwrap();
    enqueue(&db, &["INV-1"]).await;
    sync.drain(&mut online).await.unwrap();

    assert_eq!(endpoint.pushed(), vec!["INV-1", "INV-1"]);
    let sales: Vec<Sale> = db.get_all().await.unwrap();
    assert_eq!(sales.len(), 1);
    assert!(sales[0].synced);
    assert_eq!(db.queued_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_offline_drain_touches_nothing() {
    let db = database().await;
    enqueue(&db, &["INV-1"]).await;
    let endpoint = Arc::new(MockEndpoint::default());
    let (_tx, mut online) = watch::channel(false);

    let report = coordinator(&db, endpoint.clone())
        .drain(&mut online)
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.success_count, 0);
    assert!(endpoint.pushed().is_empty());
    assert_eq!(db.queued_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_connectivity_loss_mid_push_abandons_the_walk() {
    let db = database().await;
    enqueue(&db, &["INV-1", "INV-2", "INV-3"]).await;
    let endpoint = Arc::new(MockEndpoint::hanging_on("INV-2"));
    let (tx, mut online) = watch::channel(true);
    let sync = coordinator(&db, endpoint.clone());

    let (report, _) = tokio::join!(sync.drain(&mut online), async {
        endpoint.entered.notified().await;
        tx.send(false).unwrap();
    });
    let report = report.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.synced, vec!["INV-1"]);
    // INV-3 was never attempted
    assert_eq!(endpoint.pushed(), vec!["INV-1", "INV-2"]);

    // The abandoned sale is still queued, untouched.
    let entry = db.order_queue().get("INV-2").await.unwrap().unwrap();
    assert_eq!(entry.attempts, 0);
    assert!(db.get::<Sale>("INV-2").await.unwrap().is_none());
    assert_eq!(db.queued_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_queue_is_idle() {
    let db = database().await;
    let (_tx, mut online) = watch::channel(true);

    let report = coordinator(&db, Arc::new(MockEndpoint::default()))
        .drain(&mut online)
        .await
        .unwrap();

    assert!(report.is_idle());
}

// =============================================================================
// Background loop
// =============================================================================

#[tokio::test]
async fn test_background_loop_drains_when_back_online() {
    let db = database().await;
    enqueue(&db, &["INV-1", "INV-2"]).await;
    let endpoint = Arc::new(MockEndpoint::default());
    let (tx, online) = watch::channel(false);

    let handle = coordinator(&db, endpoint.clone()).spawn(online);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(db.queued_count().await.unwrap(), 2);

    tx.send(true).unwrap();
    timeout(Duration::from_secs(5), async {
        while db.queued_count().await.unwrap() > 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    handle.shutdown().await;
    assert_eq!(endpoint.pushed(), vec!["INV-1", "INV-2"]);
}
