//! Purchase order, goods receiving and supplier payment scenarios.

mod common;

use chrono::Duration;

use common::*;
use duka_core::receiving::ReceiptLine;
use duka_core::{
    AuditAction, AuditLog, CoreError, InvoiceStatus, Money, PricingType, Product, PurchaseOrder,
    PurchaseOrderStatus, Settings, SupplierInvoice, SupplierPaymentMethod,
};
use duka_db::{Database, StoreExt};
use duka_engine::{NewPurchaseOrder, OrderLineRequest, PurchaseReceivingEngine};

/// p1 costs KSh 58, p2 costs KSh 116; supplier on Net 45.
async fn setup_with(settings: Settings) -> (PurchaseReceivingEngine, Database) {
    let (ctx, db) = context_with(settings).await;
    db.put(&product("p1", 11_600, 10)).await.unwrap();
    db.put(&product("p2", 23_200, 0)).await.unwrap();
    db.put(&service("install", 50_000)).await.unwrap();
    db.put(&supplier("sup1", "Net 45")).await.unwrap();
    (PurchaseReceivingEngine::new(ctx), db)
}

async fn setup() -> (PurchaseReceivingEngine, Database) {
    setup_with(Settings::default()).await
}

fn order_request(status: PurchaseOrderStatus) -> NewPurchaseOrder {
    NewPurchaseOrder {
        supplier_id: "sup1".to_string(),
        lines: vec![
            OrderLineRequest::new("p1", 10),
            OrderLineRequest::new("p2", 5),
        ],
        status,
        expected_date: None,
    }
}

async fn sent_order(engine: &PurchaseReceivingEngine) -> PurchaseOrder {
    engine
        .create_order(&cashier(), order_request(PurchaseOrderStatus::Sent))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_order_prices_lines_from_catalog() {
    let (engine, db) = setup().await;
    let mut request = order_request(PurchaseOrderStatus::Draft);
    request.lines[1] = OrderLineRequest::new("p2", 5).at_cost(Money::from_cents(10_000));

    let order = engine.create_order(&cashier(), request).await.unwrap();

    assert!(order.po_number.starts_with("PO-"));
    assert_eq!(order.po_number.len(), "PO-".len() + 6);
    assert_eq!(order.status, PurchaseOrderStatus::Draft);
    assert_eq!(order.items[0].cost_cents, 5_800);
    assert_eq!(order.items[1].cost_cents, 10_000);
    assert_eq!(order.total_cost_cents, 58_000 + 50_000);

    let stored = engine.purchase_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored, order);
    let logs: Vec<AuditLog> = db.get_all().await.unwrap();
    assert_eq!(logs[0].action, AuditAction::AddPo);
}

#[tokio::test]
async fn test_create_order_rejects_unknown_references() {
    let (engine, _db) = setup().await;

    let mut request = order_request(PurchaseOrderStatus::Sent);
    request.supplier_id = "nobody".to_string();
    let err = engine.create_order(&cashier(), request).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::SupplierNotFound(_))));

    let mut request = order_request(PurchaseOrderStatus::Sent);
    request.lines.push(OrderLineRequest::new("ghost", 1));
    let err = engine.create_order(&cashier(), request).await.unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::ProductNotFound(_))));

    assert!(engine.purchase_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_draft_cannot_be_received_until_sent() {
    let (engine, db) = setup().await;
    let draft = engine
        .create_order(&cashier(), order_request(PurchaseOrderStatus::Draft))
        .await
        .unwrap();

    let err = engine
        .receive(&cashier(), &draft.id, &[ReceiptLine::new("p1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
    assert_eq!(stock_of(&db, "p1").await, 10);

    engine.send(&cashier(), &draft.id).await.unwrap();
    let result = engine
        .receive(&cashier(), &draft.id, &[ReceiptLine::new("p1", 1)])
        .await
        .unwrap();
    assert_eq!(result.received_units, 1);
}

#[tokio::test]
async fn test_partial_then_full_receipt() {
    let (engine, db) = setup().await;
    let order = sent_order(&engine).await;

    let first = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p1", 4)])
        .await
        .unwrap();
    assert_eq!(first.order.status, PurchaseOrderStatus::PartiallyReceived);
    assert_eq!(first.received_units, 4);
    assert_eq!(stock_of(&db, "p1").await, 14);

    // Inclusive costs: KSh 232 is KSh 200 + 16% VAT.
    let invoice = first.invoice.unwrap();
    assert_eq!(invoice.total_cents, 23_200);
    assert_eq!(invoice.subtotal_cents, 20_000);
    assert_eq!(invoice.tax_cents, 3_200);
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.due_date - invoice.invoice_date, Duration::days(45));
    assert!(invoice.invoice_number.starts_with(&format!("INV-{}-", order.po_number)));

    // Over-receipt on p1 is clamped to the 6 outstanding.
    let second = engine
        .receive(
            &cashier(),
            &order.id,
            &[ReceiptLine::new("p1", 100), ReceiptLine::new("p2", 5)],
        )
        .await
        .unwrap();
    assert_eq!(second.order.status, PurchaseOrderStatus::Received);
    assert_eq!(second.received_units, 11);
    assert!(second.order.received_date.is_some());
    assert_eq!(stock_of(&db, "p1").await, 20);
    assert_eq!(stock_of(&db, "p2").await, 5);
    assert_eq!(second.invoice.unwrap().total_cents, 6 * 5_800 + 5 * 11_600);

    assert_eq!(engine.invoices_for_order(&order.id).await.unwrap().len(), 2);

    let err = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_batch_of_unknown_lines_writes_nothing() {
    let (engine, db) = setup().await;
    let order = sent_order(&engine).await;

    let result = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("not-on-po", 3)])
        .await
        .unwrap();

    assert_eq!(result.received_units, 0);
    assert!(result.invoice.is_none());
    assert_eq!(result.order, order);
    assert!(engine.invoices_for_order(&order.id).await.unwrap().is_empty());
    assert_eq!(stock_of(&db, "p1").await, 10);
}

#[tokio::test]
async fn test_exclusive_invoice_totals_the_received_cost() {
    let mut settings = Settings::default();
    settings.tax.pricing_type = PricingType::Exclusive;
    assert!(settings.tax.vat_enabled);
    let (engine, _db) = setup_with(settings).await;
    let order = sent_order(&engine).await;

    engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p1", 4)])
        .await
        .unwrap();
    // 4 of 10 already in; 7 more clamps to the 6 outstanding.
    let result = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p1", 7)])
        .await
        .unwrap();
    assert_eq!(result.received_units, 6);

    let invoice = result.invoice.unwrap();
    assert_eq!(invoice.total_cents, 5_800 * 6);
    assert_eq!(invoice.subtotal_cents, 34_800);
    assert_eq!(invoice.tax_cents, 5_568);

    let stored = engine.invoices_for_order(&order.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].total_cents, 5_800 * 6);
}

#[tokio::test]
async fn test_receipt_relabels_products() {
    let (engine, db) = setup().await;
    let order = sent_order(&engine).await;

    engine
        .receive(
            &cashier(),
            &order.id,
            &[
                ReceiptLine::new("p1", 2)
                    .with_category("Dairy")
                    .with_ean("6161100000017"),
                ReceiptLine::new("p2", 1).with_ean(""),
                ReceiptLine::new("ghost", 1).with_category("Nowhere"),
            ],
        )
        .await
        .unwrap();

    let p1: Product = db.get("p1").await.unwrap().unwrap();
    assert_eq!(p1.category, "Dairy");
    assert_eq!(p1.ean.as_deref(), Some("6161100000017"));
    assert_eq!(p1.stock, 12);
    let p2: Product = db.get("p2").await.unwrap().unwrap();
    assert_eq!(p2.category, "Groceries");
    assert_eq!(p2.ean, None);
    assert_eq!(p2.stock, 1);
}

#[tokio::test]
async fn test_bad_barcode_on_receipt_writes_nothing() {
    let (engine, db) = setup().await;
    let order = sent_order(&engine).await;

    let err = engine
        .receive(
            &cashier(),
            &order.id,
            &[ReceiptLine::new("p1", 2).with_ean("12AB")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
    assert_eq!(stock_of(&db, "p1").await, 10);
    assert!(engine.invoices_for_order(&order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_lines_are_received_without_stock() {
    let (engine, db) = setup().await;
    let order = engine
        .create_order(
            &cashier(),
            NewPurchaseOrder {
                supplier_id: "sup1".to_string(),
                lines: vec![OrderLineRequest::new("install", 2).at_cost(Money::from_cents(20_000))],
                status: PurchaseOrderStatus::Sent,
                expected_date: None,
            },
        )
        .await
        .unwrap();

    let result = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("install", 2)])
        .await
        .unwrap();
    assert_eq!(result.order.status, PurchaseOrderStatus::Received);
    assert_eq!(stock_of(&db, "install").await, 0);
    assert_eq!(result.invoice.unwrap().total_cents, 40_000);
}

#[tokio::test]
async fn test_add_line_and_cancel() {
    let (engine, _db) = setup().await;
    let order = sent_order(&engine).await;

    let updated = engine
        .add_line(&cashier(), &order.id, OrderLineRequest::new("p1", 5))
        .await
        .unwrap();
    assert_eq!(updated.items.len(), 2);
    assert_eq!(updated.items[0].quantity, 15);
    assert_eq!(updated.total_cost_cents, order.total_cost_cents + 5 * 5_800);

    let cancelled = engine.cancel(&cashier(), &order.id).await.unwrap();
    assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);

    let err = engine
        .add_line(&cashier(), &order.id, OrderLineRequest::new("p2", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::InvalidTransition { .. })
    ));
    assert!(engine.cancel(&cashier(), &order.id).await.is_err());
}

#[tokio::test]
async fn test_supplier_payments_settle_invoice() {
    let (engine, db) = setup().await;
    let order = sent_order(&engine).await;
    let invoice = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p1", 4)])
        .await
        .unwrap()
        .invoice
        .unwrap();

    let (partial, _) = engine
        .record_supplier_payment(
            &cashier(),
            &invoice.id,
            Money::from_cents(10_000),
            SupplierPaymentMethod::MPesa,
            Some("SGH7Y2K9LM".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(partial.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(partial.outstanding().cents(), 13_200);

    let err = engine
        .record_supplier_payment(
            &cashier(),
            &invoice.id,
            Money::from_cents(20_000),
            SupplierPaymentMethod::BankTransfer,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_core(),
        Some(CoreError::Overpayment {
            amount: 20_000,
            outstanding: 13_200
        })
    ));

    let (paid, _) = engine
        .record_supplier_payment(
            &cashier(),
            &invoice.id,
            Money::from_cents(13_200),
            SupplierPaymentMethod::Cash,
            None,
        )
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);

    let stored: SupplierInvoice = db.get(&invoice.id).await.unwrap().unwrap();
    assert_eq!(stored.paid_cents, 23_200);
    assert_eq!(engine.payments_for_invoice(&invoice.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_payment_against_missing_invoice_or_zero_amount() {
    let (engine, _db) = setup().await;

    let err = engine
        .record_supplier_payment(
            &cashier(),
            "missing",
            Money::from_cents(100),
            SupplierPaymentMethod::Cash,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err.as_core(), Some(CoreError::InvoiceNotFound(_))));

    let order = sent_order(&engine).await;
    let invoice = engine
        .receive(&cashier(), &order.id, &[ReceiptLine::new("p2", 1)])
        .await
        .unwrap()
        .invoice
        .unwrap();
    let err = engine
        .record_supplier_payment(
            &cashier(),
            &invoice.id,
            Money::zero(),
            SupplierPaymentMethod::Cash,
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_rejection());
}
