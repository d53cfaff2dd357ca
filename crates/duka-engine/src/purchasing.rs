//! # Purchase Receiving Engine
//!
//! Purchase orders, goods receiving and supplier payments.
//!
//! ## Purchase Order States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                                                     │
//! │  Draft ─send─► Sent ─receive─► PartiallyReceived ─receive─► Received│
//! │    │            │                  │   ▲    │                       │
//! │    │            │                  └───┘    │                       │
//! │    └────────────┴───────cancel──────────────┴──► Cancelled          │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Receiving a Batch
//! ```text
//! receive(po, lines)
//!    ├── duka_core::receiving::apply_receipt   (clamps over-receipt)
//!    └── ONE WriteBatch
//!          order (new status, quantities)
//!          product.stock += applied qty     (Inventory only)
//!          supplier invoice                 (only if something was received)
//!          audit RECEIVE_PO
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use duka_core::payables::{build_invoice, record_payment, supplier_invoice_number};
use duka_core::receiving::{self, ReceiptLine};
use duka_core::types::DEFAULT_CREDIT_DAYS;
use duka_core::{
    AuditAction, CoreError, Money, Product, PurchaseOrder, PurchaseOrderLine,
    PurchaseOrderStatus, Supplier, SupplierInvoice, SupplierPayment, SupplierPaymentMethod,
};
use duka_db::{StoreExt, WriteBatch};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::locks::{invoice_key, po_key, product_key};
use crate::session::Session;

/// One requested line of a new or amended order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Unit cost in cents. Defaults to the product's cost price, then 0.
    pub cost_cents: Option<i64>,
}

impl OrderLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderLineRequest {
            product_id: product_id.into(),
            quantity,
            cost_cents: None,
        }
    }

    pub fn at_cost(mut self, cost: Money) -> Self {
        self.cost_cents = Some(cost.cents());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub supplier_id: String,
    pub lines: Vec<OrderLineRequest>,
    /// Draft or Sent.
    pub status: PurchaseOrderStatus,
    pub expected_date: Option<DateTime<Utc>>,
}

/// What a receiving call changed.
#[derive(Debug, Clone)]
pub struct ReceiveResult {
    pub order: PurchaseOrder,
    /// Present only when the batch received a nonzero quantity.
    pub invoice: Option<SupplierInvoice>,
    pub received_units: i64,
}

#[derive(Clone)]
pub struct PurchaseReceivingEngine {
    ctx: EngineContext,
}

impl PurchaseReceivingEngine {
    pub fn new(ctx: EngineContext) -> Self {
        PurchaseReceivingEngine { ctx }
    }

    // =========================================================================
    // Order lifecycle
    // =========================================================================

    /// Creates an order as Draft or Sent.
    ///
    /// ## Errors
    /// - `SupplierNotFound` / `ProductNotFound`
    /// - `Required` when there are no lines, `MustBePositive` for quantities
    /// - `InvalidTransition` for any other initial status
    pub async fn create_order(
        &self,
        session: &Session,
        request: NewPurchaseOrder,
    ) -> EngineResult<PurchaseOrder> {
        let store = self.ctx.store();
        if store.get::<Supplier>(&request.supplier_id).await?.is_none() {
            return Err(CoreError::SupplierNotFound(request.supplier_id).into());
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            lines.push(self.order_line(line).await?);
        }

        let now = Utc::now();
        let order = receiving::new_order(
            self.ctx.ids().uuid(),
            self.ctx.ids().po_number(&self.ctx.settings().receipt.po_number_prefix),
            request.supplier_id,
            lines,
            request.status,
            request.expected_date,
            now,
        )?;

        let mut batch = WriteBatch::new();
        batch.put(&order)?;
        audit::record(
            &mut batch,
            session,
            AuditAction::AddPo,
            format!("Created {} ({}), total {}", order.po_number, order.status, order.total_cost()),
            now,
        )?;
        store.commit(batch).await?;

        info!(po = %order.po_number, lines = order.items.len(), "Purchase order created");
        Ok(order)
    }

    /// Draft → Sent.
    pub async fn send(&self, session: &Session, po_id: &str) -> EngineResult<PurchaseOrder> {
        let _locks = self.ctx.locks().lock_all([po_key(po_id)]).await;
        let order = self.load_order(po_id).await?;
        let sent = receiving::mark_sent(&order)?;
        self.save_order(session, &sent, AuditAction::SendPo, format!("Sent {}", sent.po_number))
            .await?;
        Ok(sent)
    }

    /// Adds or merges a line on a Draft or Sent order.
    pub async fn add_line(
        &self,
        session: &Session,
        po_id: &str,
        line: OrderLineRequest,
    ) -> EngineResult<PurchaseOrder> {
        let _locks = self.ctx.locks().lock_all([po_key(po_id)]).await;
        let order = self.load_order(po_id).await?;
        let new_line = self.order_line(&line).await?;
        let details = format!(
            "Added {} x {} to {}",
            new_line.quantity, new_line.product_name, order.po_number
        );
        let updated = receiving::add_line(&order, new_line)?;
        self.save_order(session, &updated, AuditAction::UpdatePo, details)
            .await?;
        Ok(updated)
    }

    /// Any non-terminal state → Cancelled.
    pub async fn cancel(&self, session: &Session, po_id: &str) -> EngineResult<PurchaseOrder> {
        let _locks = self.ctx.locks().lock_all([po_key(po_id)]).await;
        let order = self.load_order(po_id).await?;
        let cancelled = receiving::cancel(&order)?;
        self.save_order(
            session,
            &cancelled,
            AuditAction::CancelPo,
            format!("Cancelled {}", cancelled.po_number),
        )
        .await?;
        Ok(cancelled)
    }

    // =========================================================================
    // Receiving
    // =========================================================================

    /// Books a batch of received goods.
    ///
    /// Over-receipt is clamped to what is outstanding; lines for products
    /// not on the order are ignored. A batch that applies nothing writes
    /// nothing and returns the order unchanged.
    pub async fn receive(
        &self,
        session: &Session,
        po_id: &str,
        batch_lines: &[ReceiptLine],
    ) -> EngineResult<ReceiveResult> {
        let store = self.ctx.store();
        let settings = self.ctx.settings();

        // Lock set is derived from the stored order; retry if a line was
        // added between the read and the lock.
        let (_locks, order) = loop {
            let snapshot = self.load_order(po_id).await?;
            let mut keys = vec![po_key(po_id)];
            keys.extend(snapshot.items.iter().map(|l| product_key(&l.product_id)));
            let locks = self.ctx.locks().lock_all(keys).await;

            let order = self.load_order(po_id).await?;
            let covered = order
                .items
                .iter()
                .all(|l| snapshot.items.iter().any(|s| s.product_id == l.product_id));
            if covered {
                break (locks, order);
            }
        };

        let now = Utc::now();
        let outcome = receiving::apply_receipt(&order, batch_lines, &settings.tax, now)?;

        for product_id in &outcome.ignored_products {
            warn!(
                po = %order.po_number,
                product_id = %product_id,
                "Ignoring receipt line not on order"
            );
        }

        let Some(amounts) = outcome.invoice else {
            info!(po = %order.po_number, "Receiving batch applied nothing");
            return Ok(ReceiveResult {
                order: outcome.order,
                invoice: None,
                received_units: 0,
            });
        };

        let mut batch = WriteBatch::new();
        batch.put(&outcome.order)?;

        let mut touched: BTreeMap<String, Product> = BTreeMap::new();
        for delta in &outcome.stock_deltas {
            match store.get::<Product>(&delta.product_id).await? {
                Some(mut product) => {
                    if product.tracks_stock() {
                        product.stock += delta.quantity;
                        product.updated_at = now;
                    }
                    touched.insert(product.id.clone(), product);
                }
                None => warn!(
                    po = %order.po_number,
                    product_id = %delta.product_id,
                    "Received product no longer exists, stock not updated"
                ),
            }
        }

        let on_order = |id: &str| order.items.iter().any(|l| l.product_id == id);
        for line in batch_lines.iter().filter(|l| on_order(&l.product_id)) {
            if line.category.is_none() && line.ean.is_none() {
                continue;
            }
            let product = match touched.entry(line.product_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => match store.get::<Product>(&line.product_id).await? {
                    Some(product) => entry.insert(product),
                    None => continue,
                },
            };
            if line.relabel(product) {
                product.updated_at = now;
                debug!(
                    product_id = %product.id,
                    category = %product.category,
                    ean = ?product.ean,
                    "Product relabelled on receipt"
                );
            }
        }
        for product in touched.values() {
            batch.put(product)?;
        }

        let credit_days = store
            .get::<Supplier>(&order.supplier_id)
            .await?
            .map(|s| s.credit_days())
            .unwrap_or(DEFAULT_CREDIT_DAYS);
        let invoice = build_invoice(
            self.ctx.ids().uuid(),
            supplier_invoice_number(
                &settings.receipt.supplier_invoice_prefix,
                &order.po_number,
                self.ctx.ids().next_millis(),
            ),
            &outcome.order,
            amounts,
            credit_days,
            now,
        );
        batch.put(&invoice)?;

        audit::record(
            &mut batch,
            session,
            AuditAction::ReceivePo,
            format!(
                "Received {} units on {} ({}), invoice {}",
                outcome.received_units,
                order.po_number,
                outcome.order.status,
                invoice.invoice_number
            ),
            now,
        )?;
        store.commit(batch).await?;

        info!(
            po = %order.po_number,
            units = outcome.received_units,
            status = %outcome.order.status,
            invoice = %invoice.invoice_number,
            "Goods received"
        );
        Ok(ReceiveResult {
            order: outcome.order,
            invoice: Some(invoice),
            received_units: outcome.received_units,
        })
    }

    // =========================================================================
    // Payables
    // =========================================================================

    /// Records a payment against a supplier invoice.
    ///
    /// ## Errors
    /// - `InvoiceNotFound`
    /// - `MustBePositive` for non-positive amounts
    /// - `Overpayment` when the amount exceeds what is outstanding
    pub async fn record_supplier_payment(
        &self,
        session: &Session,
        invoice_id: &str,
        amount: Money,
        method: SupplierPaymentMethod,
        reference: Option<String>,
    ) -> EngineResult<(SupplierInvoice, SupplierPayment)> {
        let _locks = self.ctx.locks().lock_all([invoice_key(invoice_id)]).await;
        let store = self.ctx.store();

        let invoice: SupplierInvoice = store
            .get(invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

        let now = Utc::now();
        let (updated, payment) =
            record_payment(&invoice, self.ctx.ids().uuid(), amount, method, reference, now)?;

        let mut batch = WriteBatch::new();
        batch.put(&updated)?;
        batch.put(&payment)?;
        audit::record(
            &mut batch,
            session,
            AuditAction::RecordSupplierPayment,
            format!("Paid {} on {}", amount, updated.invoice_number),
            now,
        )?;
        store.commit(batch).await?;

        info!(
            invoice = %updated.invoice_number,
            status = ?updated.status,
            "Supplier payment recorded"
        );
        Ok((updated, payment))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn purchase_order(&self, po_id: &str) -> EngineResult<Option<PurchaseOrder>> {
        Ok(self.ctx.store().get(po_id).await?)
    }

    pub async fn purchase_orders(&self) -> EngineResult<Vec<PurchaseOrder>> {
        Ok(self.ctx.store().get_all().await?)
    }

    pub async fn invoices_for_order(&self, po_id: &str) -> EngineResult<Vec<SupplierInvoice>> {
        let invoices: Vec<SupplierInvoice> = self.ctx.store().get_all().await?;
        Ok(invoices
            .into_iter()
            .filter(|i| i.purchase_order_id == po_id)
            .collect())
    }

    pub async fn payments_for_invoice(
        &self,
        invoice_id: &str,
    ) -> EngineResult<Vec<SupplierPayment>> {
        let payments: Vec<SupplierPayment> = self.ctx.store().get_all().await?;
        Ok(payments
            .into_iter()
            .filter(|p| p.invoice_id == invoice_id)
            .collect())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load_order(&self, po_id: &str) -> EngineResult<PurchaseOrder> {
        self.ctx
            .store()
            .get(po_id)
            .await?
            .ok_or_else(|| CoreError::PurchaseOrderNotFound(po_id.to_string()).into())
    }

    async fn save_order(
        &self,
        session: &Session,
        order: &PurchaseOrder,
        action: AuditAction,
        details: String,
    ) -> EngineResult<()> {
        let mut batch = WriteBatch::new();
        batch.put(order)?;
        audit::record(&mut batch, session, action, details, Utc::now())?;
        self.ctx.store().commit(batch).await?;
        info!(po = %order.po_number, status = %order.status, "Purchase order updated");
        Ok(())
    }

    async fn order_line(&self, request: &OrderLineRequest) -> EngineResult<PurchaseOrderLine> {
        let product: Product = self
            .ctx
            .store()
            .get(&request.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        Ok(PurchaseOrderLine {
            product_id: product.id,
            product_name: product.name,
            quantity: request.quantity,
            quantity_received: 0,
            cost_cents: request
                .cost_cents
                .or(product.cost_price_cents)
                .unwrap_or(0),
            unit_of_measure: product.unit_of_measure,
        })
    }
}
