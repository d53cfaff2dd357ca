//! # Purchase Order Transitions
//!
//! Pure state transitions for purchase orders. Every function takes the
//! current order by reference and returns a NEW order value; callers
//! persist the result together with the side-effect commands in one batch.
//!
//! ## Receiving a Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order (Sent | PartiallyReceived)  +  batch [(product, qty)]            │
//! │        │                                                                │
//! │        ▼  per batch line                                                │
//! │  applied = min(max(qty, 0), ordered − received)   ← over-receipt capped │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ReceivingOutcome                                                       │
//! │   ├── order          new value, status re-derived                       │
//! │   ├── stock_deltas   +applied per product                               │
//! │   └── invoice        Σ cost × applied, when anything was applied        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::breakdown;
use crate::settings::TaxSettings;
use crate::types::{Product, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
use crate::validation::validate_ean;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// One line of a goods-received note.
///
/// `category` and `ean` carry label corrections made while checking the
/// delivery; `None` leaves the product as it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `Some("")` clears the barcode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
}

impl ReceiptLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        ReceiptLine {
            product_id: product_id.into(),
            quantity,
            category: None,
            ean: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_ean(mut self, ean: impl Into<String>) -> Self {
        self.ean = Some(ean.into());
        self
    }

    /// Copies the note's category and barcode onto the product.
    /// Returns whether the product changed.
    pub fn relabel(&self, product: &mut Product) -> bool {
        let mut changed = false;
        if let Some(category) = self.category.as_deref().map(str::trim) {
            if !category.is_empty() && product.category != category {
                product.category = category.to_string();
                changed = true;
            }
        }
        if let Some(ean) = self.ean.as_deref().map(str::trim) {
            let ean = (!ean.is_empty()).then(|| ean.to_string());
            if product.ean != ean {
                product.ean = ean;
                changed = true;
            }
        }
        changed
    }
}

/// Stock to add for one product. Callers skip Service products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub quantity: i64,
}

/// Monetary figures of a supplier invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceAmounts {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone)]
pub struct ReceivingOutcome {
    pub order: PurchaseOrder,
    pub stock_deltas: Vec<StockDelta>,
    /// Present only when the batch applied a nonzero quantity.
    pub invoice: Option<InvoiceAmounts>,
    /// Σ applied quantity.
    pub received_units: i64,
    /// Batch lines naming products that are not on the order.
    pub ignored_products: Vec<String>,
}

// =============================================================================
// Transitions
// =============================================================================

fn invalid(order: &PurchaseOrder, operation: &str) -> CoreError {
    CoreError::InvalidTransition {
        po_number: order.po_number.clone(),
        status: order.status.to_string(),
        operation: operation.to_string(),
    }
}

/// Builds a new order from its lines.
///
/// `status` must be Draft or Sent.
pub fn new_order(
    id: impl Into<String>,
    po_number: impl Into<String>,
    supplier_id: impl Into<String>,
    lines: Vec<PurchaseOrderLine>,
    status: PurchaseOrderStatus,
    expected_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CoreResult<PurchaseOrder> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    for line in &lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("quantity of {}", line.product_name),
            }
            .into());
        }
        if line.cost_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: format!("cost of {}", line.product_name),
            }
            .into());
        }
    }

    let po_number = po_number.into();
    if !status.accepts_new_lines() {
        return Err(CoreError::InvalidTransition {
            po_number,
            status: status.to_string(),
            operation: "create".to_string(),
        });
    }

    let mut order = PurchaseOrder {
        id: id.into(),
        po_number,
        supplier_id: supplier_id.into(),
        items: lines
            .into_iter()
            .map(|line| PurchaseOrderLine {
                quantity_received: 0,
                ..line
            })
            .collect(),
        status,
        created_date: now,
        expected_date,
        received_date: None,
        total_cost_cents: 0,
    };
    order.recompute_total();
    Ok(order)
}

/// Draft → Sent.
pub fn mark_sent(order: &PurchaseOrder) -> CoreResult<PurchaseOrder> {
    if order.status != PurchaseOrderStatus::Draft {
        return Err(invalid(order, "send"));
    }
    Ok(PurchaseOrder {
        status: PurchaseOrderStatus::Sent,
        ..order.clone()
    })
}

/// Any non-terminal state → Cancelled.
pub fn cancel(order: &PurchaseOrder) -> CoreResult<PurchaseOrder> {
    if order.status.is_terminal() {
        return Err(invalid(order, "cancel"));
    }
    Ok(PurchaseOrder {
        status: PurchaseOrderStatus::Cancelled,
        ..order.clone()
    })
}

/// Adds a line, merging into an existing line for the same product.
pub fn add_line(order: &PurchaseOrder, line: PurchaseOrderLine) -> CoreResult<PurchaseOrder> {
    if !order.status.accepts_new_lines() {
        return Err(invalid(order, "add items"));
    }
    if line.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let mut updated = order.clone();
    match updated
        .items
        .iter_mut()
        .find(|existing| existing.product_id == line.product_id)
    {
        Some(existing) => existing.quantity += line.quantity,
        None => updated.items.push(PurchaseOrderLine {
            quantity_received: 0,
            ..line
        }),
    }
    updated.recompute_total();
    Ok(updated)
}

/// Books a batch of received goods against an order.
///
/// ## Errors
/// `InvalidTransition` unless the order is Sent or PartiallyReceived.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use duka_core::receiving::{apply_receipt, new_order, ReceiptLine};
/// use duka_core::settings::TaxSettings;
/// use duka_core::types::{PurchaseOrderLine, PurchaseOrderStatus};
///
/// let line = PurchaseOrderLine {
///     product_id: "p1".into(),
///     product_name: "Rice 5kg".into(),
///     quantity: 10,
///     quantity_received: 0,
///     cost_cents: 50_000,
///     unit_of_measure: "bag".into(),
/// };
/// let order = new_order(
///     "po1", "PO-000001", "s1", vec![line], PurchaseOrderStatus::Sent, None, Utc::now(),
/// )
/// .unwrap();
/// let batch = [ReceiptLine::new("p1", 4)];
/// let out = apply_receipt(&order, &batch, &TaxSettings::default(), Utc::now()).unwrap();
/// assert_eq!(out.order.status, PurchaseOrderStatus::PartiallyReceived);
/// assert_eq!(out.received_units, 4);
/// ```
pub fn apply_receipt(
    order: &PurchaseOrder,
    batch: &[ReceiptLine],
    tax: &TaxSettings,
    now: DateTime<Utc>,
) -> CoreResult<ReceivingOutcome> {
    if !order.status.accepts_receipt() {
        return Err(invalid(order, "receive"));
    }
    for receipt in batch {
        validate_ean(receipt.ean.as_deref())?;
    }

    let mut updated = order.clone();
    let mut stock_deltas: Vec<StockDelta> = Vec::new();
    let mut ignored_products = Vec::new();
    let mut received_cost = Money::zero();
    let mut received_units = 0;

    for receipt in batch {
        let Some(line) = updated
            .items
            .iter_mut()
            .find(|line| line.product_id == receipt.product_id)
        else {
            ignored_products.push(receipt.product_id.clone());
            continue;
        };

        let applied = receipt.quantity.max(0).min(line.outstanding());
        if applied == 0 {
            continue;
        }
        line.quantity_received += applied;
        received_units += applied;
        received_cost += line.cost().multiply_quantity(applied);

        match stock_deltas
            .iter_mut()
            .find(|delta| delta.product_id == receipt.product_id)
        {
            Some(delta) => delta.quantity += applied,
            None => stock_deltas.push(StockDelta {
                product_id: receipt.product_id.clone(),
                quantity: applied,
            }),
        }
    }

    if received_units == 0 {
        return Ok(ReceivingOutcome {
            order: order.clone(),
            stock_deltas: Vec::new(),
            invoice: None,
            received_units: 0,
            ignored_products,
        });
    }

    updated.status = if updated.items.iter().all(PurchaseOrderLine::is_complete) {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::PartiallyReceived
    };
    updated.received_date = Some(now);

    Ok(ReceivingOutcome {
        order: updated,
        stock_deltas,
        invoice: Some(invoice_amounts(received_cost, tax)),
        received_units,
        ignored_products,
    })
}

/// Breaks a received-goods cost into invoice figures.
///
/// The total is always the received cost. Only the subtotal/tax split
/// follows the pricing type: inclusive costs are split into base and VAT,
/// exclusive costs keep the cost as subtotal and report VAT on top of it.
pub fn invoice_amounts(cost: Money, tax: &TaxSettings) -> InvoiceAmounts {
    let split = breakdown(cost, tax.pricing_type, tax.effective_rate());
    InvoiceAmounts {
        subtotal_cents: split.base_cents,
        tax_cents: split.vat_cents,
        total_cents: cost.cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricingType;

    fn line(product_id: &str, quantity: i64, received: i64, cost_cents: i64) -> PurchaseOrderLine {
        PurchaseOrderLine {
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            quantity,
            quantity_received: received,
            cost_cents,
            unit_of_measure: "pcs".to_string(),
        }
    }

    fn order(status: PurchaseOrderStatus, lines: Vec<PurchaseOrderLine>) -> PurchaseOrder {
        let mut po = PurchaseOrder {
            id: "po1".to_string(),
            po_number: "PO-000001".to_string(),
            supplier_id: "sup1".to_string(),
            items: lines,
            status,
            created_date: Utc::now(),
            expected_date: None,
            received_date: None,
            total_cost_cents: 0,
        };
        po.recompute_total();
        po
    }

    fn exclusive_no_vat() -> TaxSettings {
        TaxSettings {
            vat_enabled: false,
            vat_rate_bps: 1600,
            pricing_type: PricingType::Exclusive,
        }
    }

    /// One batch of `quantity` units of p1.
    fn receive(po: &PurchaseOrder, quantity: i64) -> CoreResult<ReceivingOutcome> {
        apply_receipt(po, &[ReceiptLine::new("p1", quantity)], &exclusive_no_vat(), Utc::now())
    }

    #[test]
    fn test_over_receipt_is_clamped_and_completes_order() {
        // ordered 100, received 40, batch 70 → received 100, invoice for 60
        let po = order(
            PurchaseOrderStatus::PartiallyReceived,
            vec![line("p1", 100, 40, 250)],
        );
        let out = receive(&po, 70).unwrap();
        assert_eq!(out.order.items[0].quantity_received, 100);
        assert_eq!(out.order.status, PurchaseOrderStatus::Received);
        assert_eq!(out.received_units, 60);
        assert_eq!(
            out.stock_deltas,
            vec![StockDelta { product_id: "p1".to_string(), quantity: 60 }]
        );
        assert_eq!(out.invoice.unwrap().total_cents, 250 * 60);
        assert!(out.order.received_date.is_some());
    }

    #[test]
    fn test_exclusive_invoice_total_is_received_cost() {
        let po = order(
            PurchaseOrderStatus::PartiallyReceived,
            vec![line("p1", 100, 40, 1000)],
        );
        let tax = TaxSettings {
            vat_enabled: true,
            ..exclusive_no_vat()
        };
        let out = apply_receipt(&po, &[ReceiptLine::new("p1", 70)], &tax, Utc::now()).unwrap();

        let invoice = out.invoice.unwrap();
        assert_eq!(invoice.total_cents, 1000 * 60);
        assert_eq!(invoice.subtotal_cents, 60_000);
        assert_eq!(invoice.tax_cents, 9_600);
    }

    #[test]
    fn test_relabel_only_touches_given_fields() {
        let now = Utc::now();
        let mut product = Product {
            id: "p1".to_string(),
            sku: "SKU-P1".to_string(),
            ean: Some("6161100000017".to_string()),
            name: "Milk 500ml".to_string(),
            category: "Groceries".to_string(),
            price_cents: 6_000,
            pricing_type: PricingType::Inclusive,
            product_type: crate::types::ProductType::Inventory,
            stock: 4,
            cost_price_cents: None,
            unit_of_measure: "pcs".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(!ReceiptLine::new("p1", 1).relabel(&mut product));
        assert!(!ReceiptLine::new("p1", 1).with_category("  ").relabel(&mut product));
        assert_eq!(product.category, "Groceries");

        assert!(ReceiptLine::new("p1", 1).with_category(" Dairy ").relabel(&mut product));
        assert_eq!(product.category, "Dairy");
        assert_eq!(product.ean.as_deref(), Some("6161100000017"));

        assert!(ReceiptLine::new("p1", 1).with_ean("").relabel(&mut product));
        assert_eq!(product.ean, None);
    }

    #[test]
    fn test_invalid_barcode_rejects_the_batch() {
        let po = order(PurchaseOrderStatus::Sent, vec![line("p1", 10, 0, 100)]);
        let err = apply_receipt(
            &po,
            &[ReceiptLine::new("p1", 2).with_ean("123")],
            &exclusive_no_vat(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_exact_fill_is_received_and_less_is_partial() {
        let po = order(PurchaseOrderStatus::Sent, vec![line("p1", 10, 0, 100)]);
        let exact = receive(&po, 10).unwrap();
        assert_eq!(exact.order.status, PurchaseOrderStatus::Received);

        let partial = receive(&po, 9).unwrap();
        assert_eq!(partial.order.status, PurchaseOrderStatus::PartiallyReceived);
    }

    #[test]
    fn test_zero_batch_changes_nothing() {
        let po = order(PurchaseOrderStatus::Sent, vec![line("p1", 10, 0, 100)]);
        let out = apply_receipt(
            &po,
            &[ReceiptLine::new("p1", 0), ReceiptLine::new("p1", -4)],
            &exclusive_no_vat(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(out.order, po);
        assert!(out.stock_deltas.is_empty());
        assert!(out.invoice.is_none());
    }

    #[test]
    fn test_unknown_products_ignored() {
        let po = order(PurchaseOrderStatus::Sent, vec![line("p1", 10, 0, 100)]);
        let out = apply_receipt(
            &po,
            &[ReceiptLine::new("ghost", 5), ReceiptLine::new("p1", 2)],
            &exclusive_no_vat(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(out.ignored_products, vec!["ghost".to_string()]);
        assert_eq!(out.received_units, 2);
    }

    #[test]
    fn test_receiving_rejected_outside_open_states() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Cancelled,
        ] {
            let po = order(status, vec![line("p1", 10, 0, 100)]);
            let err = receive(&po, 1).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn test_multi_line_partial_then_complete() {
        let po = order(
            PurchaseOrderStatus::Sent,
            vec![line("p1", 5, 0, 100), line("p2", 5, 0, 200)],
        );
        let first = receive(&po, 5).unwrap();
        assert_eq!(first.order.status, PurchaseOrderStatus::PartiallyReceived);
        let second = apply_receipt(
            &first.order,
            &[ReceiptLine::new("p2", 5)],
            &exclusive_no_vat(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(second.order.status, PurchaseOrderStatus::Received);
        assert_eq!(second.invoice.unwrap().total_cents, 1000);
    }

    #[test]
    fn test_invoice_amounts_by_pricing_type() {
        let inclusive = TaxSettings::default();
        let amounts = invoice_amounts(Money::from_major(1160), &inclusive);
        assert_eq!(amounts.subtotal_cents, 100_000);
        assert_eq!(amounts.tax_cents, 16_000);
        assert_eq!(amounts.total_cents, 116_000);

        let exclusive = TaxSettings {
            pricing_type: PricingType::Exclusive,
            ..TaxSettings::default()
        };
        let amounts = invoice_amounts(Money::from_major(1000), &exclusive);
        assert_eq!(amounts.subtotal_cents, 100_000);
        assert_eq!(amounts.tax_cents, 16_000);
        assert_eq!(amounts.total_cents, 100_000);
    }

    #[test]
    fn test_send_cancel_and_add_line() {
        let draft = order(PurchaseOrderStatus::Draft, vec![line("p1", 2, 0, 500)]);
        let sent = mark_sent(&draft).unwrap();
        assert_eq!(sent.status, PurchaseOrderStatus::Sent);
        assert!(mark_sent(&sent).is_err());

        let merged = add_line(&sent, line("p1", 3, 0, 500)).unwrap();
        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.items[0].quantity, 5);
        assert_eq!(merged.total_cost_cents, 2500);

        let appended = add_line(&merged, line("p2", 1, 0, 100)).unwrap();
        assert_eq!(appended.items.len(), 2);
        assert_eq!(appended.total_cost_cents, 2600);

        let cancelled = cancel(&appended).unwrap();
        assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);
        assert!(cancel(&cancelled).is_err());
        assert!(add_line(&cancelled, line("p3", 1, 0, 1)).is_err());
    }

    #[test]
    fn test_new_order_validates_lines() {
        let status = PurchaseOrderStatus::Draft;
        let empty = new_order("po", "PO-1", "s", vec![], status, None, Utc::now());
        assert!(empty.is_err());
        assert!(new_order(
            "po",
            "PO-1",
            "s",
            vec![line("p1", 0, 0, 10)],
            PurchaseOrderStatus::Draft,
            None,
            Utc::now()
        )
        .is_err());
        assert!(new_order(
            "po",
            "PO-1",
            "s",
            vec![line("p1", 1, 0, 10)],
            PurchaseOrderStatus::Received,
            None,
            Utc::now()
        )
        .is_err());

        let po = new_order(
            "po",
            "PO-1",
            "s",
            vec![line("p1", 4, 3, 10)],
            PurchaseOrderStatus::Sent,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(po.items[0].quantity_received, 0);
        assert_eq!(po.total_cost_cents, 40);
    }
}
