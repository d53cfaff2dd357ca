use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Purchase Order Status
// =============================================================================

/// ## State Machine
/// ```text
/// Draft ──send──► Sent ──receive──► PartiallyReceived ──receive──► Received
///   │               │                      │ ▲                        (terminal)
///   │               │                      └─┘ receive
///   └───────────────┴──────── cancel ──────┴──► Cancelled (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled)
    }

    /// Goods can only be booked against an order the supplier has seen.
    #[inline]
    pub fn accepts_receipt(self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Sent | PurchaseOrderStatus::PartiallyReceived
        )
    }

    /// Lines can be added until goods start arriving.
    #[inline]
    pub fn accepts_new_lines(self) -> bool {
        matches!(self, PurchaseOrderStatus::Draft | PurchaseOrderStatus::Sent)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PurchaseOrderStatus::Draft => "Draft",
            PurchaseOrderStatus::Sent => "Sent",
            PurchaseOrderStatus::PartiallyReceived => "Partially Received",
            PurchaseOrderStatus::Received => "Received",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrderLine {
    pub product_id: String,
    pub product_name: String,
    /// Units ordered.
    pub quantity: i64,
    /// Units booked in so far. Never exceeds `quantity`.
    pub quantity_received: i64,
    /// Unit cost in cents.
    pub cost_cents: i64,
    pub unit_of_measure: String,
}

impl PurchaseOrderLine {
    pub fn outstanding(&self) -> i64 {
        (self.quantity - self.quantity_received).max(0)
    }

    pub fn is_complete(&self) -> bool {
        self.quantity_received >= self.quantity
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    /// Human-facing number, e.g. "PO-482913".
    pub po_number: String,
    pub supplier_id: String,
    pub items: Vec<PurchaseOrderLine>,
    pub status: PurchaseOrderStatus,
    #[ts(as = "String")]
    pub created_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub received_date: Option<DateTime<Utc>>,
    /// Σ cost × ordered quantity.
    pub total_cost_cents: i64,
}

impl PurchaseOrder {
    /// Recomputes `total_cost_cents` from the lines.
    pub fn recompute_total(&mut self) {
        self.total_cost_cents = self
            .items
            .iter()
            .map(|line| line.cost().multiply_quantity(line.quantity))
            .sum::<Money>()
            .cents();
    }

    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.total_cost_cents)
    }
}

// =============================================================================
// Supplier Invoice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// Accounts-payable document generated by a receiving batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierInvoice {
    pub id: String,
    /// "INV-{po_number}-{5 digits}".
    pub invoice_number: String,
    pub purchase_order_id: String,
    pub supplier_id: String,
    #[ts(as = "String")]
    pub invoice_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Never exceeds `total_cents`.
    pub paid_cents: i64,
    pub status: InvoiceStatus,
}

impl SupplierInvoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn outstanding(&self) -> Money {
        Money::from_cents((self.total_cents - self.paid_cents).max(0))
    }
}

// =============================================================================
// Supplier Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SupplierPaymentMethod {
    BankTransfer,
    Cash,
    MPesa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierPayment {
    pub id: String,
    pub invoice_id: String,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
    pub amount_cents: i64,
    pub method: SupplierPaymentMethod,
    pub reference: Option<String>,
}
