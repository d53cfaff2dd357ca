//! # Supplier Accounts Payable
//!
//! Invoice creation from a receiving batch and payment recording.
//!
//! ```text
//! Unpaid ──pay (partial)──► PartiallyPaid ──pay (rest)──► Paid
//!    └────────────pay (full)─────────────────────────────────┘
//! ```
//! Payments that would take `paid` past `total` are rejected.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::receiving::InvoiceAmounts;
use crate::types::{
    InvoiceStatus, PurchaseOrder, SupplierInvoice, SupplierPayment, SupplierPaymentMethod,
};

/// Formats a supplier invoice number: `{prefix}{po_number}-{last 5 digits of clock}`.
///
/// ## Example
/// ```rust
/// use duka_core::payables::supplier_invoice_number;
///
/// assert_eq!(
///     supplier_invoice_number("INV-", "PO-123456", 1_700_000_012_345),
///     "INV-PO-123456-12345"
/// );
/// ```
pub fn supplier_invoice_number(prefix: &str, po_number: &str, clock_millis: i64) -> String {
    format!("{}{}-{:05}", prefix, po_number, clock_millis.rem_euclid(100_000))
}

/// Builds an unpaid invoice for goods just received on `order`.
pub fn build_invoice(
    id: impl Into<String>,
    invoice_number: impl Into<String>,
    order: &PurchaseOrder,
    amounts: InvoiceAmounts,
    credit_days: i64,
    now: DateTime<Utc>,
) -> SupplierInvoice {
    SupplierInvoice {
        id: id.into(),
        invoice_number: invoice_number.into(),
        purchase_order_id: order.id.clone(),
        supplier_id: order.supplier_id.clone(),
        invoice_date: now,
        due_date: now + Duration::days(credit_days.max(0)),
        subtotal_cents: amounts.subtotal_cents,
        tax_cents: amounts.tax_cents,
        total_cents: amounts.total_cents,
        paid_cents: 0,
        status: InvoiceStatus::Unpaid,
    }
}

/// Status implied by the amount paid so far.
pub fn status_for(paid: Money, total: Money) -> InvoiceStatus {
    if paid >= total {
        InvoiceStatus::Paid
    } else if paid.is_positive() {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Unpaid
    }
}

/// Applies a payment to an invoice.
///
/// Returns the updated invoice and the payment record to persist.
///
/// ## Errors
/// - `MustBePositive` for zero or negative amounts
/// - `Overpayment` when the amount exceeds the outstanding balance
pub fn record_payment(
    invoice: &SupplierInvoice,
    payment_id: impl Into<String>,
    amount: Money,
    method: SupplierPaymentMethod,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<(SupplierInvoice, SupplierPayment)> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }
    let outstanding = invoice.outstanding();
    if amount > outstanding {
        return Err(CoreError::Overpayment {
            amount: amount.cents(),
            outstanding: outstanding.cents(),
        });
    }

    let paid = Money::from_cents(invoice.paid_cents) + amount;
    let updated = SupplierInvoice {
        paid_cents: paid.cents(),
        status: status_for(paid, invoice.total()),
        ..invoice.clone()
    };
    let payment = SupplierPayment {
        id: payment_id.into(),
        invoice_id: invoice.id.clone(),
        payment_date: now,
        amount_cents: amount.cents(),
        method,
        reference,
    };
    Ok((updated, payment))
}
