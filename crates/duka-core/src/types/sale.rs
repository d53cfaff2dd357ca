use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{PricingType, Product, ProductType};
use crate::money::Money;

// =============================================================================
// Line Item
// =============================================================================

/// A product line in a cart, quotation or sale.
///
/// Uses the snapshot pattern: price, name and pricing type are frozen when
/// the line is created, so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    /// SKU at time of adding (frozen).
    pub sku: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,
    pub pricing_type: PricingType,
    pub product_type: ProductType,
    pub quantity: i64,
    pub unit_of_measure: String,
}

impl LineItem {
    /// Creates a line from a product, freezing its current price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            pricing_type: product.pricing_type,
            product_type: product.product_type,
            quantity,
            unit_of_measure: product.unit_of_measure.clone(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, at the shelf price (before tax breakdown).
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn tracks_stock(&self) -> bool {
        self.product_type == ProductType::Inventory
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. The only tender that can produce change.
    Cash,
    /// Mobile money.
    MPesa,
    /// Card payment on an external terminal.
    Card,
    /// Loyalty points redeemed against the sale.
    Points,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::MPesa,
        PaymentMethod::Card,
        PaymentMethod::Points,
    ];
}

// =============================================================================
// Payment
// =============================================================================

/// A tender towards a sale. A sale can carry several for split payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub method: PaymentMethod,
    /// Amount tendered in cents. Always > 0.
    pub amount_cents: i64,
    /// M-Pesa confirmation code, card auth code, etc.
    pub reference: Option<String>,
}

impl Payment {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        Payment {
            method,
            amount_cents: amount.cents(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Immutable after creation except for `synced`.
///
/// ## Amount Identity
/// ```text
/// total = subtotal − discount + tax − points_value
/// Σ payments ≥ total
/// change = Σ payments − total        (never more than the cash tendered)
/// ```
/// `total` is the amount due after points. Points are not part of
/// `payments`; they are reported through `points_value_cents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    /// Invoice number, e.g. "INV-1700000000000".
    pub id: String,
    pub items: Vec<LineItem>,
    /// Sum of line taxable bases.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// Amount due after loyalty redemption.
    pub total_cents: i64,
    pub payments: Vec<Payment>,
    pub change_cents: i64,
    pub customer_id: String,
    pub cashier_id: String,
    pub cashier_name: String,
    pub shift_id: String,
    pub points_earned: i64,
    pub points_used: i64,
    pub points_value_cents: i64,
    pub points_balance_after: i64,
    /// Quotation this sale was converted from, if any.
    pub quotation_id: Option<String>,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// True once the record is in the remote system of record.
    pub synced: bool,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }

    #[inline]
    pub fn points_value(&self) -> Money {
        Money::from_cents(self.points_value_cents)
    }

    /// Sum of all tenders (points excluded).
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(Payment::amount).sum()
    }

    /// Sum of tenders of one method.
    pub fn paid_by(&self, method: PaymentMethod) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == method)
            .map(Payment::amount)
            .sum()
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// A price quote that can later be loaded into the cart and sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quotation {
    /// Quote number, e.g. "QT-1700000000000".
    pub id: String,
    pub customer_id: String,
    pub items: Vec<LineItem>,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
}
