//! # Domain Types
//!
//! Core domain entities for Duka POS.
//!
//! ## Entity Relationship Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Domain Model                            │
//! │                                                                         │
//! │  ┌──────────┐   snapshot   ┌──────────┐  ids only  ┌──────────┐         │
//! │  │ Product  │─────────────►│   Sale   │◄───────────│  Shift   │         │
//! │  └────┬─────┘              └────┬─────┘            └──────────┘         │
//! │       │ stock +=                │ customer_id                           │
//! │       │                    ┌────┴─────┐                                 │
//! │  ┌────┴──────────┐         │ Customer │  loyalty_points                 │
//! │  │ PurchaseOrder │         └──────────┘                                 │
//! │  └────┬──────────┘                                                      │
//! │       │ purchase_order_id                                               │
//! │  ┌────┴────────────┐      ┌─────────────────┐                           │
//! │  │ SupplierInvoice │◄─────│ SupplierPayment │                           │
//! │  └─────────────────┘      └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every persisted entity carries a string `id`. Monetary fields are
//! integer cents with a `_cents` suffix and a `Money` accessor.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod audit;
mod party;
mod product;
mod purchasing;
mod sale;
mod shift;

pub use audit::*;
pub use party::*;
pub use product::*;
pub use purchasing::*;
pub use sale::*;
pub use shift::*;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 1600 bps = 16% (Kenyan VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for configuration input).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Pricing Type
// =============================================================================

/// Whether a listed price already contains VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    /// Shelf price includes VAT (Kenyan retail default).
    Inclusive,
    /// VAT is added on top of the shelf price.
    Exclusive,
}

impl Default for PricingType {
    fn default() -> Self {
        PricingType::Inclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(16.0);
        assert_eq!(rate.bps(), 1600);
        assert!((rate.percentage() - 16.0).abs() < 0.001);
        assert_eq!(TaxRate::from_percentage(-3.0).bps(), 0);
    }

    #[test]
    fn test_pricing_type_serde() {
        let json = serde_json::to_string(&PricingType::Exclusive).unwrap();
        assert_eq!(json, "\"exclusive\"");
        assert_eq!(PricingType::default(), PricingType::Inclusive);
    }
}
