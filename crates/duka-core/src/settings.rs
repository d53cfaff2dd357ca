//! # Store Settings
//!
//! Business configuration consumed by the pricing, loyalty and receiving
//! rules. These are plain serde types; loading them from disk is the job
//! of the calling crate.
//!
//! ## Shape (TOML)
//! ```toml
//! [tax]
//! vat_enabled = true
//! vat_rate_bps = 1600
//! pricing_type = "inclusive"
//!
//! [discount]
//! enabled = true
//! max_percentage_bps = 1000
//!
//! [loyalty]
//! enabled = true
//! points_per_unit_cents = 10000   # KSh 100 spent earns 1 point
//! redemption_rate_cents = 50      # 1 point is worth KSh 0.50
//!
//! [receipt]
//! invoice_prefix = "INV-"
//! ```
//!
//! Every field has a default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PricingType, TaxRate};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Settings {
    pub tax: TaxSettings,
    pub discount: DiscountSettings,
    pub loyalty: LoyaltySettings,
    pub receipt: ReceiptSettings,
}

impl Settings {
    /// Rejects values that would make the pricing rules meaningless.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tax.vat_rate_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "tax.vat_rate_bps".to_string(),
                min: 0,
                max: 10_000,
            });
        }
        if self.discount.max_percentage_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "discount.max_percentage_bps".to_string(),
                min: 0,
                max: 10_000,
            });
        }
        if self.discount.max_fixed_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "discount.max_fixed_cents".to_string(),
            });
        }
        if self.loyalty.max_redemption_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "loyalty.max_redemption_bps".to_string(),
                min: 0,
                max: 10_000,
            });
        }
        if self.loyalty.enabled && self.loyalty.points_per_unit_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "loyalty.points_per_unit_cents".to_string(),
            });
        }
        if self.loyalty.redemption_rate_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "loyalty.redemption_rate_cents".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tax
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct TaxSettings {
    pub vat_enabled: bool,
    /// 1600 = 16%.
    pub vat_rate_bps: u32,
    /// How supplier costs are treated when invoices are generated.
    pub pricing_type: PricingType,
}

impl TaxSettings {
    /// The rate to apply, or zero when VAT is switched off.
    pub fn effective_rate(&self) -> TaxRate {
        if self.vat_enabled {
            TaxRate::from_bps(self.vat_rate_bps)
        } else {
            TaxRate::zero()
        }
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            vat_enabled: true,
            vat_rate_bps: 1600,
            pricing_type: PricingType::Inclusive,
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Caps on cashier-entered discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DiscountSettings {
    pub enabled: bool,
    /// Highest percentage discount, in basis points.
    pub max_percentage_bps: u32,
    /// Highest fixed discount, in cents.
    pub max_fixed_cents: i64,
}

impl DiscountSettings {
    #[inline]
    pub fn max_fixed(&self) -> Money {
        Money::from_cents(self.max_fixed_cents)
    }
}

impl Default for DiscountSettings {
    fn default() -> Self {
        DiscountSettings {
            enabled: true,
            max_percentage_bps: 1000,
            max_fixed_cents: 100_000,
        }
    }
}

// =============================================================================
// Loyalty
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct LoyaltySettings {
    pub enabled: bool,
    /// Money spent (cents) per point earned.
    pub points_per_unit_cents: i64,
    /// Money value (cents) of one redeemed point.
    pub redemption_rate_cents: i64,
    /// Redemption requests below this are ignored.
    pub min_redeemable_points: i64,
    /// Share of the sale total points may cover, in basis points.
    pub max_redemption_bps: u32,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            enabled: true,
            points_per_unit_cents: 10_000,
            redemption_rate_cents: 50,
            min_redeemable_points: 100,
            max_redemption_bps: 5000,
        }
    }
}

// =============================================================================
// Document Numbering
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ReceiptSettings {
    pub invoice_prefix: String,
    pub quote_prefix: String,
    pub po_number_prefix: String,
    pub supplier_invoice_prefix: String,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            invoice_prefix: "INV-".to_string(),
            quote_prefix: "QUO-".to_string(),
            po_number_prefix: "PO-".to_string(),
            supplier_invoice_prefix: "INV-".to_string(),
        }
    }
}
