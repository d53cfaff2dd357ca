//! # Pricing Engine
//!
//! Pure tax, discount and cart-total arithmetic.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► taxable base per line (inclusive prices have VAT removed)    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │          subtotal ──► discount (clamped to max, applied BEFORE tax)     │
//! │              │                                                          │
//! │              ▼                                                          │
//! │          taxable = subtotal − discount                                  │
//! │              │                                                          │
//! │              ▼                                                          │
//! │          tax = taxable × rate          total = taxable + tax            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Intermediate values are carried in 1/10000 of a cent. Each figure is
//! rounded half away from zero exactly once, when it is emitted. The emitted
//! figures always satisfy `total == subtotal − discount + tax` to the cent.
//!
//! ## Example
//! ```rust
//! use duka_core::money::Money;
//! use duka_core::pricing::breakdown;
//! use duka_core::types::{PricingType, TaxRate};
//!
//! let b = breakdown(Money::from_major(1000), PricingType::Inclusive, TaxRate::from_bps(1600));
//! assert_eq!(b.base_cents, 86_207);
//! assert_eq!(b.vat_cents, 13_793);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{round_div, Money};
use crate::settings::DiscountSettings;
use crate::types::{LineItem, PricingType, TaxRate};

/// Sub-cent units per cent used for intermediate accumulation.
const PRECISION: i128 = 10_000;

const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Single Amount Breakdown
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub base_cents: i64,
    pub vat_cents: i64,
}

impl PriceBreakdown {
    #[inline]
    pub fn base(&self) -> Money {
        Money::from_cents(self.base_cents)
    }

    #[inline]
    pub fn vat(&self) -> Money {
        Money::from_cents(self.vat_cents)
    }

    /// Base plus VAT.
    pub fn gross(&self) -> Money {
        self.base() + self.vat()
    }
}

/// Splits an amount into its taxable base and VAT.
///
/// - Inclusive: `base = amount / (1 + rate)`, `vat = amount − base`
/// - Exclusive: `base = amount`, `vat = amount × rate`
pub fn breakdown(amount: Money, pricing_type: PricingType, rate: TaxRate) -> PriceBreakdown {
    match pricing_type {
        PricingType::Inclusive => {
            let base = round_div(
                amount.cents() as i128 * BPS_SCALE,
                BPS_SCALE + rate.bps() as i128,
            ) as i64;
            PriceBreakdown {
                base_cents: base,
                vat_cents: amount.cents() - base,
            }
        }
        PricingType::Exclusive => PriceBreakdown {
            base_cents: amount.cents(),
            vat_cents: amount.calculate_tax(rate).cents(),
        },
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A cashier-entered discount on the whole cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    None,
    /// Percentage of the subtotal, in basis points.
    Percentage { bps: u32 },
    /// Fixed amount in cents.
    Fixed { cents: i64 },
}

impl Default for Discount {
    fn default() -> Self {
        Discount::None
    }
}

/// Discount in sub-cent units, after the configured caps.
fn discount_exact(subtotal_exact: i128, discount: Discount, settings: &DiscountSettings) -> i128 {
    if !settings.enabled {
        return 0;
    }
    let amount = match discount {
        Discount::None => 0,
        Discount::Percentage { bps } => {
            let bps = bps.min(settings.max_percentage_bps).min(10_000);
            round_div(subtotal_exact * bps as i128, BPS_SCALE)
        }
        Discount::Fixed { cents } => {
            let cents = cents.max(0).min(settings.max_fixed_cents.max(0));
            cents as i128 * PRECISION
        }
    };
    amount.clamp(0, subtotal_exact.max(0))
}

// =============================================================================
// Cart Totals
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    /// Σ line taxable bases.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// subtotal − discount.
    pub taxable_cents: i64,
    pub tax_cents: i64,
    /// taxable + tax.
    pub total_cents: i64,
}

impl CartTotals {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Computes cart totals.
///
/// ## Arguments
/// * `items` - cart lines; each is reduced to its taxable base at its own
///   pricing type. Negative prices and quantities count as zero.
/// * `discount` - requested discount, capped by `settings` and the subtotal
/// * `rate` - effective VAT rate (zero when VAT is disabled)
///
/// ## Example
/// ```rust
/// use duka_core::pricing::{cart_totals, Discount};
/// use duka_core::settings::DiscountSettings;
/// use duka_core::types::TaxRate;
///
/// let settings = DiscountSettings::default();
/// let totals = cart_totals(&[], Discount::None, &settings, TaxRate::from_bps(1600));
/// assert_eq!(totals.total_cents, 0);
/// ```
pub fn cart_totals(
    items: &[LineItem],
    discount: Discount,
    settings: &DiscountSettings,
    rate: TaxRate,
) -> CartTotals {
    let bps = rate.bps() as i128;

    let subtotal_exact: i128 = items
        .iter()
        .map(|item| {
            let unit = item.unit_price_cents.max(0) as i128;
            let gross = unit * item.quantity.max(0) as i128 * PRECISION;
            match item.pricing_type {
                PricingType::Inclusive => round_div(gross * BPS_SCALE, BPS_SCALE + bps),
                PricingType::Exclusive => gross,
            }
        })
        .sum();

    let discount_exact = discount_exact(subtotal_exact, discount, settings);
    let taxable_exact = subtotal_exact - discount_exact;
    let tax_exact = round_div(taxable_exact * bps, BPS_SCALE);

    let subtotal = round_div(subtotal_exact, PRECISION) as i64;
    let taxable = round_div(taxable_exact, PRECISION) as i64;
    let total = round_div(taxable_exact + tax_exact, PRECISION) as i64;

    CartTotals {
        subtotal_cents: subtotal,
        discount_cents: subtotal - taxable,
        taxable_cents: taxable,
        tax_cents: total - taxable,
        total_cents: total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductType;

    fn line(price_cents: i64, quantity: i64, pricing_type: PricingType) -> LineItem {
        LineItem {
            product_id: format!("p-{}", price_cents),
            sku: format!("SKU-{}", price_cents),
            name: "Item".to_string(),
            unit_price_cents: price_cents,
            pricing_type,
            product_type: ProductType::Inventory,
            quantity,
            unit_of_measure: "pcs".to_string(),
        }
    }

    fn vat16() -> TaxRate {
        TaxRate::from_bps(1600)
    }

    #[test]
    fn test_inclusive_breakdown_of_1000() {
        let totals = cart_totals(
            &[line(100_000, 1, PricingType::Inclusive)],
            Discount::None,
            &DiscountSettings::default(),
            vat16(),
        );
        assert_eq!(totals.subtotal_cents, 86_207);
        assert_eq!(totals.tax_cents, 13_793);
        assert_eq!(totals.total_cents, 100_000);
        assert_eq!(totals.discount_cents, 0);
    }

    #[test]
    fn test_exclusive_breakdown() {
        let b = breakdown(Money::from_major(1000), PricingType::Exclusive, vat16());
        assert_eq!(b.base_cents, 100_000);
        assert_eq!(b.vat_cents, 16_000);
        assert_eq!(b.gross().cents(), 116_000);
    }

    #[test]
    fn test_discount_applied_before_tax() {
        let totals = cart_totals(
            &[line(100_000, 1, PricingType::Exclusive)],
            Discount::Percentage { bps: 1000 },
            &DiscountSettings::default(),
            vat16(),
        );
        assert_eq!(totals.subtotal_cents, 100_000);
        assert_eq!(totals.discount_cents, 10_000);
        assert_eq!(totals.taxable_cents, 90_000);
        assert_eq!(totals.tax_cents, 14_400);
        assert_eq!(totals.total_cents, 104_400);
    }

    #[test]
    fn test_percentage_discount_clamped_to_max() {
        let settings = DiscountSettings {
            max_percentage_bps: 1000,
            ..DiscountSettings::default()
        };
        let totals = cart_totals(
            &[line(50_000, 1, PricingType::Exclusive)],
            Discount::Percentage { bps: 5000 },
            &settings,
            TaxRate::zero(),
        );
        assert_eq!(totals.discount_cents, 5_000);
        assert_eq!(totals.total_cents, 45_000);
    }

    #[test]
    fn test_fixed_discount_clamped_to_max_and_subtotal() {
        let settings = DiscountSettings {
            max_fixed_cents: 1_000,
            ..DiscountSettings::default()
        };
        let totals = cart_totals(
            &[line(50_000, 1, PricingType::Exclusive)],
            Discount::Fixed { cents: 5_000 },
            &settings,
            TaxRate::zero(),
        );
        assert_eq!(totals.discount_cents, 1_000);

        let generous = DiscountSettings {
            max_fixed_cents: 1_000_000,
            ..DiscountSettings::default()
        };
        let totals = cart_totals(
            &[line(500, 1, PricingType::Exclusive)],
            Discount::Fixed { cents: 9_999 },
            &generous,
            vat16(),
        );
        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_negative_inputs_treated_as_zero() {
        let totals = cart_totals(
            &[line(-500, 2, PricingType::Exclusive), line(1_000, -3, PricingType::Exclusive)],
            Discount::Fixed { cents: -100 },
            &DiscountSettings::default(),
            vat16(),
        );
        assert_eq!(totals, CartTotals::default());
    }

    #[test]
    fn test_disabled_discount_is_ignored() {
        let settings = DiscountSettings {
            enabled: false,
            ..DiscountSettings::default()
        };
        let totals = cart_totals(
            &[line(10_000, 1, PricingType::Exclusive)],
            Discount::Percentage { bps: 1000 },
            &settings,
            TaxRate::zero(),
        );
        assert_eq!(totals.discount_cents, 0);
        assert_eq!(totals.total_cents, 10_000);
    }

    #[test]
    fn test_many_small_lines_do_not_compound_rounding() {
        // 7 × KSh 0.33 inclusive: per-line rounding would drift, exact carry does not
        let items: Vec<LineItem> = (0..7)
            .map(|i| {
                let mut l = line(33, 1, PricingType::Inclusive);
                l.product_id = format!("p{}", i);
                l
            })
            .collect();
        let totals = cart_totals(&items, Discount::None, &DiscountSettings::default(), vat16());
        assert_eq!(totals.total_cents, 231);
        assert_eq!(
            totals.total_cents,
            totals.subtotal_cents - totals.discount_cents + totals.tax_cents
        );
    }

    #[test]
    fn test_identity_holds_for_mixed_cart() {
        let items = vec![
            line(12_345, 3, PricingType::Inclusive),
            line(999, 7, PricingType::Exclusive),
            line(1, 11, PricingType::Inclusive),
        ];
        for discount in [
            Discount::None,
            Discount::Percentage { bps: 333 },
            Discount::Fixed { cents: 777 },
        ] {
            let t = cart_totals(&items, discount, &DiscountSettings::default(), vat16());
            assert_eq!(t.total_cents, t.subtotal_cents - t.discount_cents + t.tax_cents);
            assert!(t.tax_cents >= 0);
            assert!(t.discount_cents >= 0);
        }
    }
}
