//! # Loyalty Ledger
//!
//! Computes points redeemed and earned on a sale.
//!
//! ## Flow at Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart total ──► max redeemable value                                    │
//! │                   = min(total × max%, balance × redemption rate)        │
//! │                          │                                              │
//! │  requested points ──► clamp to balance and to max value                 │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  points value applied ──► amount due = total − points value             │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  earned = floor(amount due / points_per_unit)                           │
//! │  balance after = balance − used + earned                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Disabled loyalty, a missing customer and the walk-in customer all yield
//! a zero outcome. That is policy, not an error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::settings::LoyaltySettings;
use crate::types::Customer;

/// Result of applying the loyalty rules to one sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyOutcome {
    pub points_used: i64,
    pub points_value_cents: i64,
    pub points_earned: i64,
    pub balance_after: i64,
}

impl LoyaltyOutcome {
    #[inline]
    pub fn points_value(&self) -> Money {
        Money::from_cents(self.points_value_cents)
    }
}

/// Whether this customer takes part in the loyalty scheme at all.
pub fn is_eligible(settings: &LoyaltySettings, customer: Option<&Customer>) -> bool {
    settings.enabled && customer.is_some_and(|c| !c.is_walk_in())
}

/// The most a customer's points can take off `total`.
///
/// ## Example
/// ```rust
/// use duka_core::loyalty::max_redeemable_value;
/// use duka_core::money::Money;
/// use duka_core::settings::LoyaltySettings;
///
/// let settings = LoyaltySettings::default(); // 50% cap, 1 point = KSh 0.50
/// // 10 000 points are worth KSh 5 000, but only half of KSh 2 000 may be covered.
/// let max = max_redeemable_value(&settings, Money::from_major(2000), 10_000);
/// assert_eq!(max, Money::from_major(1000));
/// ```
pub fn max_redeemable_value(settings: &LoyaltySettings, total: Money, balance: i64) -> Money {
    let by_share = total
        .non_negative()
        .percentage_bps(settings.max_redemption_bps.min(10_000));
    let by_balance = Money::from_cents(balance.max(0) * settings.redemption_rate_cents.max(0));
    by_share.min(by_balance)
}

/// Applies redemption and earning to one sale.
///
/// ## Arguments
/// * `customer` - the buyer, if known
/// * `total` - cart total before any points are applied
/// * `requested_points` - points the customer asked to redeem
///
/// Over-redemption is silently capped: points used never exceed the
/// balance, and their value never exceeds [`max_redeemable_value`].
pub fn apply(
    settings: &LoyaltySettings,
    customer: Option<&Customer>,
    total: Money,
    requested_points: i64,
) -> LoyaltyOutcome {
    let balance = customer.map(|c| c.loyalty_points.max(0)).unwrap_or(0);
    if !is_eligible(settings, customer) {
        return LoyaltyOutcome {
            balance_after: balance,
            ..LoyaltyOutcome::default()
        };
    }

    let rate = settings.redemption_rate_cents.max(0);
    let points_used = if requested_points <= 0
        || requested_points < settings.min_redeemable_points
        || rate == 0
    {
        0
    } else {
        let max_value = max_redeemable_value(settings, total, balance);
        requested_points
            .min(balance)
            .min(max_value.cents() / rate)
    };
    let points_value = Money::from_cents(points_used * rate);

    let due = (total - points_value).non_negative();
    let points_earned = if settings.points_per_unit_cents > 0 {
        due.cents() / settings.points_per_unit_cents
    } else {
        0
    };

    LoyaltyOutcome {
        points_used,
        points_value_cents: points_value.cents(),
        points_earned,
        balance_after: (balance - points_used + points_earned).max(0),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
