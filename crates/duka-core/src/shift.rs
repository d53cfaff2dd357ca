//! # Shift Reconciliation
//!
//! Cash-drawer math for closing a shift.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  breakdown[m]  = Σ payments of method m   (points from points_value)    │
//! │  total_change  = Σ sale.change                                          │
//! │  expected cash = starting float + breakdown[Cash] − total_change        │
//! │  variance      = counted cash − expected cash                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All amounts are integer cents, so the variance is exact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentBreakdown, PaymentMethod, Sale, Shift, ShiftStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftSummary {
    pub payment_breakdown: PaymentBreakdown,
    pub total_sales_cents: i64,
    pub total_change_cents: i64,
    pub expected_cash_cents: i64,
    pub actual_cash_cents: i64,
    pub cash_variance_cents: i64,
}

/// Reconciles a shift's sales against the counted drawer.
///
/// `sales` should be exactly the sales referenced by the shift.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use duka_core::money::Money;
/// use duka_core::shift::reconcile;
/// use duka_core::types::Shift;
///
/// let shift = Shift::open("s1", "u1", "Amina", Money::from_major(5000), Utc::now());
/// let summary = reconcile(&shift, &[], Money::from_major(5000));
/// assert_eq!(summary.expected_cash_cents, 500_000);
/// assert_eq!(summary.cash_variance_cents, 0);
/// ```
pub fn reconcile(shift: &Shift, sales: &[Sale], actual_cash: Money) -> ShiftSummary {
    let mut breakdown = PaymentBreakdown::default();
    let mut total_sales = Money::zero();
    let mut total_change = Money::zero();

    for sale in sales {
        for payment in &sale.payments {
            breakdown.add(payment.method, payment.amount());
        }
        if sale.points_value_cents > 0 {
            breakdown.add(PaymentMethod::Points, sale.points_value());
        }
        total_sales += sale.total();
        total_change += sale.change();
    }

    let expected = shift.starting_float() + breakdown.get(PaymentMethod::Cash) - total_change;

    ShiftSummary {
        payment_breakdown: breakdown,
        total_sales_cents: total_sales.cents(),
        total_change_cents: total_change.cents(),
        expected_cash_cents: expected.cents(),
        actual_cash_cents: actual_cash.cents(),
        cash_variance_cents: (actual_cash - expected).cents(),
    }
}

/// Returns the closed shift with the summary written into it.
pub fn close(shift: &Shift, summary: &ShiftSummary, now: DateTime<Utc>) -> Shift {
    Shift {
        status: ShiftStatus::Closed,
        end_time: Some(now),
        payment_breakdown: Some(summary.payment_breakdown.clone()),
        total_sales_cents: Some(summary.total_sales_cents),
        total_change_cents: Some(summary.total_change_cents),
        expected_cash_cents: Some(summary.expected_cash_cents),
        actual_cash_cents: Some(summary.actual_cash_cents),
        cash_variance_cents: Some(summary.cash_variance_cents),
        ..shift.clone()
    }
}
