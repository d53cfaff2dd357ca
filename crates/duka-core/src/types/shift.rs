use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::PaymentMethod;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    /// Terminal.
    Closed,
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Totals per tender method for a closed shift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    pub cash_cents: i64,
    pub mpesa_cents: i64,
    pub card_cents: i64,
    pub points_cents: i64,
}

impl PaymentBreakdown {
    pub fn add(&mut self, method: PaymentMethod, amount: Money) {
        let slot = match method {
            PaymentMethod::Cash => &mut self.cash_cents,
            PaymentMethod::MPesa => &mut self.mpesa_cents,
            PaymentMethod::Card => &mut self.card_cents,
            PaymentMethod::Points => &mut self.points_cents,
        };
        *slot += amount.cents();
    }

    pub fn get(&self, method: PaymentMethod) -> Money {
        Money::from_cents(match method {
            PaymentMethod::Cash => self.cash_cents,
            PaymentMethod::MPesa => self.mpesa_cents,
            PaymentMethod::Card => self.card_cents,
            PaymentMethod::Points => self.points_cents,
        })
    }
}

// =============================================================================
// Shift
// =============================================================================

/// A cash-drawer session bound to one user.
///
/// ## Lifecycle
/// ```text
/// open ──► Active ──(sales appended)──► close ──► Closed
/// ```
/// The closing fields are `None` while active and set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    /// Cash placed in the drawer at open.
    pub starting_float_cents: i64,
    pub sales_ids: Vec<String>,
    pub status: ShiftStatus,
    pub payment_breakdown: Option<PaymentBreakdown>,
    pub total_sales_cents: Option<i64>,
    pub total_change_cents: Option<i64>,
    pub expected_cash_cents: Option<i64>,
    pub actual_cash_cents: Option<i64>,
    pub cash_variance_cents: Option<i64>,
}

impl Shift {
    /// Opens a new active shift.
    pub fn open(
        id: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        starting_float: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Shift {
            id: id.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            start_time: now,
            end_time: None,
            starting_float_cents: starting_float.cents(),
            sales_ids: Vec::new(),
            status: ShiftStatus::Active,
            payment_breakdown: None,
            total_sales_cents: None,
            total_change_cents: None,
            expected_cash_cents: None,
            actual_cash_cents: None,
            cash_variance_cents: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }

    #[inline]
    pub fn starting_float(&self) -> Money {
        Money::from_cents(self.starting_float_cents)
    }

    /// Appends a sale id. Ignores duplicates.
    pub fn record_sale(&mut self, sale_id: &str) {
        if !self.sales_ids.iter().any(|id| id == sale_id) {
            self.sales_ids.push(sale_id.to_string());
        }
    }
}
