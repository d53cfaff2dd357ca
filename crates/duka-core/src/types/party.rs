use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::WALK_IN_CUSTOMER_ID;

/// Phone placeholder that is exempt from the uniqueness rule.
pub const NO_PHONE: &str = "N/A";

/// Credit period applied when a supplier's terms cannot be parsed.
pub const DEFAULT_CREDIT_DAYS: i64 = 30;

// =============================================================================
// Customer
// =============================================================================

/// A registered customer, or the anonymous walk-in customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique among customers unless it is [`NO_PHONE`].
    pub phone: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub date_added: DateTime<Utc>,
    /// Loyalty balance. Never negative.
    pub loyalty_points: i64,
}

impl Customer {
    /// The default anonymous customer. Excluded from loyalty.
    pub fn walk_in(now: DateTime<Utc>) -> Self {
        Customer {
            id: WALK_IN_CUSTOMER_ID.to_string(),
            name: "Walk-in Customer".to_string(),
            phone: NO_PHONE.to_string(),
            email: None,
            date_added: now,
            loyalty_points: 0,
        }
    }

    #[inline]
    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_CUSTOMER_ID
    }

    /// Whether this customer's phone takes part in duplicate checks.
    pub fn has_phone(&self) -> bool {
        let phone = self.phone.trim();
        !phone.is_empty() && phone != NO_PHONE
    }
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    /// Unique among suppliers, compared case-insensitively.
    pub name: String,
    pub contact: String,
    pub email: Option<String>,
    /// Payment terms such as "Net 30".
    pub credit_terms: String,
}

impl Supplier {
    /// Days until an invoice from this supplier falls due.
    pub fn credit_days(&self) -> i64 {
        parse_credit_days(&self.credit_terms)
    }
}

/// Parses "Net N" credit terms into a day count.
///
/// Anything unparseable falls back to [`DEFAULT_CREDIT_DAYS`].
///
/// ## Example
/// ```rust
/// use duka_core::types::parse_credit_days;
///
/// assert_eq!(parse_credit_days("Net 45"), 45);
/// assert_eq!(parse_credit_days("net 7"), 7);
/// assert_eq!(parse_credit_days("COD"), 30);
/// ```
pub fn parse_credit_days(terms: &str) -> i64 {
    let trimmed = terms.trim();
    let digits = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("net") => trimmed[3..].trim(),
        _ => trimmed,
    };
    match digits.parse::<i64>() {
        Ok(days) if days >= 0 => days,
        _ => DEFAULT_CREDIT_DAYS,
    }
}
