//! # duka-core: Pure Business Logic for Duka POS
//!
//! Every rule that decides an amount, a quantity or a state transition
//! lives here as a pure function. No database, no network, no clock
//! reads: timestamps and ids are passed in by the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  duka-engine / duka-sync      (orchestration, I/O)                      │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  duka-core  ◄── YOU ARE HERE                                            │
//! │   ├── pricing     tax breakdown, discounts, cart totals                 │
//! │   ├── loyalty     points earned / redeemed                              │
//! │   ├── cart        cart lines and stock checks                           │
//! │   ├── receiving   purchase-order transitions                            │
//! │   ├── payables    supplier invoices and payments                        │
//! │   └── shift       cash-drawer reconciliation                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Shift, PurchaseOrder, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`settings`] - Tax, discount, loyalty and numbering settings
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::pricing::{cart_totals, Discount};
//! use duka_core::settings::DiscountSettings;
//! use duka_core::types::TaxRate;
//!
//! let settings = DiscountSettings::default();
//! let totals = cart_totals(&[], Discount::None, &settings, TaxRate::from_bps(1600));
//! assert_eq!(totals.total_cents, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod payables;
pub mod pricing;
pub mod receiving;
pub mod settings;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settings::Settings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Id of the anonymous walk-in customer. It always exists, cannot be
/// deleted and never earns or redeems points.
pub const WALK_IN_CUSTOMER_ID: &str = "cust001";

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;
