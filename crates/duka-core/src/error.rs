//! # Error Types
//!
//! Domain-specific error types for duka-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  duka-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  duka-db errors       └── DbError      - Persistence failures           │
//! │  duka-engine errors   └── EngineError  - Unit-of-work failures          │
//! │  duka-sync errors     └── SyncError    - Remote push failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Precondition errors are raised before any write happens, so a caller
//! seeing one of these knows nothing was persisted.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (or was soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is no longer sold.
    #[error("Product {0} is inactive")]
    ProductInactive(String),

    /// Insufficient stock to add to cart or complete a sale.
    ///
    /// ## When This Occurs
    /// - Adding an Inventory product whose stock is zero
    /// - Raising a cart line above the stock on hand
    /// - Stock moved between cart building and checkout
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "SUGAR-1KG", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Product is not in the cart.
    #[error("Product {0} not in cart")]
    NotInCart(String),

    /// Payment amount is invalid (zero, negative, or change larger than cash).
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Tendered payments do not cover the amount due.
    #[error("Insufficient payment: due {due} cents, paid {paid} cents")]
    InsufficientPayment { due: i64, paid: i64 },

    /// No active shift for the acting user.
    #[error("No active shift for user {0}")]
    NoActiveShift(String),

    /// The user already has an open shift.
    #[error("User {0} already has an active shift")]
    ShiftAlreadyActive(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// The walk-in customer is permanent.
    #[error("The walk-in customer cannot be deleted")]
    WalkInCustomerProtected,

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Purchase order cannot be found.
    #[error("Purchase order not found: {0}")]
    PurchaseOrderNotFound(String),

    /// Purchase order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Receiving against a Draft, Received or Cancelled order
    /// - Sending an order that is not a Draft
    /// - Cancelling an order that is already terminal
    #[error("Purchase order {po_number} is {status}, cannot {operation}")]
    InvalidTransition {
        po_number: String,
        status: String,
        operation: String,
    },

    /// Supplier invoice cannot be found.
    #[error("Supplier invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment would take an invoice past its total.
    #[error("Payment of {amount} cents exceeds outstanding balance of {outstanding} cents")]
    Overpayment { amount: i64, outstanding: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU, phone, supplier name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
