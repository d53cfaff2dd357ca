//! # Validation Module
//!
//! Input checks run before any business rule or write.
//!
//! ## Usage
//! ```rust
//! use duka_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("UNGA-2KG").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{Customer, Product, Supplier, NO_PHONE};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku, 50)?;
    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }
    Ok(())
}

pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, 200)
}

/// Validates an EAN-13 barcode when present.
pub fn validate_ean(ean: Option<&str>) -> ValidationResult<()> {
    match ean.map(str::trim) {
        None | Some("") => Ok(()),
        Some(code) if code.len() == 13 && code.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "ean".to_string(),
            reason: "must be 13 digits".to_string(),
        }),
    }
}

/// Phone numbers are required, but [`NO_PHONE`] is an accepted placeholder.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone == NO_PHONE {
        return Ok(());
    }
    required("phone", phone, 20)?;
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+' and '-'".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Zero is allowed (free items); negatives are not.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_sku(&product.sku)?;
    validate_name("name", &product.name)?;
    validate_ean(product.ean.as_deref())?;
    validate_amount_cents("price", product.price_cents)?;
    if let Some(cost) = product.cost_price_cents {
        validate_amount_cents("cost_price", cost)?;
    }
    validate_amount_cents("stock", product.stock)?;
    Ok(())
}

pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_name("name", &customer.name)?;
    validate_phone(&customer.phone)?;
    validate_amount_cents("loyalty_points", customer.loyalty_points)?;
    Ok(())
}

pub fn validate_supplier(supplier: &Supplier) -> ValidationResult<()> {
    validate_name("name", &supplier.name)?;
    required("contact", &supplier.contact, 100)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("UNGA-2KG").is_ok());
        assert!(validate_sku("product_1").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0712 345 678").is_ok());
        assert!(validate_phone("+254712345678").is_ok());
        assert!(validate_phone("N/A").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_validate_ean() {
        assert!(validate_ean(None).is_ok());
        assert!(validate_ean(Some("")).is_ok());
        assert!(validate_ean(Some("6161101234567")).is_ok());
        assert!(validate_ean(Some("12345")).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount_cents("price", 0).is_ok());
        assert!(validate_amount_cents("price", -1).is_err());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(1).is_ok());
    }
}
