use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::PricingType;
use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// Whether a product consumes stock when sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Physical goods; stock is decremented on sale and incremented on receipt.
    Inventory,
    /// Labour, delivery, fees. Stock is never touched.
    Service,
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Inventory
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Stock Keeping Unit, unique among products.
    pub sku: String,

    /// EAN-13 barcode, when the product carries one.
    pub ean: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub category: String,

    /// Shelf price in cents.
    pub price_cents: i64,

    /// Whether `price_cents` includes VAT.
    pub pricing_type: PricingType,

    pub product_type: ProductType,

    /// Units on hand. Only meaningful for Inventory products.
    pub stock: i64,

    /// Purchase cost in cents, used as the default PO line cost.
    pub cost_price_cents: Option<i64>,

    /// "pcs", "kg", "crate" ...
    pub unit_of_measure: String,

    /// Soft delete flag. Products are never hard-deleted.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Option<Money> {
        self.cost_price_cents.map(Money::from_cents)
    }

    /// True when sales and receipts move this product's stock.
    #[inline]
    pub fn tracks_stock(&self) -> bool {
        self.product_type == ProductType::Inventory
    }

    /// Checks if `quantity` units can be sold right now.
    ///
    /// Services are always sellable; Inventory needs stock on hand.
    pub fn can_sell(&self, quantity: i64) -> bool {
        if !self.tracks_stock() {
            return true;
        }
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(product_type: ProductType, stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            sku: "SUGAR-1KG".to_string(),
            ean: None,
            name: "Sugar 1kg".to_string(),
            category: "Groceries".to_string(),
            price_cents: 18_000,
            pricing_type: PricingType::Inclusive,
            product_type,
            stock,
            cost_price_cents: Some(15_000),
            unit_of_measure: "pcs".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell_inventory_respects_stock() {
        let p = product(ProductType::Inventory, 3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
    }

    #[test]
    fn test_service_ignores_stock() {
        let p = product(ProductType::Service, 0);
        assert!(!p.tracks_stock());
        assert!(p.can_sell(50));
    }
}
