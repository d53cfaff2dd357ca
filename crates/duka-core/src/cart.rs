//! # Cart
//!
//! The in-progress sale a cashier is building.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_product(p, 2) ──► stock check ──► merge or append line             │
//! │  update_quantity(p, 0) ──► remove line                                  │
//! │  load_quotation(q) ──► replace lines at quoted prices, remember q.id    │
//! │  totals(...) ──► pricing::cart_totals                                   │
//! │  clear() ──► after the sale is committed                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - Every quantity is in `1..=MAX_ITEM_QUANTITY`
//! - Inventory lines never exceed the stock seen when they were changed

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::pricing::{cart_totals, CartTotals, Discount};
use crate::settings::DiscountSettings;
use crate::types::{LineItem, Product, Quotation, TaxRate};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<LineItem>,
    /// Set when the cart was loaded from a quotation.
    pub quotation_id: Option<String>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product or increases the quantity of its existing line.
    ///
    /// ## Errors
    /// - `ProductInactive` for soft-deleted products
    /// - `InsufficientStock` when an Inventory product would exceed stock
    /// - `QuantityTooLarge` / `CartTooLarge` at the cart limits
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id.clone()));
        }

        let existing = self.quantity_of(&product.id);
        let new_qty = existing + quantity;
        if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if !product.can_sell(new_qty) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.stock,
                requested: new_qty,
            });
        }

        if let Some(line) = self.items.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        self.items.push(LineItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(&product.id);
        }
        validate_quantity(quantity)?;
        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.stock,
                requested: quantity,
            });
        }
        match self.items.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product.id.clone())),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|l| l.product_id != product_id);
        if self.items.len() == before {
            return Err(CoreError::NotInCart(product_id.to_string()));
        }
        Ok(())
    }

    /// Replaces the cart with a quotation's lines at the quoted prices.
    pub fn load_quotation(&mut self, quotation: &Quotation) {
        self.items = quotation.items.clone();
        self.quotation_id = Some(quotation.id.clone());
    }

    /// Empties the cart and forgets any originating quotation.
    pub fn clear(&mut self) {
        self.items.clear();
        self.quotation_id = None;
    }

    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    pub fn totals(
        &self,
        discount: Discount,
        settings: &DiscountSettings,
        rate: TaxRate,
    ) -> CartTotals {
        cart_totals(&self.items, discount, settings, rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PricingType, ProductType};
    use chrono::Utc;

    fn product(id: &str, stock: i64, product_type: ProductType) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            ean: None,
            name: format!("Product {}", id),
            category: "General".to_string(),
            price_cents: 10_000,
            pricing_type: PricingType::Inclusive,
            product_type,
            stock,
            cost_price_cents: None,
            unit_of_measure: "pcs".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::new();
        let p = product("1", 10, ProductType::Inventory);
        cart.add_product(&p, 2).unwrap();
        cart.add_product(&p, 3).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.quantity_of("1"), 5);
    }

    #[test]
    fn test_add_beyond_stock_rejected() {
        let mut cart = Cart::new();
        let p = product("1", 3, ProductType::Inventory);
        cart.add_product(&p, 3).unwrap();
        let err = cart.add_product(&p, 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(cart.quantity_of("1"), 3);
    }

    #[test]
    fn test_out_of_stock_rejected_but_service_allowed() {
        let mut cart = Cart::new();
        let empty = product("1", 0, ProductType::Inventory);
        assert!(cart.add_product(&empty, 1).is_err());

        let service = product("2", 0, ProductType::Service);
        cart.add_product(&service, 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);
    }

    #[test]
    fn test_inactive_product_rejected() {
        let mut cart = Cart::new();
        let mut p = product("1", 10, ProductType::Inventory);
        p.is_active = false;
        assert!(matches!(
            cart.add_product(&p, 1),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::new();
        let p = product("1", 10, ProductType::Inventory);
        cart.add_product(&p, 2).unwrap();
        cart.update_quantity(&p, 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.update_quantity(&p, 1).is_err());
    }

    #[test]
    fn test_load_quotation_then_clear() {
        let p = product("1", 10, ProductType::Inventory);
        let mut line = LineItem::from_product(&p, 2);
        line.unit_price_cents = 9_000;
        let quotation = Quotation {
            id: "QUO-1".to_string(),
            customer_id: "cust-1".to_string(),
            items: vec![line],
            total_cents: 18_000,
            created_at: Utc::now(),
            valid_until: None,
        };

        let mut cart = Cart::new();
        cart.add_product(&product("2", 5, ProductType::Inventory), 1).unwrap();
        cart.load_quotation(&quotation);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].unit_price_cents, 9_000);
        assert_eq!(cart.quotation_id.as_deref(), Some("QUO-1"));

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.quotation_id.is_none());
    }
}
