//! # Catalog Maintenance
//!
//! Products, customers and suppliers, with the uniqueness rules the
//! till relies on:
//!
//! - SKU unique among products (case-insensitive)
//! - phone unique among customers, unless it is "N/A"
//! - supplier name unique (case-insensitive)
//! - the walk-in customer always exists and cannot be deleted
//!
//! Products are never hard-deleted; deactivation hides them from sale.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use duka_core::validation::{validate_customer, validate_product, validate_supplier};
use duka_core::{
    AuditAction, CoreError, Customer, PricingType, Product, ProductType, Supplier,
    ValidationError, WALK_IN_CUSTOMER_ID,
};
use duka_db::{StoreExt, WriteBatch};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::locks::{customer_key, product_key, CATALOG_KEY};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub ean: Option<String>,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub pricing_type: PricingType,
    pub product_type: ProductType,
    pub stock: i64,
    pub cost_price_cents: Option<i64>,
    pub unit_of_measure: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact: String,
    pub email: Option<String>,
    pub credit_terms: String,
}

fn same_key(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn duplicate(field: &str, value: &str) -> ValidationError {
    ValidationError::Duplicate {
        field: field.to_string(),
        value: value.trim().to_string(),
    }
}

#[derive(Clone)]
pub struct CatalogManager {
    ctx: EngineContext,
}

impl CatalogManager {
    pub fn new(ctx: EngineContext) -> Self {
        CatalogManager { ctx }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn add_product(&self, session: &Session, new: NewProduct) -> EngineResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: self.ctx.ids().uuid(),
            sku: new.sku.trim().to_string(),
            ean: new.ean.filter(|e| !e.trim().is_empty()),
            name: new.name.trim().to_string(),
            category: new.category,
            price_cents: new.price_cents,
            pricing_type: new.pricing_type,
            product_type: new.product_type,
            stock: if new.product_type == ProductType::Service { 0 } else { new.stock },
            cost_price_cents: new.cost_price_cents,
            unit_of_measure: new.unit_of_measure,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        validate_product(&product)?;

        let _locks = self.ctx.locks().lock_all([CATALOG_KEY.to_string()]).await;
        self.ensure_unique_sku(&product.sku, None).await?;

        self.write(
            session,
            &product,
            AuditAction::AddProduct,
            format!("Added product {} ({})", product.name, product.sku),
        )
        .await?;
        info!(product_id = %product.id, sku = %product.sku, "Product added");
        Ok(product)
    }

    /// Replaces a product's editable fields. Identity and creation time
    /// are kept from the stored record.
    pub async fn update_product(
        &self,
        session: &Session,
        product: Product,
    ) -> EngineResult<Product> {
        validate_product(&product)?;
        let _locks = self
            .ctx
            .locks()
            .lock_all([CATALOG_KEY.to_string(), product_key(&product.id)])
            .await;

        let existing = self.product(&product.id).await?;
        self.ensure_unique_sku(&product.sku, Some(&product.id)).await?;

        let updated = Product {
            created_at: existing.created_at,
            updated_at: Utc::now(),
            ..product
        };
        self.write(
            session,
            &updated,
            AuditAction::UpdateProduct,
            format!("Updated product {}", updated.sku),
        )
        .await?;
        Ok(updated)
    }

    /// Soft delete.
    pub async fn deactivate_product(&self, session: &Session, id: &str) -> EngineResult<Product> {
        let _locks = self.ctx.locks().lock_all([product_key(id)]).await;
        let existing = self.product(id).await?;
        let updated = Product {
            is_active: false,
            updated_at: Utc::now(),
            ..existing
        };
        self.write(
            session,
            &updated,
            AuditAction::DeleteProduct,
            format!("Deactivated product {}", updated.sku),
        )
        .await?;
        Ok(updated)
    }

    pub async fn product(&self, id: &str) -> EngineResult<Product> {
        self.ctx
            .store()
            .get(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.ctx.store().get_all().await?)
    }

    /// Active product by SKU or barcode, as scanned at the till.
    pub async fn find_by_code(&self, code: &str) -> EngineResult<Option<Product>> {
        let code = code.trim();
        let products: Vec<Product> = self.ctx.store().get_all().await?;
        Ok(products.into_iter().find(|p| {
            p.is_active && (same_key(&p.sku, code) || p.ean.as_deref() == Some(code))
        }))
    }

    async fn ensure_unique_sku(&self, sku: &str, except_id: Option<&str>) -> EngineResult<()> {
        let products: Vec<Product> = self.ctx.store().get_all().await?;
        if products
            .iter()
            .any(|p| Some(p.id.as_str()) != except_id && same_key(&p.sku, sku))
        {
            return Err(duplicate("sku", sku).into());
        }
        Ok(())
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn add_customer(
        &self,
        session: &Session,
        new: NewCustomer,
    ) -> EngineResult<Customer> {
        let customer = Customer {
            id: self.ctx.ids().uuid(),
            name: new.name.trim().to_string(),
            phone: new.phone.trim().to_string(),
            email: new.email.filter(|e| !e.trim().is_empty()),
            date_added: Utc::now(),
            loyalty_points: 0,
        };
        validate_customer(&customer)?;

        let _locks = self.ctx.locks().lock_all([CATALOG_KEY.to_string()]).await;
        if customer.has_phone() {
            let customers: Vec<Customer> = self.ctx.store().get_all().await?;
            if customers
                .iter()
                .any(|c| c.has_phone() && same_key(&c.phone, &customer.phone))
            {
                return Err(duplicate("phone", &customer.phone).into());
            }
        }

        self.write(
            session,
            &customer,
            AuditAction::AddCustomer,
            format!("Added customer {}", customer.name),
        )
        .await?;
        Ok(customer)
    }

    /// ## Errors
    /// - `WalkInCustomerProtected` for the walk-in customer
    /// - `CustomerNotFound`
    pub async fn delete_customer(&self, session: &Session, id: &str) -> EngineResult<()> {
        if id == WALK_IN_CUSTOMER_ID {
            return Err(CoreError::WalkInCustomerProtected.into());
        }
        let _locks = self.ctx.locks().lock_all([customer_key(id)]).await;
        let store = self.ctx.store();
        let customer: Customer = store
            .get(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;

        let now = Utc::now();
        let mut batch = WriteBatch::new();
        batch.delete::<Customer>(id);
        audit::record(
            &mut batch,
            session,
            AuditAction::DeleteCustomer,
            format!("Deleted customer {}", customer.name),
            now,
        )?;
        store.commit(batch).await?;
        Ok(())
    }

    pub async fn customers(&self) -> EngineResult<Vec<Customer>> {
        Ok(self.ctx.store().get_all().await?)
    }

    /// Creates the walk-in customer if it is missing. Returns whether it
    /// was created.
    pub async fn ensure_walk_in_customer(&self) -> EngineResult<bool> {
        let _locks = self.ctx.locks().lock_all([customer_key(WALK_IN_CUSTOMER_ID)]).await;
        let store = self.ctx.store();
        if store.get::<Customer>(WALK_IN_CUSTOMER_ID).await?.is_some() {
            return Ok(false);
        }
        store.put(&Customer::walk_in(Utc::now())).await?;
        info!("Created walk-in customer");
        Ok(true)
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn add_supplier(
        &self,
        session: &Session,
        new: NewSupplier,
    ) -> EngineResult<Supplier> {
        let supplier = Supplier {
            id: self.ctx.ids().uuid(),
            name: new.name.trim().to_string(),
            contact: new.contact.trim().to_string(),
            email: new.email.filter(|e| !e.trim().is_empty()),
            credit_terms: new.credit_terms.trim().to_string(),
        };
        validate_supplier(&supplier)?;

        let _locks = self.ctx.locks().lock_all([CATALOG_KEY.to_string()]).await;
        let suppliers: Vec<Supplier> = self.ctx.store().get_all().await?;
        if suppliers.iter().any(|s| same_key(&s.name, &supplier.name)) {
            return Err(duplicate("supplier name", &supplier.name).into());
        }

        self.write(
            session,
            &supplier,
            AuditAction::AddSupplier,
            format!("Added supplier {}", supplier.name),
        )
        .await?;
        Ok(supplier)
    }

    pub async fn suppliers(&self) -> EngineResult<Vec<Supplier>> {
        Ok(self.ctx.store().get_all().await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn write<R: duka_db::Record>(
        &self,
        session: &Session,
        record: &R,
        action: AuditAction,
        details: String,
    ) -> EngineResult<()> {
        let mut batch = WriteBatch::new();
        batch.put(record)?;
        audit::record(&mut batch, session, action, details, Utc::now())?;
        self.ctx.store().commit(batch).await?;
        Ok(())
    }
}
