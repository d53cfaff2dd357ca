//! # Transaction Engine
//!
//! Turns a cart into a committed sale.
//!
//! ## Sale Completion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale(session, cart, checkout, connectivity)                   │
//! │     │                                                                   │
//! │     ├── lock shift:<user>, customer:<id>, product:<id>...  (sorted)     │
//! │     ├── preconditions, re-read under lock                               │
//! │     │     active shift, non-empty cart, customer, stock, payments       │
//! │     ├── totals (pricing) + loyalty earn/redeem                          │
//! │     │                                                                   │
//! │     ├── ONE WriteBatch                                                  │
//! │     │     shift.sales_ids += sale id                                    │
//! │     │     product.stock  -= qty          (Inventory lines only)         │
//! │     │     customer.loyalty_points        (when eligible)                │
//! │     │     sale ──► sales (online) | order_queue (offline)               │
//! │     │     audit SALE_COMPLETE                                           │
//! │     │                                                                   │
//! │     └── commit ok ──► cart.clear()                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed commit leaves stock, shift, customer and cart as they were.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use duka_core::loyalty::{self, LoyaltyOutcome};
use duka_core::pricing::Discount;
use duka_core::validation::validate_payment_amount;
use duka_core::{
    AuditAction, Cart, CoreError, Customer, Money, Payment, PaymentMethod, Product, Quotation,
    Sale, WALK_IN_CUSTOMER_ID,
};
use duka_db::{Collection, DbError, StoreExt, WriteBatch};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::locks::{customer_key, product_key, shift_key};
use crate::session::{Connectivity, Session};
use crate::shift::find_active;

/// Everything the cashier entered at the pay screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkout {
    /// Walk-in customer when `None`.
    pub customer_id: Option<String>,
    pub discount: Discount,
    pub payments: Vec<Payment>,
    pub points_to_redeem: i64,
}

impl Checkout {
    pub fn new(payments: Vec<Payment>) -> Self {
        Checkout {
            payments,
            ..Checkout::default()
        }
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }

    pub fn redeem_points(mut self, points: i64) -> Self {
        self.points_to_redeem = points;
        self
    }
}

#[derive(Clone)]
pub struct TransactionEngine {
    ctx: EngineContext,
}

impl TransactionEngine {
    pub fn new(ctx: EngineContext) -> Self {
        TransactionEngine { ctx }
    }

    /// Completes a sale and clears the cart.
    ///
    /// ## Errors
    /// - `NoActiveShift` - the user has no open shift
    /// - `EmptyCart`
    /// - `CustomerNotFound`
    /// - `ProductNotFound` / `ProductInactive` / `InsufficientStock`
    /// - `InvalidPaymentAmount` / `InsufficientPayment`
    /// - `Db` - the commit failed; nothing was written and the cart is kept
    pub async fn complete_sale(
        &self,
        session: &Session,
        cart: &mut Cart,
        checkout: Checkout,
        connectivity: Connectivity,
    ) -> EngineResult<Sale> {
        let customer_id = checkout
            .customer_id
            .clone()
            .unwrap_or_else(|| WALK_IN_CUSTOMER_ID.to_string());

        let mut keys = vec![shift_key(&session.user_id), customer_key(&customer_id)];
        keys.extend(cart.items.iter().map(|line| product_key(&line.product_id)));
        let _locks = self.ctx.locks().lock_all(keys).await;

        let store = self.ctx.store();
        let settings = self.ctx.settings();
        let now = Utc::now();

        // 1. Preconditions
        let mut shift = find_active(store, &session.user_id)
            .await?
            .ok_or_else(|| CoreError::NoActiveShift(session.user_id.clone()))?;

        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let customer = self.resolve_customer(&customer_id, now).await?;
        let mut products = self.reserve_stock(cart).await?;

        // 2. Amounts
        let totals = cart.totals(
            checkout.discount,
            &settings.discount,
            settings.tax.effective_rate(),
        );
        let points: LoyaltyOutcome = loyalty::apply(
            &settings.loyalty,
            Some(&customer),
            totals.total(),
            checkout.points_to_redeem,
        );
        let due = (totals.total() - points.points_value()).non_negative();
        let change = check_payments(&checkout.payments, due)?;

        // 3. Build the sale
        let sale = Sale {
            id: self.ctx.ids().sale_id(&settings.receipt.invoice_prefix),
            items: cart.items.clone(),
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            tax_cents: totals.tax_cents,
            total_cents: due.cents(),
            payments: checkout.payments.clone(),
            change_cents: change.cents(),
            customer_id: customer.id.clone(),
            cashier_id: session.user_id.clone(),
            cashier_name: session.user_name.clone(),
            shift_id: shift.id.clone(),
            points_earned: points.points_earned,
            points_used: points.points_used,
            points_value_cents: points.points_value_cents,
            points_balance_after: points.balance_after,
            quotation_id: cart.quotation_id.clone(),
            date: now,
            synced: connectivity.is_online(),
        };

        // 4. One atomic batch
        let mut batch = WriteBatch::new();

        shift.record_sale(&sale.id);
        batch.put(&shift)?;

        for product in products.values_mut() {
            product.updated_at = now;
            batch.put(&*product)?;
        }

        if loyalty::is_eligible(&settings.loyalty, Some(&customer))
            && points.balance_after != customer.loyalty_points
        {
            let updated = Customer {
                loyalty_points: points.balance_after,
                ..customer.clone()
            };
            batch.put(&updated)?;
        }

        match connectivity {
            Connectivity::Online => batch.put(&sale)?,
            Connectivity::Offline => batch.put_in(Collection::OrderQueue, &sale)?,
        }

        audit::record(
            &mut batch,
            session,
            AuditAction::SaleComplete,
            format!("Sale {} completed. Total: {}", sale.id, sale.total()),
            now,
        )?;

        store.commit(batch).await?;

        // 5. Only now is the cart released
        cart.clear();

        info!(
            sale_id = %sale.id,
            total_cents = sale.total_cents,
            lines = sale.items.len(),
            queued = !sale.synced,
            "Sale completed"
        );
        Ok(sale)
    }

    /// Saves the cart as a quotation without touching stock.
    pub async fn save_quotation(
        &self,
        session: &Session,
        cart: &Cart,
        customer_id: Option<&str>,
        valid_days: Option<i64>,
    ) -> EngineResult<Quotation> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        let customer_id = customer_id.unwrap_or(WALK_IN_CUSTOMER_ID);
        let now = Utc::now();
        self.resolve_customer(customer_id, now).await?;

        let settings = self.ctx.settings();
        let totals = cart.totals(
            Discount::None,
            &settings.discount,
            settings.tax.effective_rate(),
        );

        let quotation = Quotation {
            id: self.ctx.ids().quotation_id(&settings.receipt.quote_prefix),
            customer_id: customer_id.to_string(),
            items: cart.items.clone(),
            total_cents: totals.total_cents,
            created_at: now,
            valid_until: valid_days.map(|days| now + Duration::days(days.max(0))),
        };

        let mut batch = WriteBatch::new();
        batch.put(&quotation)?;
        audit::record(
            &mut batch,
            session,
            AuditAction::AddQuotation,
            format!("Quotation {} for {}", quotation.id, quotation.customer_id),
            now,
        )?;
        self.ctx.store().commit(batch).await?;

        debug!(quotation_id = %quotation.id, "Quotation saved");
        Ok(quotation)
    }

    /// Replaces the cart with a stored quotation at its quoted prices.
    pub async fn load_quotation(&self, cart: &mut Cart, quotation_id: &str) -> EngineResult<()> {
        let quotation: Quotation = self
            .ctx
            .store()
            .get(quotation_id)
            .await?
            .ok_or_else(|| DbError::not_found("Quotation", quotation_id))?;
        cart.load_quotation(&quotation);
        Ok(())
    }

    /// Every sale, synced and queued, oldest first within each group.
    ///
    /// The queue is read before `sales`: a sale settled in between shows up
    /// in both reads and is kept once.
    pub async fn sales(&self) -> EngineResult<Vec<Sale>> {
        let store = self.ctx.store();
        let queued: Vec<Sale> = store.get_all_in(Collection::OrderQueue).await?;
        let mut sales: Vec<Sale> = store.get_all().await?;
        let synced: HashSet<String> = sales.iter().map(|s| s.id.clone()).collect();
        sales.extend(queued.into_iter().filter(|q| !synced.contains(&q.id)));
        Ok(sales)
    }

    async fn resolve_customer(&self, id: &str, now: DateTime<Utc>) -> EngineResult<Customer> {
        match self.ctx.store().get::<Customer>(id).await? {
            Some(customer) => Ok(customer),
            None if id == WALK_IN_CUSTOMER_ID => Ok(Customer::walk_in(now)),
            None => Err(CoreError::CustomerNotFound(id.to_string()).into()),
        }
    }

    /// Re-reads every product in the cart and returns them with stock
    /// already decremented. Service products are returned untouched.
    async fn reserve_stock(&self, cart: &Cart) -> EngineResult<BTreeMap<String, Product>> {
        let mut wanted: BTreeMap<&str, i64> = BTreeMap::new();
        for line in &cart.items {
            *wanted.entry(line.product_id.as_str()).or_default() += line.quantity.max(0);
        }

        let mut products = BTreeMap::new();
        for (id, quantity) in wanted {
            let mut product: Product = self
                .ctx
                .store()
                .get(id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

            if !product.is_active {
                return Err(CoreError::ProductInactive(product.sku).into());
            }
            if product.tracks_stock() {
                if product.stock < quantity {
                    return Err(CoreError::InsufficientStock {
                        sku: product.sku,
                        available: product.stock,
                        requested: quantity,
                    }
                    .into());
                }
                product.stock -= quantity;
                products.insert(id.to_string(), product);
            }
        }
        Ok(products)
    }
}

/// Validates tenders against the amount due and returns the change.
///
/// Change comes out of the cash drawer, so it can never exceed the cash
/// tendered.
fn check_payments(payments: &[Payment], due: Money) -> EngineResult<Money> {
    for payment in payments {
        validate_payment_amount(payment.amount_cents).map_err(|e| {
            CoreError::InvalidPaymentAmount {
                reason: e.to_string(),
            }
        })?;
        if payment.method == PaymentMethod::Points {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "points are redeemed through the loyalty request".to_string(),
            }
            .into());
        }
    }

    let paid: Money = payments.iter().map(Payment::amount).sum();
    if paid < due {
        return Err(CoreError::InsufficientPayment {
            due: due.cents(),
            paid: paid.cents(),
        }
        .into());
    }

    let change = paid - due;
    let cash: Money = payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Cash)
        .map(Payment::amount)
        .sum();
    if change > cash {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!("change {} exceeds cash tendered {}", change, cash),
        }
        .into());
    }
    Ok(change)
}
