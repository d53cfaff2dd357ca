//! # Shift Reconciler
//!
//! Opens and closes cash-drawer shifts.
//!
//! ## Shift Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start(session, float)                                                  │
//! │     └─► Active ── sales append their ids ──►                            │
//! │                                                                         │
//! │  end(session, counted cash)                                             │
//! │     ├── gather sales by id (sales, then order queue)                    │
//! │     ├── duka_core::shift::reconcile  breakdown, expected, variance      │
//! │     └─► Closed (terminal)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{info, warn};

use duka_core::shift::{close, reconcile};
use duka_core::validation::validate_amount_cents;
use duka_core::{AuditAction, CoreError, Money, Sale, Shift};
use duka_db::{Collection, Store, StoreExt, WriteBatch};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::locks::shift_key;
use crate::session::Session;

/// The user's active shift, if any.
pub(crate) async fn find_active(store: &dyn Store, user_id: &str) -> EngineResult<Option<Shift>> {
    let shifts: Vec<Shift> = store.get_all().await?;
    Ok(shifts
        .into_iter()
        .find(|shift| shift.user_id == user_id && shift.is_active()))
}

#[derive(Clone)]
pub struct ShiftReconciler {
    ctx: EngineContext,
}

impl ShiftReconciler {
    pub fn new(ctx: EngineContext) -> Self {
        ShiftReconciler { ctx }
    }

    /// Opens a shift for the session's user.
    ///
    /// ## Errors
    /// - `ShiftAlreadyActive` if the user already has one
    /// - `MustNotBeNegative` for a negative float
    pub async fn start(&self, session: &Session, starting_float: Money) -> EngineResult<Shift> {
        validate_amount_cents("starting float", starting_float.cents())?;
        let _locks = self.ctx.locks().lock_all([shift_key(&session.user_id)]).await;

        let store = self.ctx.store();
        if find_active(store, &session.user_id).await?.is_some() {
            return Err(CoreError::ShiftAlreadyActive(session.user_id.clone()).into());
        }

        let now = Utc::now();
        let shift = Shift::open(
            self.ctx.ids().uuid(),
            &session.user_id,
            &session.user_name,
            starting_float,
            now,
        );

        let mut batch = WriteBatch::new();
        batch.put(&shift)?;
        audit::record(
            &mut batch,
            session,
            AuditAction::ShiftStart,
            format!("Shift started with float {}", starting_float),
            now,
        )?;
        store.commit(batch).await?;

        info!(shift_id = %shift.id, user = %session.user_id, "Shift started");
        Ok(shift)
    }

    /// Reconciles and closes the user's active shift.
    pub async fn end(&self, session: &Session, actual_cash: Money) -> EngineResult<Shift> {
        validate_amount_cents("actual cash", actual_cash.cents())?;
        let _locks = self.ctx.locks().lock_all([shift_key(&session.user_id)]).await;

        let store = self.ctx.store();
        let shift = find_active(store, &session.user_id)
            .await?
            .ok_or_else(|| CoreError::NoActiveShift(session.user_id.clone()))?;

        let sales = self.shift_sales(&shift).await?;
        let summary = reconcile(&shift, &sales, actual_cash);
        let now = Utc::now();
        let closed = close(&shift, &summary, now);

        let mut batch = WriteBatch::new();
        batch.put(&closed)?;
        audit::record(
            &mut batch,
            session,
            AuditAction::ShiftEnd,
            format!(
                "Shift closed. Sales: {}, expected cash: {}, variance: {}",
                Money::from_cents(summary.total_sales_cents),
                Money::from_cents(summary.expected_cash_cents),
                Money::from_cents(summary.cash_variance_cents),
            ),
            now,
        )?;
        store.commit(batch).await?;

        info!(
            shift_id = %closed.id,
            sales = sales.len(),
            variance_cents = summary.cash_variance_cents,
            "Shift closed"
        );
        Ok(closed)
    }

    pub async fn has_active_shift(&self, user_id: &str) -> EngineResult<bool> {
        Ok(find_active(self.ctx.store(), user_id).await?.is_some())
    }

    pub async fn active_shift(&self, user_id: &str) -> EngineResult<Option<Shift>> {
        find_active(self.ctx.store(), user_id).await
    }

    /// Sales referenced by the shift, whether synced or still queued.
    ///
    /// Settling moves a sale from the queue into `sales` in one commit, so
    /// checking the queue first cannot miss it.
    async fn shift_sales(&self, shift: &Shift) -> EngineResult<Vec<Sale>> {
        let store = self.ctx.store();
        let mut sales = Vec::with_capacity(shift.sales_ids.len());

        for id in &shift.sales_ids {
            let sale = match store.get_in::<Sale>(Collection::OrderQueue, id).await? {
                Some(sale) => Some(sale),
                None => store.get_in::<Sale>(Collection::Sales, id).await?,
            };
            match sale {
                Some(sale) => sales.push(sale),
                None => warn!(
                    shift_id = %shift.id,
                    sale_id = %id,
                    "Shift references a missing sale"
                ),
            }
        }
        Ok(sales)
    }
}
