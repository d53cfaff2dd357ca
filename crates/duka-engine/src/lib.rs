//! # duka-engine: Transactional Engines for Duka POS
//!
//! Each engine turns one cashier or back-office action into a single
//! atomic [`duka_db::WriteBatch`]: either every record the action touches
//! is written together with its audit entry, or nothing is.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             EngineContext                               │
//! │     Arc<dyn Store>   Arc<Settings>   AggregateLocks   IdGenerator       │
//! │            │                                                            │
//! │   ┌────────┼───────────┬──────────────────┬───────────────┐             │
//! │   ▼        ▼           ▼                  ▼               ▼             │
//! │ Transaction  ShiftReconciler  PurchaseReceivingEngine  CatalogManager   │
//! │ Engine                                                  Maintenance     │
//! │   │                                                                     │
//! │   ├── online  ──► sales                                                 │
//! │   └── offline ──► order_queue ──► duka-sync pushes later                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Operations lock the aggregates they mutate (shift, customer, products,
//! purchase order, invoice) in sorted key order before reading, so two
//! tills sharing one context never oversell stock or double-spend points.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use duka_core::{Cart, Money, Payment, PaymentMethod, Settings};
//! use duka_db::{Database, DbConfig};
//! use duka_engine::{Checkout, Connectivity, EngineContext, Session};
//! use duka_engine::{ShiftReconciler, TransactionEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::in_memory()).await?;
//! let ctx = EngineContext::new(Arc::new(db), Settings::default());
//! let session = Session::new("u1", "Amina");
//!
//! ShiftReconciler::new(ctx.clone()).start(&session, Money::from_cents(500_000)).await?;
//!
//! let mut cart = Cart::new();
//! let cash = Payment::new(PaymentMethod::Cash, Money::from_cents(10_000));
//! let checkout = Checkout::new(vec![cash]);
//! let sale = TransactionEngine::new(ctx)
//!     .complete_sale(&session, &mut cart, checkout, Connectivity::Online)
//!     .await;
//! # let _ = sale;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod locks;
pub mod maintenance;
pub mod purchasing;
pub mod sale;
pub mod session;
pub mod shift;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{CatalogManager, NewCustomer, NewProduct, NewSupplier};
pub use config::{DatabaseSection, EngineConfig, CONFIG_FILE_NAME};
pub use context::EngineContext;
pub use error::{EngineError, EngineResult};
pub use maintenance::Maintenance;
pub use purchasing::{NewPurchaseOrder, OrderLineRequest, PurchaseReceivingEngine, ReceiveResult};
pub use sale::{Checkout, TransactionEngine};
pub use session::{Connectivity, Session};
pub use shift::ShiftReconciler;
