//! # Duka Terminal Entry Point
//!
//! Runs the till process: opens the database, seeds the walk-in customer
//! and keeps the offline order queue draining in the background.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `duka.toml` (path from the first argument, else the platform
//!    config directory)
//! 3. Connect to the database & run migrations
//! 4. Make sure the walk-in customer exists
//! 5. Start the connectivity monitor and sync coordinator, if an endpoint
//!    is configured
//! 6. Run until Ctrl-C

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use duka_core::Shift;
use duka_db::{Database, StoreExt};
use duka_engine::{CatalogManager, EngineConfig, EngineContext};
use duka_sync::{ConnectivityMonitor, SyncConfig, SyncCoordinator, WsEndpoint};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let engine_config = EngineConfig::load(config_path.clone())?;
    let sync_config = SyncConfig::load(config_path)?;

    if let Some(dir) = engine_config.database.path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let db = Database::new(engine_config.db_config()).await?;
    let ctx = EngineContext::new(Arc::new(db.clone()), engine_config.settings.clone());

    if CatalogManager::new(ctx).ensure_walk_in_customer().await? {
        info!("Walk-in customer created");
    }

    let shifts: Vec<Shift> = db.get_all().await?;
    let active_shifts = shifts.iter().filter(|s| s.is_active()).count();
    let queued_sales = db.queued_count().await?;
    info!(active_shifts, queued_sales, "Till ready");

    let sync = if sync_config.is_enabled() {
        let monitor = ConnectivityMonitor::new(&sync_config)?.spawn();
        let endpoint = Arc::new(WsEndpoint::new(&sync_config)?);
        let store = Arc::new(db.clone());
        let coordinator = SyncCoordinator::new(store, endpoint.clone(), &sync_config)
            .spawn(monitor.subscribe());
        Some((monitor, coordinator, endpoint))
    } else {
        debug!("Sync coordinator not started");
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    if let Some((monitor, coordinator, endpoint)) = sync {
        coordinator.shutdown().await;
        monitor.shutdown().await;
        endpoint.close().await;
    }
    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=duka=trace` - Show trace for duka crates only
/// - Default: `info,duka=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,duka=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
