//! Backup export, restore and wipe, with an audit trail.
//!
//! These work on the SQLite [`Database`] directly rather than the
//! [`duka_db::Store`] contract, since they replace the whole store.

use chrono::Utc;
use tracing::info;

use duka_core::AuditAction;
use duka_db::{export_backup, restore_backup, wipe, Backup, Database, WriteBatch};

use crate::audit;
use crate::catalog::CatalogManager;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::locks::CATALOG_KEY;
use crate::session::Session;

#[derive(Clone)]
pub struct Maintenance {
    db: Database,
    ctx: EngineContext,
}

impl Maintenance {
    /// `ctx` must be built over the same `db`.
    pub fn new(db: Database, ctx: EngineContext) -> Self {
        Maintenance { db, ctx }
    }

    pub async fn export(&self) -> EngineResult<Backup> {
        Ok(export_backup(&self.db).await?)
    }

    /// Replaces the store with `backup`. An invalid backup leaves the
    /// store untouched.
    pub async fn restore(&self, session: &Session, backup: &Backup) -> EngineResult<usize> {
        let _locks = self.ctx.locks().lock_all([CATALOG_KEY.to_string()]).await;
        let restored = restore_backup(&self.db, backup).await?;

        let mut batch = WriteBatch::new();
        audit::record(
            &mut batch,
            session,
            AuditAction::RestoreBackup,
            format!(
                "Restored {} records from backup taken {}",
                restored,
                backup.exported_at.format("%Y-%m-%d %H:%M")
            ),
            Utc::now(),
        )?;
        self.ctx.store().commit(batch).await?;
        Ok(restored)
    }

    /// Deletes everything, then recreates the walk-in customer.
    pub async fn wipe(&self, session: &Session) -> EngineResult<u64> {
        let removed = {
            let _locks = self.ctx.locks().lock_all([CATALOG_KEY.to_string()]).await;
            wipe(&self.db).await?
        };
        CatalogManager::new(self.ctx.clone())
            .ensure_walk_in_customer()
            .await?;

        let mut batch = WriteBatch::new();
        audit::record(
            &mut batch,
            session,
            AuditAction::WipeData,
            format!("Wiped {} records", removed),
            Utc::now(),
        )?;
        self.ctx.store().commit(batch).await?;

        info!(removed = removed, user = %session.user_id, "Local data wiped");
        Ok(removed)
    }
}
