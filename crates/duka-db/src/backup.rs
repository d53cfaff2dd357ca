//! # Backup, Restore, Wipe
//!
//! Whole-store export as one JSON document, validated restore, and wipe.
//!
//! ## Restore
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backup JSON                                                            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  validate EVERYTHING first                                              │
//! │     ├── format_version == 1                                             │
//! │     ├── "products" and "customers" present                              │
//! │     ├── every collection name known                                     │
//! │     └── every record decodes into its entity type, ids unique, non-empty│
//! │     │                                                                   │
//! │     ▼  (any failure: InvalidBackup, store untouched)                    │
//! │  one transaction: clear records + queue, insert all                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use duka_core::{
    AuditLog, Customer, Product, PurchaseOrder, Quotation, Sale, Shift, Supplier,
    SupplierInvoice, SupplierPayment,
};

use crate::collection::{Collection, Record};
use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{queue, records};
use crate::store::Store;

/// Current backup document version.
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Collections a backup must carry to be restorable.
pub const REQUIRED_COLLECTIONS: [Collection; 2] = [Collection::Products, Collection::Customers];

/// A full export of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    /// Collection name → records, oldest first.
    pub collections: BTreeMap<String, Vec<serde_json::Value>>,
}

impl Backup {
    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

/// Snapshot of every collection, including queued offline sales.
pub async fn export_backup(db: &Database) -> DbResult<Backup> {
    let mut collections = BTreeMap::new();

    for collection in Collection::ALL {
        let values = db
            .fetch_all(collection)
            .await?
            .iter()
            .map(|payload| serde_json::from_str(payload))
            .collect::<Result<Vec<serde_json::Value>, _>>()?;
        collections.insert(collection.as_str().to_string(), values);
    }

    let backup = Backup {
        format_version: BACKUP_FORMAT_VERSION,
        exported_at: Utc::now(),
        collections,
    };
    info!(records = backup.record_count(), "Exported backup");
    Ok(backup)
}

/// Replaces the whole store with the backup contents.
///
/// ## Returns
/// * `Ok(n)` - Number of records written
/// * `Err(DbError::InvalidBackup)` - Nothing was written
pub async fn restore_backup(db: &Database, backup: &Backup) -> DbResult<usize> {
    let rows = validate(backup).inspect_err(|e| warn!(error = %e, "Rejected backup"))?;

    let now = Utc::now();
    let mut tx = db.pool().begin().await?;
    records::clear(&mut *tx).await?;
    queue::clear(&mut *tx).await?;

    for (collection, id, payload) in &rows {
        match collection {
            Collection::OrderQueue => queue::enqueue(&mut *tx, id, payload, now).await?,
            _ => records::upsert(&mut *tx, *collection, id, payload, now).await?,
        }
    }
    tx.commit().await?;

    info!(records = rows.len(), "Restored backup");
    Ok(rows.len())
}

/// Deletes every record and every queued sale.
pub async fn wipe(db: &Database) -> DbResult<u64> {
    let mut tx = db.pool().begin().await?;
    let removed = records::clear(&mut *tx).await? + queue::clear(&mut *tx).await?;
    tx.commit().await?;

    warn!(removed = removed, "Wiped local store");
    Ok(removed)
}

// =============================================================================
// Validation
// =============================================================================

type Row = (Collection, String, String);

fn validate(backup: &Backup) -> DbResult<Vec<Row>> {
    if backup.format_version != BACKUP_FORMAT_VERSION {
        return Err(DbError::invalid_backup(format!(
            "unsupported format version {}",
            backup.format_version
        )));
    }

    for required in REQUIRED_COLLECTIONS {
        if !backup.collections.contains_key(required.as_str()) {
            return Err(DbError::invalid_backup(format!(
                "missing required collection '{}'",
                required
            )));
        }
    }

    let mut rows = Vec::with_capacity(backup.record_count());
    for (name, values) in &backup.collections {
        let collection: Collection = name
            .parse()
            .map_err(|_| DbError::invalid_backup(format!("unknown collection '{}'", name)))?;

        let decoded = match collection {
            Collection::Products => decode::<Product>(collection, values)?,
            Collection::Customers => decode::<Customer>(collection, values)?,
            Collection::Suppliers => decode::<Supplier>(collection, values)?,
            Collection::Sales | Collection::OrderQueue => decode::<Sale>(collection, values)?,
            Collection::Shifts => decode::<Shift>(collection, values)?,
            Collection::PurchaseOrders => decode::<PurchaseOrder>(collection, values)?,
            Collection::SupplierInvoices => decode::<SupplierInvoice>(collection, values)?,
            Collection::SupplierPayments => decode::<SupplierPayment>(collection, values)?,
            Collection::AuditLogs => decode::<AuditLog>(collection, values)?,
            Collection::Quotations => decode::<Quotation>(collection, values)?,
        };
        rows.extend(decoded);
    }
    Ok(rows)
}

/// Decodes every value as `R`, re-encoding it so unknown fields are dropped.
fn decode<R: Record>(collection: Collection, values: &[serde_json::Value]) -> DbResult<Vec<Row>> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let record: R = serde_json::from_value(value.clone()).map_err(|e| {
            DbError::invalid_backup(format!("{}[{}]: {}", collection, index, e))
        })?;

        let id = record.id().to_string();
        if id.trim().is_empty() {
            return Err(DbError::invalid_backup(format!(
                "{}[{}]: empty id",
                collection, index
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(DbError::invalid_backup(format!(
                "{}: duplicate id '{}'",
                collection, id
            )));
        }

        let payload = serde_json::to_string(&record)?;
        rows.push((collection, id, payload));
    }
    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::store::StoreExt;
    use serde_json::json;

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.put(&Customer::walk_in(Utc::now())).await.unwrap();
        db.put(&Supplier {
            id: "sup1".to_string(),
            name: "Bidco Africa".to_string(),
            contact: "0722000000".to_string(),
            email: None,
            credit_terms: "Net 30".to_string(),
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_export_then_restore_into_fresh_store() {
        let source = seeded().await;
        let backup = export_backup(&source).await.unwrap();
        assert_eq!(backup.collections.len(), Collection::ALL.len());
        assert_eq!(backup.record_count(), 2);

        let target = Database::new(DbConfig::in_memory()).await.unwrap();
        let written = restore_backup(&target, &backup).await.unwrap();
        assert_eq!(written, 2);

        let suppliers: Vec<Supplier> = target.get_all().await.unwrap();
        assert_eq!(suppliers[0].name, "Bidco Africa");
    }

    #[tokio::test]
    async fn test_restore_replaces_existing_data() {
        let db = seeded().await;
        let mut backup = export_backup(&db).await.unwrap();
        backup.collections.insert("suppliers".to_string(), vec![]);

        restore_backup(&db, &backup).await.unwrap();
        let suppliers: Vec<Supplier> = db.get_all().await.unwrap();
        assert!(suppliers.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_backup_leaves_store_untouched() {
        let db = seeded().await;
        let mut backup = export_backup(&db).await.unwrap();
        backup
            .collections
            .insert("suppliers".to_string(), vec![json!({ "id": "x" })]);

        let err = restore_backup(&db, &backup).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidBackup(_)));

        let suppliers: Vec<Supplier> = db.get_all().await.unwrap();
        assert_eq!(suppliers.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_missing_required_and_unknown_collections() {
        let db = seeded().await;
        let good = export_backup(&db).await.unwrap();

        let mut missing = good.clone();
        missing.collections.remove("products");
        assert!(matches!(
            restore_backup(&db, &missing).await,
            Err(DbError::InvalidBackup(_))
        ));

        let mut unknown = good.clone();
        unknown.collections.insert("users".to_string(), vec![]);
        assert!(matches!(
            restore_backup(&db, &unknown).await,
            Err(DbError::InvalidBackup(_))
        ));

        let mut old = good;
        old.format_version = 0;
        assert!(matches!(
            restore_backup(&db, &old).await,
            Err(DbError::InvalidBackup(_))
        ));
    }

    #[tokio::test]
    async fn test_wipe_clears_everything() {
        let db = seeded().await;
        assert_eq!(wipe(&db).await.unwrap(), 2);

        let customers: Vec<Customer> = db.get_all().await.unwrap();
        assert!(customers.is_empty());
    }
}
