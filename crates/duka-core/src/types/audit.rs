use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Kinds of state-mutating operations recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    SaleComplete,
    ShiftStart,
    ShiftEnd,
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    AddCustomer,
    DeleteCustomer,
    AddSupplier,
    AddQuotation,
    AddPo,
    SendPo,
    UpdatePo,
    CancelPo,
    ReceivePo,
    RecordSupplierPayment,
    RestoreBackup,
    WipeData,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditLog {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub action: AuditAction,
    pub details: String,
}
