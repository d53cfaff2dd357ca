//! Audit entries appended to the same batch as the change they describe.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use duka_core::{AuditAction, AuditLog};
use duka_db::{DbResult, WriteBatch};

use crate::session::Session;

pub fn entry(
    session: &Session,
    action: AuditAction,
    details: impl Into<String>,
    now: DateTime<Utc>,
) -> AuditLog {
    AuditLog {
        id: Uuid::new_v4().to_string(),
        timestamp: now,
        user_id: session.user_id.clone(),
        user_name: session.user_name.clone(),
        action,
        details: details.into(),
    }
}

/// Adds an audit entry to `batch`.
pub fn record(
    batch: &mut WriteBatch,
    session: &Session,
    action: AuditAction,
    details: impl Into<String>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    batch.put(&entry(session, action, details, now))
}
