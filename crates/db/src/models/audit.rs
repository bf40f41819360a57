//! Audit log entry model and DTOs.

use sqlx::FromRow;
use warden_core::types::{DbId, Timestamp};

/// An audit trail row from the `audit_logs` table. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntry {
    pub id: DbId,
    /// The acting user, if known. Nulled if the user row is later deleted.
    pub user_id: Option<DbId>,
    /// Event name, one of the `warden_core::events` constants.
    pub event: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug)]
pub struct CreateAuditEntry {
    pub user_id: Option<DbId>,
    pub event: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}
