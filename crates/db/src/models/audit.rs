//! Open play audit log models.
//!
//! Audit rows are immutable once created (no `updated_at`).

use courtside_core::audit::CapacitySnapshot;
use courtside_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `open_play_audit_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenPlayAuditLog {
    pub id: DbId,
    pub session_id: DbId,
    pub action: String,
    pub before_state: serde_json::Value,
    pub after_state: serde_json::Value,
    pub reason: String,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOpenPlayAuditLog {
    pub session_id: DbId,
    pub action: String,
    pub before_state: CapacitySnapshot,
    pub after_state: CapacitySnapshot,
    pub reason: String,
}
