//! Staff notification models.

use courtside_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `staff_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StaffNotification {
    pub id: DbId,
    pub facility_id: DbId,
    pub notification_type: String,
    pub message: String,
    pub related_session_id: Option<DbId>,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a staff notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStaffNotification {
    pub facility_id: DbId,
    pub notification_type: String,
    pub message: String,
    pub related_session_id: Option<DbId>,
}
