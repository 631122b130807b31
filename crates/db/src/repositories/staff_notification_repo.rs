//! Repository for the `staff_notifications` table.

use courtside_core::types::DbId;
use sqlx::PgConnection;

use crate::models::notification::{CreateStaffNotification, StaffNotification};

/// Column list for `staff_notifications` queries.
const COLUMNS: &str =
    "id, facility_id, notification_type, message, related_session_id, is_read, created_at";

/// Provides insert and read operations for the staff notification feed.
pub struct StaffNotificationRepo;

impl StaffNotificationRepo {
    /// Create a notification, returning the generated ID.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateStaffNotification,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO staff_notifications \
                (facility_id, notification_type, message, related_session_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(input.facility_id)
        .bind(&input.notification_type)
        .bind(&input.message)
        .bind(input.related_session_id)
        .fetch_one(conn)
        .await
    }

    /// Notifications of a facility, newest first.
    pub async fn list_for_facility(
        conn: &mut PgConnection,
        facility_id: DbId,
    ) -> Result<Vec<StaffNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM staff_notifications \
             WHERE facility_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, StaffNotification>(&query)
            .bind(facility_id)
            .fetch_all(conn)
            .await
    }
}
