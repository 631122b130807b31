//! Repository for the `open_play_audit_logs` table.

use courtside_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgConnection;

use crate::models::audit::{CreateOpenPlayAuditLog, OpenPlayAuditLog};

/// Column list for `open_play_audit_logs` SELECT queries.
const COLUMNS: &str = "id, session_id, action, before_state, after_state, reason, created_at";

/// Append and read open play audit entries. There is no update or delete.
pub struct OpenPlayAuditRepo;

impl OpenPlayAuditRepo {
    /// Append one entry, returning its ID.
    pub async fn insert(
        conn: &mut PgConnection,
        entry: &CreateOpenPlayAuditLog,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO open_play_audit_logs \
                (session_id, action, before_state, after_state, reason) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(entry.session_id)
        .bind(&entry.action)
        .bind(Json(&entry.before_state))
        .bind(Json(&entry.after_state))
        .bind(&entry.reason)
        .fetch_one(conn)
        .await
    }

    /// All entries for a session, oldest first.
    pub async fn list_for_session(
        conn: &mut PgConnection,
        session_id: DbId,
    ) -> Result<Vec<OpenPlayAuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM open_play_audit_logs WHERE session_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, OpenPlayAuditLog>(&query)
            .bind(session_id)
            .fetch_all(conn)
            .await
    }
}
