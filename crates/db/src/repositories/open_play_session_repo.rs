//! Repository for the `open_play_sessions` table.

use courtside_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::open_play::OpenPlaySession;
use crate::models::status::OpenPlaySessionStatus;

/// Column list for `open_play_sessions` queries.
const COLUMNS: &str = "id, facility_id, open_play_rule_id, start_time, end_time, status_id, \
    current_court_count, auto_scale_override, cancelled_at, cancellation_reason, \
    created_at, updated_at";

/// Same columns, qualified for joins against `open_play_rules`.
const QUALIFIED_COLUMNS: &str = "s.id, s.facility_id, s.open_play_rule_id, s.start_time, \
    s.end_time, s.status_id, s.current_court_count, s.auto_scale_override, s.cancelled_at, \
    s.cancellation_reason, s.created_at, s.updated_at";

/// Provides the session reads and writes used by the capacity engine.
pub struct OpenPlaySessionRepo;

impl OpenPlaySessionRepo {
    /// Scheduled sessions of a facility whose cancellation cutoff has arrived.
    ///
    /// A session is due once `now >= start_time - cutoff` and stays due until
    /// it ends. Rows are locked for the rest of the transaction.
    pub async fn list_approaching_cutoff(
        conn: &mut PgConnection,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<OpenPlaySession>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM open_play_sessions s \
             JOIN open_play_rules r \
               ON r.id = s.open_play_rule_id AND r.facility_id = s.facility_id \
             WHERE s.facility_id = $1 \
               AND s.status_id = $2 \
               AND s.start_time - make_interval(mins => r.cancellation_cutoff_minutes) <= $3 \
               AND s.end_time > $3 \
             ORDER BY s.start_time, s.id \
             FOR UPDATE OF s"
        );
        sqlx::query_as::<_, OpenPlaySession>(&query)
            .bind(facility_id)
            .bind(OpenPlaySessionStatus::Scheduled.id())
            .bind(now)
            .fetch_all(conn)
            .await
    }

    /// Find a session by its ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<OpenPlaySession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM open_play_sessions WHERE id = $1");
        sqlx::query_as::<_, OpenPlaySession>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Mark a scheduled session cancelled and zero its court count.
    ///
    /// Returns `true` if a scheduled row was updated.
    pub async fn cancel(
        conn: &mut PgConnection,
        id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE open_play_sessions SET \
                status_id = $2, \
                cancelled_at = $3, \
                cancellation_reason = $4, \
                current_court_count = 0, \
                updated_at = NOW() \
             WHERE id = $1 AND status_id = $5",
        )
        .bind(id)
        .bind(OpenPlaySessionStatus::Cancelled.id())
        .bind(cancelled_at)
        .bind(reason)
        .bind(OpenPlaySessionStatus::Scheduled.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a session by its ID and lock it for the rest of the transaction.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<OpenPlaySession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM open_play_sessions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, OpenPlaySession>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Persist a new court count on a scheduled session.
    ///
    /// Returns `true` if a scheduled row was updated.
    pub async fn update_court_count(
        conn: &mut PgConnection,
        id: DbId,
        court_count: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE open_play_sessions SET current_court_count = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(court_count)
        .bind(OpenPlaySessionStatus::Scheduled.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
