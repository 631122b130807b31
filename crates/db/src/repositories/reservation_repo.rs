//! Repository for the `reservations` and `reservation_participants` tables.

use courtside_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::reservation::Reservation;
use crate::models::status::ReservationStatus;

/// Column list for `reservations` queries.
const COLUMNS: &str = "id, facility_id, open_play_rule_id, primary_user_id, start_time, \
    end_time, status_id, cancelled_at, cancellation_reason, created_at, updated_at";

/// Provides the reservation reads and writes used by the capacity engine.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Reservations backing an open play session, oldest first.
    ///
    /// At most two rows are returned: enough to tell a unique match from a
    /// duplicate.
    pub async fn list_for_session(
        conn: &mut PgConnection,
        facility_id: DbId,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE facility_id = $1 AND open_play_rule_id = $2 \
               AND start_time = $3 AND end_time = $4 \
             ORDER BY id \
             LIMIT 2"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(facility_id)
            .bind(rule_id)
            .bind(start_time)
            .bind(end_time)
            .fetch_all(conn)
            .await
    }

    /// Number of distinct signups: the primary booker plus every participant,
    /// each user counted once.
    pub async fn count_signups(
        conn: &mut PgConnection,
        reservation_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT user_id) FROM ( \
                SELECT primary_user_id AS user_id FROM reservations \
                 WHERE id = $1 AND primary_user_id IS NOT NULL \
                UNION ALL \
                SELECT user_id FROM reservation_participants WHERE reservation_id = $1 \
             ) signups",
        )
        .bind(reservation_id)
        .fetch_one(conn)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark a reservation cancelled. Returns `true` if the row was updated.
    pub async fn cancel(
        conn: &mut PgConnection,
        id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reservations SET \
                status_id = $2, cancelled_at = $3, cancellation_reason = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ReservationStatus::Cancelled.id())
        .bind(cancelled_at)
        .bind(reason)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
