//! Repository for the `courts` table.

use courtside_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::reservation::Court;
use crate::models::status::ReservationStatus;

/// Court availability queries.
pub struct CourtRepo;

impl CourtRepo {
    /// Active courts of a facility that are free for `[start_time, end_time)`.
    ///
    /// A court is taken if any non-cancelled reservation overlapping the
    /// window holds it. Courts already assigned to `reservation_id` are
    /// excluded. Ordered by court number.
    pub async fn list_available(
        conn: &mut PgConnection,
        facility_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        reservation_id: DbId,
    ) -> Result<Vec<Court>, sqlx::Error> {
        sqlx::query_as::<_, Court>(
            "SELECT c.id, c.facility_id, c.court_number, c.name, c.is_active \
             FROM courts c \
             WHERE c.facility_id = $1 \
               AND c.is_active = true \
               AND NOT EXISTS ( \
                   SELECT 1 FROM reservation_courts rc \
                   JOIN reservations r ON r.id = rc.reservation_id \
                   WHERE rc.court_id = c.id \
                     AND r.status_id <> $5 \
                     AND r.start_time < $3 \
                     AND r.end_time > $2 \
               ) \
               AND NOT EXISTS ( \
                   SELECT 1 FROM reservation_courts own \
                   WHERE own.court_id = c.id AND own.reservation_id = $4 \
               ) \
             ORDER BY c.court_number",
        )
        .bind(facility_id)
        .bind(start_time)
        .bind(end_time)
        .bind(reservation_id)
        .bind(ReservationStatus::Cancelled.id())
        .fetch_all(conn)
        .await
    }
}
