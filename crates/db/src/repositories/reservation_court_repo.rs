//! Repository for the `reservation_courts` table.

use courtside_core::types::DbId;
use sqlx::PgConnection;

use crate::models::reservation::ReservationCourt;

/// Court assignments of a reservation.
pub struct ReservationCourtRepo;

impl ReservationCourtRepo {
    /// List assignments in assignment order (oldest first).
    pub async fn list_for_reservation(
        conn: &mut PgConnection,
        reservation_id: DbId,
    ) -> Result<Vec<ReservationCourt>, sqlx::Error> {
        sqlx::query_as::<_, ReservationCourt>(
            "SELECT rc.id, rc.reservation_id, rc.court_id, c.court_number \
             FROM reservation_courts rc \
             JOIN courts c ON c.id = rc.court_id \
             WHERE rc.reservation_id = $1 \
             ORDER BY rc.id",
        )
        .bind(reservation_id)
        .fetch_all(conn)
        .await
    }

    /// Assign a court to a reservation, returning the assignment ID.
    pub async fn add(
        conn: &mut PgConnection,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO reservation_courts (reservation_id, court_id) \
             VALUES ($1, $2) \
             RETURNING id",
        )
        .bind(reservation_id)
        .bind(court_id)
        .fetch_one(conn)
        .await
    }

    /// Release one court. Returns `true` if an assignment was removed.
    pub async fn remove(
        conn: &mut PgConnection,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM reservation_courts WHERE reservation_id = $1 AND court_id = $2",
        )
        .bind(reservation_id)
        .bind(court_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release every court of a reservation. Returns the number removed.
    pub async fn remove_all(
        conn: &mut PgConnection,
        reservation_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservation_courts WHERE reservation_id = $1")
            .bind(reservation_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
