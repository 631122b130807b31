//! Reservation, court and court-assignment models.

use courtside_core::types::{DbId, StatusId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `reservations` table.
///
/// Open play sessions are backed by exactly one reservation matched on
/// `(facility_id, open_play_rule_id, start_time, end_time)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub facility_id: DbId,
    pub open_play_rule_id: Option<DbId>,
    pub primary_user_id: Option<DbId>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status_id: StatusId,
    pub cancelled_at: Option<Timestamp>,
    pub cancellation_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `courts` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Court {
    pub id: DbId,
    pub facility_id: DbId,
    pub court_number: i32,
    pub name: String,
    pub is_active: bool,
}

/// A court assigned to a reservation (`reservation_courts` joined with `courts`).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ReservationCourt {
    pub id: DbId,
    pub reservation_id: DbId,
    pub court_id: DbId,
    pub court_number: i32,
}
