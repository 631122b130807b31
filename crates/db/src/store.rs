//! Capacity store: the read/write surface the open play capacity engine
//! composes.
//!
//! The engine depends on the [`CapacityStore`] / [`CapacityTx`] traits
//! rather than on a pool, so its decisions can be exercised against an
//! in-memory store. [`PgCapacityStore`] is the production implementation and
//! delegates every primitive to the repository layer inside one sqlx
//! transaction.
//!
//! A [`CapacityTx`] dropped without [`CapacityTx::commit`] rolls back.

use async_trait::async_trait;
use courtside_core::types::{DbId, Timestamp};
use sqlx::{Postgres, Transaction};

use crate::models::audit::CreateOpenPlayAuditLog;
use crate::models::notification::CreateStaffNotification;
use crate::models::open_play::{OpenPlayRule, OpenPlaySession};
use crate::models::reservation::{Court, Reservation, ReservationCourt};
use crate::repositories::{
    CourtRepo, OpenPlayAuditRepo, OpenPlayRuleRepo, OpenPlaySessionRepo, ReservationCourtRepo,
    ReservationRepo, StaffNotificationRepo,
};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Entry point to the capacity store: opens transaction scopes.
#[async_trait]
pub trait CapacityStore: Send + Sync {
    type Tx: CapacityTx + 'static;

    /// Facilities that own at least one open play rule.
    async fn list_facility_ids(&self) -> Result<Vec<DbId>, sqlx::Error>;

    /// Open a transaction scope.
    async fn begin(&self) -> Result<Self::Tx, sqlx::Error>;
}

/// Reads and writes executed inside one transaction.
#[async_trait]
pub trait CapacityTx: Send {
    /// Scheduled sessions of `facility_id` whose cutoff has arrived at `now`,
    /// in evaluation order.
    async fn list_sessions_approaching_cutoff(
        &mut self,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<OpenPlaySession>, sqlx::Error>;

    /// Re-read one session, locking it for the rest of the transaction.
    async fn find_session(
        &mut self,
        session_id: DbId,
    ) -> Result<Option<OpenPlaySession>, sqlx::Error>;

    async fn find_rule(
        &mut self,
        rule_id: DbId,
        facility_id: DbId,
    ) -> Result<Option<OpenPlayRule>, sqlx::Error>;

    /// Reservations matching a session's facility, rule and window, oldest
    /// first. At most two are returned.
    async fn find_reservations(
        &mut self,
        facility_id: DbId,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error>;

    /// Distinct participants on the reservation, primary booker included.
    async fn count_signups(&mut self, reservation_id: DbId) -> Result<i64, sqlx::Error>;

    async fn list_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<Vec<ReservationCourt>, sqlx::Error>;

    /// Courts free for the window, excluding those held by `reservation_id`.
    async fn list_available_courts(
        &mut self,
        facility_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        reservation_id: DbId,
    ) -> Result<Vec<Court>, sqlx::Error>;

    async fn add_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error>;

    async fn remove_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error>;

    /// Returns the number of assignments removed.
    async fn remove_all_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<u64, sqlx::Error>;

    async fn cancel_reservation(
        &mut self,
        reservation_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<(), sqlx::Error>;

    /// Set status cancelled, `cancelled_at`, the reason and a zero court count.
    ///
    /// Returns `false` if the session was no longer scheduled.
    async fn cancel_session(
        &mut self,
        session_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<bool, sqlx::Error>;

    /// Returns `false` if the session was no longer scheduled.
    async fn update_session_court_count(
        &mut self,
        session_id: DbId,
        court_count: i32,
    ) -> Result<bool, sqlx::Error>;

    async fn insert_audit_entry(
        &mut self,
        entry: &CreateOpenPlayAuditLog,
    ) -> Result<(), sqlx::Error>;

    async fn insert_staff_notification(
        &mut self,
        notification: &CreateStaffNotification,
    ) -> Result<(), sqlx::Error>;

    async fn commit(self) -> Result<(), sqlx::Error>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// [`CapacityStore`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgCapacityStore {
    pool: DbPool,
}

impl PgCapacityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapacityStore for PgCapacityStore {
    type Tx = PgCapacityTx;

    async fn list_facility_ids(&self) -> Result<Vec<DbId>, sqlx::Error> {
        OpenPlayRuleRepo::list_facility_ids(&self.pool).await
    }

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        Ok(PgCapacityTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// A Postgres transaction. Rolls back on drop unless committed.
pub struct PgCapacityTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CapacityTx for PgCapacityTx {
    async fn list_sessions_approaching_cutoff(
        &mut self,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<OpenPlaySession>, sqlx::Error> {
        OpenPlaySessionRepo::list_approaching_cutoff(&mut *self.tx, facility_id, now).await
    }

    async fn find_session(
        &mut self,
        session_id: DbId,
    ) -> Result<Option<OpenPlaySession>, sqlx::Error> {
        OpenPlaySessionRepo::find_by_id_for_update(&mut *self.tx, session_id).await
    }

    async fn find_rule(
        &mut self,
        rule_id: DbId,
        facility_id: DbId,
    ) -> Result<Option<OpenPlayRule>, sqlx::Error> {
        OpenPlayRuleRepo::find_for_facility(&mut *self.tx, rule_id, facility_id).await
    }

    async fn find_reservations(
        &mut self,
        facility_id: DbId,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        ReservationRepo::list_for_session(&mut *self.tx, facility_id, rule_id, start_time, end_time)
            .await
    }

    async fn count_signups(&mut self, reservation_id: DbId) -> Result<i64, sqlx::Error> {
        ReservationRepo::count_signups(&mut *self.tx, reservation_id).await
    }

    async fn list_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<Vec<ReservationCourt>, sqlx::Error> {
        ReservationCourtRepo::list_for_reservation(&mut *self.tx, reservation_id).await
    }

    async fn list_available_courts(
        &mut self,
        facility_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        reservation_id: DbId,
    ) -> Result<Vec<Court>, sqlx::Error> {
        CourtRepo::list_available(&mut *self.tx, facility_id, start_time, end_time, reservation_id)
            .await
    }

    async fn add_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error> {
        ReservationCourtRepo::add(&mut *self.tx, reservation_id, court_id).await?;
        Ok(())
    }

    async fn remove_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error> {
        if !ReservationCourtRepo::remove(&mut *self.tx, reservation_id, court_id).await? {
            tracing::warn!(reservation_id, court_id, "Court assignment already released");
        }
        Ok(())
    }

    async fn remove_all_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        ReservationCourtRepo::remove_all(&mut *self.tx, reservation_id).await
    }

    async fn cancel_reservation(
        &mut self,
        reservation_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        ReservationRepo::cancel(&mut *self.tx, reservation_id, cancelled_at, reason).await?;
        Ok(())
    }

    async fn cancel_session(
        &mut self,
        session_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        OpenPlaySessionRepo::cancel(&mut *self.tx, session_id, cancelled_at, reason).await
    }

    async fn update_session_court_count(
        &mut self,
        session_id: DbId,
        court_count: i32,
    ) -> Result<bool, sqlx::Error> {
        OpenPlaySessionRepo::update_court_count(&mut *self.tx, session_id, court_count).await
    }

    async fn insert_audit_entry(
        &mut self,
        entry: &CreateOpenPlayAuditLog,
    ) -> Result<(), sqlx::Error> {
        OpenPlayAuditRepo::insert(&mut *self.tx, entry).await?;
        Ok(())
    }

    async fn insert_staff_notification(
        &mut self,
        notification: &CreateStaffNotification,
    ) -> Result<(), sqlx::Error> {
        StaffNotificationRepo::create(&mut *self.tx, notification).await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}
