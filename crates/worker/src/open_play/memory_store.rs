//! In-memory [`CapacityStore`] for tests.
//!
//! `begin` copies the committed state into the transaction; `commit` swaps
//! the working copy back in. Dropping a transaction discards its writes, so
//! rollback behaves like the Postgres store.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use courtside_core::types::{DbId, Timestamp};
use courtside_db::models::audit::CreateOpenPlayAuditLog;
use courtside_db::models::notification::CreateStaffNotification;
use courtside_db::models::open_play::{OpenPlayRule, OpenPlaySession};
use courtside_db::models::reservation::{Court, Reservation, ReservationCourt};
use courtside_db::models::status::{OpenPlaySessionStatus, ReservationStatus};
use courtside_db::{CapacityStore, CapacityTx};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub rules: Vec<OpenPlayRule>,
    pub sessions: Vec<OpenPlaySession>,
    pub reservations: Vec<Reservation>,
    pub courts: Vec<Court>,
    pub assignments: Vec<ReservationCourt>,
    /// `(reservation_id, user_id)` pairs.
    pub participants: Vec<(DbId, DbId)>,
    pub audit_log: Vec<CreateOpenPlayAuditLog>,
    pub notifications: Vec<CreateStaffNotification>,
    /// Number of write operations committed.
    pub writes: usize,
    next_id: DbId,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_court(&mut self, facility_id: DbId, court_number: i32) -> DbId {
        let id = self.next_id();
        self.courts.push(Court {
            id,
            facility_id,
            court_number,
            name: format!("Court {court_number}"),
            is_active: true,
        });
        id
    }

    pub fn add_rule(&mut self, mut rule: OpenPlayRule) -> DbId {
        let id = self.next_id();
        rule.id = id;
        self.rules.push(rule);
        id
    }

    /// Add a scheduled session without a backing reservation.
    pub fn add_session(
        &mut self,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> DbId {
        let facility_id = self
            .rules
            .iter()
            .find(|r| r.id == rule_id)
            .map(|r| r.facility_id)
            .unwrap_or_default();
        let id = self.next_id();
        let now = Utc::now();
        self.sessions.push(OpenPlaySession {
            id,
            facility_id,
            open_play_rule_id: rule_id,
            start_time,
            end_time,
            status_id: OpenPlaySessionStatus::Scheduled.id(),
            current_court_count: 0,
            auto_scale_override: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Add a scheduled session backed by a reservation holding `courts` (in
    /// assignment order) with `signups` distinct participants.
    ///
    /// Returns `(session_id, reservation_id)`.
    pub fn add_session_with_reservation(
        &mut self,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        signups: usize,
        courts: &[DbId],
    ) -> (DbId, DbId) {
        let session_id = self.add_session(rule_id, start_time, end_time);
        let facility_id = self.session(session_id).facility_id;
        let reservation_id = self.next_id();
        let now = Utc::now();
        self.reservations.push(Reservation {
            id: reservation_id,
            facility_id,
            open_play_rule_id: Some(rule_id),
            primary_user_id: (signups > 0).then_some(1_000),
            start_time,
            end_time,
            status_id: ReservationStatus::Confirmed.id(),
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        });
        for user in 1..signups {
            self.participants.push((reservation_id, 1_000 + user as DbId));
        }
        for &court_id in courts {
            self.assign(reservation_id, court_id);
        }
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            session.current_court_count = courts.len() as i32;
        }
        (session_id, reservation_id)
    }

    pub fn session(&self, id: DbId) -> &OpenPlaySession {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .expect("session exists")
    }

    pub fn session_mut(&mut self, id: DbId) -> &mut OpenPlaySession {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .expect("session exists")
    }

    pub fn rule(&self, id: DbId) -> &OpenPlayRule {
        self.rules.iter().find(|r| r.id == id).expect("rule exists")
    }

    pub fn reservation(&self, id: DbId) -> &Reservation {
        self.reservations
            .iter()
            .find(|r| r.id == id)
            .expect("reservation exists")
    }

    /// Court IDs held by a reservation, in assignment order.
    pub fn courts_of(&self, reservation_id: DbId) -> Vec<DbId> {
        self.assignments
            .iter()
            .filter(|a| a.reservation_id == reservation_id)
            .map(|a| a.court_id)
            .collect()
    }

    pub fn audit_for(&self, session_id: DbId) -> Vec<&CreateOpenPlayAuditLog> {
        self.audit_log
            .iter()
            .filter(|e| e.session_id == session_id)
            .collect()
    }

    pub fn notifications_for(&self, session_id: DbId) -> Vec<&CreateStaffNotification> {
        self.notifications
            .iter()
            .filter(|n| n.related_session_id == Some(session_id))
            .collect()
    }

    fn scheduled_session_mut(&mut self, id: DbId) -> Option<&mut OpenPlaySession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id && s.status_id == OpenPlaySessionStatus::Scheduled.id())
    }

    fn assign(&mut self, reservation_id: DbId, court_id: DbId) {
        let id = self.next_id();
        let court_number = self
            .courts
            .iter()
            .find(|c| c.id == court_id)
            .map(|c| c.court_number)
            .unwrap_or_default();
        self.assignments.push(ReservationCourt {
            id,
            reservation_id,
            court_id,
            court_number,
        });
    }
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail `insert_audit_entry` for this session.
    pub fail_audit_for_session: Option<DbId>,
    /// Sleep before listing sessions.
    pub list_delay: Option<Duration>,
    /// Fail `list_facility_ids`.
    pub fail_facility_listing: bool,
}

fn injected(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure: {what}"))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryCapacityStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryCapacityStore {
    pub fn new(state: MemoryState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            faults: Arc::default(),
        }
    }

    /// Committed state.
    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock")
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock().expect("memory store lock") = faults;
    }
}

#[async_trait]
impl CapacityStore for MemoryCapacityStore {
    type Tx = MemoryTx;

    async fn list_facility_ids(&self) -> Result<Vec<DbId>, sqlx::Error> {
        if self.faults.lock().expect("memory store lock").fail_facility_listing {
            return Err(injected("list_facility_ids"));
        }
        let ids: BTreeSet<DbId> = self.state().rules.iter().map(|r| r.facility_id).collect();
        Ok(ids.into_iter().collect())
    }

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        Ok(MemoryTx {
            working: self.state().clone(),
            faults: self.faults.lock().expect("memory store lock").clone(),
            shared: Arc::clone(&self.state),
        })
    }
}

pub struct MemoryTx {
    working: MemoryState,
    faults: Faults,
    shared: Arc<Mutex<MemoryState>>,
}

fn overlaps(a_start: Timestamp, a_end: Timestamp, b_start: Timestamp, b_end: Timestamp) -> bool {
    a_start < b_end && b_start < a_end
}

#[async_trait]
impl CapacityTx for MemoryTx {
    async fn list_sessions_approaching_cutoff(
        &mut self,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<OpenPlaySession>, sqlx::Error> {
        if let Some(delay) = self.faults.list_delay {
            tokio::time::sleep(delay).await;
        }
        let state = &self.working;
        let mut due: Vec<OpenPlaySession> = state
            .sessions
            .iter()
            .filter(|s| {
                s.facility_id == facility_id
                    && s.status_id == OpenPlaySessionStatus::Scheduled.id()
                    && s.end_time > now
            })
            .filter(|s| {
                state
                    .rules
                    .iter()
                    .find(|r| r.id == s.open_play_rule_id && r.facility_id == s.facility_id)
                    .is_some_and(|r| {
                        let cutoff = chrono::Duration::minutes(i64::from(
                            r.cancellation_cutoff_minutes,
                        ));
                        s.start_time - cutoff <= now
                    })
            })
            .cloned()
            .collect();
        due.sort_by_key(|s| (s.start_time, s.id));
        Ok(due)
    }

    async fn find_session(
        &mut self,
        session_id: DbId,
    ) -> Result<Option<OpenPlaySession>, sqlx::Error> {
        Ok(self
            .working
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn find_rule(
        &mut self,
        rule_id: DbId,
        facility_id: DbId,
    ) -> Result<Option<OpenPlayRule>, sqlx::Error> {
        Ok(self
            .working
            .rules
            .iter()
            .find(|r| r.id == rule_id && r.facility_id == facility_id)
            .cloned())
    }

    async fn find_reservations(
        &mut self,
        facility_id: DbId,
        rule_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let mut matching: Vec<Reservation> = self
            .working
            .reservations
            .iter()
            .filter(|r| {
                r.facility_id == facility_id
                    && r.open_play_rule_id == Some(rule_id)
                    && r.start_time == start_time
                    && r.end_time == end_time
            })
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        matching.truncate(2);
        Ok(matching)
    }

    async fn count_signups(&mut self, reservation_id: DbId) -> Result<i64, sqlx::Error> {
        let mut users: BTreeSet<DbId> = self
            .working
            .participants
            .iter()
            .filter(|(r, _)| *r == reservation_id)
            .map(|(_, u)| *u)
            .collect();
        if let Some(primary) = self
            .working
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .and_then(|r| r.primary_user_id)
        {
            users.insert(primary);
        }
        Ok(users.len() as i64)
    }

    async fn list_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<Vec<ReservationCourt>, sqlx::Error> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|a| a.reservation_id == reservation_id)
            .cloned()
            .collect())
    }

    async fn list_available_courts(
        &mut self,
        facility_id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        reservation_id: DbId,
    ) -> Result<Vec<Court>, sqlx::Error> {
        let state = &self.working;
        let taken: BTreeSet<DbId> = state
            .assignments
            .iter()
            .filter(|a| {
                a.reservation_id == reservation_id
                    || state.reservations.iter().any(|r| {
                        r.id == a.reservation_id
                            && r.status_id != ReservationStatus::Cancelled.id()
                            && overlaps(r.start_time, r.end_time, start_time, end_time)
                    })
            })
            .map(|a| a.court_id)
            .collect();
        let mut free: Vec<Court> = state
            .courts
            .iter()
            .filter(|c| c.facility_id == facility_id && c.is_active && !taken.contains(&c.id))
            .cloned()
            .collect();
        free.sort_by_key(|c| c.court_number);
        Ok(free)
    }

    async fn add_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error> {
        self.working.assign(reservation_id, court_id);
        self.working.writes += 1;
        Ok(())
    }

    async fn remove_reservation_court(
        &mut self,
        reservation_id: DbId,
        court_id: DbId,
    ) -> Result<(), sqlx::Error> {
        self.working
            .assignments
            .retain(|a| !(a.reservation_id == reservation_id && a.court_id == court_id));
        self.working.writes += 1;
        Ok(())
    }

    async fn remove_all_reservation_courts(
        &mut self,
        reservation_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let before = self.working.assignments.len();
        self.working
            .assignments
            .retain(|a| a.reservation_id != reservation_id);
        self.working.writes += 1;
        Ok((before - self.working.assignments.len()) as u64)
    }

    async fn cancel_reservation(
        &mut self,
        reservation_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        if let Some(r) = self
            .working
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
        {
            r.status_id = ReservationStatus::Cancelled.id();
            r.cancelled_at = Some(cancelled_at);
            r.cancellation_reason = Some(reason.to_string());
        }
        self.working.writes += 1;
        Ok(())
    }

    async fn cancel_session(
        &mut self,
        session_id: DbId,
        cancelled_at: Timestamp,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let Some(s) = self.working.scheduled_session_mut(session_id) else {
            return Ok(false);
        };
        s.status_id = OpenPlaySessionStatus::Cancelled.id();
        s.cancelled_at = Some(cancelled_at);
        s.cancellation_reason = Some(reason.to_string());
        s.current_court_count = 0;
        self.working.writes += 1;
        Ok(true)
    }

    async fn update_session_court_count(
        &mut self,
        session_id: DbId,
        court_count: i32,
    ) -> Result<bool, sqlx::Error> {
        let Some(s) = self.working.scheduled_session_mut(session_id) else {
            return Ok(false);
        };
        s.current_court_count = court_count;
        self.working.writes += 1;
        Ok(true)
    }

    async fn insert_audit_entry(
        &mut self,
        entry: &CreateOpenPlayAuditLog,
    ) -> Result<(), sqlx::Error> {
        if self.faults.fail_audit_for_session == Some(entry.session_id) {
            return Err(injected("insert_audit_entry"));
        }
        self.working.audit_log.push(entry.clone());
        self.working.writes += 1;
        Ok(())
    }

    async fn insert_staff_notification(
        &mut self,
        notification: &CreateStaffNotification,
    ) -> Result<(), sqlx::Error> {
        self.working.notifications.push(notification.clone());
        self.working.writes += 1;
        Ok(())
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        *self.shared.lock().expect("memory store lock") = self.working;
        Ok(())
    }
}
