//! Cancellation check: cancel sessions below the rule's minimum signups.

use courtside_core::audit::{self, action_types, notification_types, CapacitySnapshot};
use courtside_core::open_play::{is_undersubscribed, session_status};
use courtside_core::types::Timestamp;
use courtside_db::models::audit::CreateOpenPlayAuditLog;
use courtside_db::models::notification::CreateStaffNotification;
use courtside_db::models::open_play::{OpenPlayRule, OpenPlaySession};
use courtside_db::CapacityTx;

use super::{resolve_reservation, stale_session};
use crate::error::OpenPlayError;

/// Cancel `session` if it has fewer signups than `rule.min_participants`.
///
/// Returns `true` if the session was cancelled. Cancelling frees every court
/// held by the backing reservation, marks the reservation and session
/// cancelled at `now`, zeroes the court count, and appends one audit entry
/// and one staff notification.
pub async fn run_cancellation_check<T: CapacityTx>(
    tx: &mut T,
    session: &OpenPlaySession,
    rule: &OpenPlayRule,
    now: Timestamp,
) -> Result<bool, OpenPlayError> {
    if !session_status::is_evaluable(session.status_id) {
        tracing::trace!(
            session_id = session.id,
            status_id = session.status_id,
            "Cancellation check skipped: session not scheduled"
        );
        return Ok(false);
    }

    let reservation = resolve_reservation(tx, session).await?;
    let signups = tx.count_signups(reservation.id).await?;

    if !is_undersubscribed(signups, rule.min_participants) {
        tracing::debug!(
            session_id = session.id,
            signups,
            min_participants = rule.min_participants,
            "Session meets minimum signups"
        );
        return Ok(false);
    }

    let reserved_courts = tx.list_reservation_courts(reservation.id).await?.len() as i64;
    let reason = audit::cancellation_reason(signups, rule.min_participants);

    let before = CapacitySnapshot::with_status(
        session_status::status_name(session.status_id),
        i64::from(session.current_court_count),
        reserved_courts,
        signups,
    );

    if !tx.cancel_session(session.id, now, &reason).await? {
        return Err(stale_session(session));
    }
    let freed = tx.remove_all_reservation_courts(reservation.id).await?;
    tx.cancel_reservation(reservation.id, now, &reason).await?;

    let after = CapacitySnapshot::with_status(
        session_status::status_name(session_status::CANCELLED),
        0,
        0,
        signups,
    );

    tx.insert_audit_entry(&CreateOpenPlayAuditLog {
        session_id: session.id,
        action: action_types::CANCELLED.to_string(),
        before_state: before,
        after_state: after,
        reason,
    })
    .await?;

    tx.insert_staff_notification(&CreateStaffNotification {
        facility_id: session.facility_id,
        notification_type: notification_types::OPEN_PLAY_CANCELLED.to_string(),
        message: audit::cancelled_message(&rule.name, signups, rule.min_participants),
        related_session_id: Some(session.id),
    })
    .await?;

    tracing::info!(
        session_id = session.id,
        facility_id = session.facility_id,
        rule_id = rule.id,
        reservation_id = reservation.id,
        signups,
        min_participants = rule.min_participants,
        courts_freed = freed,
        "Open play session cancelled"
    );

    Ok(true)
}
