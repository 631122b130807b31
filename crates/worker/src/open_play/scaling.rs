//! Scaling check: match a session's court count to its signups, capped by
//! live court availability.

use courtside_core::audit::{self, action_types, notification_types, CapacitySnapshot};
use courtside_core::open_play::{
    effective_auto_scale, session_status, CapacityPlan, CourtAdjustment,
};
use courtside_db::models::audit::CreateOpenPlayAuditLog;
use courtside_db::models::notification::CreateStaffNotification;
use courtside_db::models::open_play::{OpenPlayRule, OpenPlaySession};
use courtside_db::CapacityTx;

use super::{resolve_reservation, stale_session};
use crate::error::OpenPlayError;

/// Result of a scaling check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingOutcome {
    /// Not scheduled, or auto-scale disabled for the session.
    Skipped,
    /// Already at the desired court count. Nothing written.
    Unchanged { courts: i64 },
    /// A desired increase was fully absorbed by the availability cap.
    /// Audited and notified without touching court assignments.
    Capped { courts: i64, desired: i64 },
    ScaledUp { from: i64, to: i64 },
    ScaledDown { from: i64, to: i64 },
}

impl ScalingOutcome {
    /// Whether a decision was made and logged.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Self::Capped { .. } | Self::ScaledUp { .. } | Self::ScaledDown { .. }
        )
    }
}

/// Rescale the courts of a session that was not cancelled.
///
/// The desired count is `ceil(signups / max_participants_per_court)` clamped
/// to the rule's court bounds, then capped at the courts currently held plus
/// those free for the session's window. Added courts are taken in the order
/// the store lists them; released courts come off the tail of the current
/// assignment list.
pub async fn run_scaling_check<T: CapacityTx>(
    tx: &mut T,
    session: &OpenPlaySession,
    rule: &OpenPlayRule,
) -> Result<ScalingOutcome, OpenPlayError> {
    if !session_status::is_evaluable(session.status_id) {
        tracing::trace!(
            session_id = session.id,
            status_id = session.status_id,
            "Scaling check skipped: session not scheduled"
        );
        return Ok(ScalingOutcome::Skipped);
    }

    if !effective_auto_scale(session.auto_scale_override, rule.auto_scale_enabled) {
        tracing::debug!(
            session_id = session.id,
            rule_id = rule.id,
            "Scaling check skipped: auto-scale disabled"
        );
        return Ok(ScalingOutcome::Skipped);
    }

    let reservation = resolve_reservation(tx, session).await?;
    let signups = tx.count_signups(reservation.id).await?;
    let desired = rule.scaling_policy().desired_courts(signups);

    let existing = tx.list_reservation_courts(reservation.id).await?;
    let existing_count = existing.len() as i64;

    if desired == existing_count {
        tracing::debug!(
            session_id = session.id,
            signups,
            courts = existing_count,
            "Session already at desired court count"
        );
        return Ok(ScalingOutcome::Unchanged {
            courts: existing_count,
        });
    }

    // Queried per session so courts freed earlier in the same pass are seen.
    let available = tx
        .list_available_courts(
            session.facility_id,
            session.start_time,
            session.end_time,
            reservation.id,
        )
        .await?;

    let plan = CapacityPlan::new(desired, existing_count, available.len() as i64);
    let capped_at = plan.is_capped().then_some(plan.availability_limit);
    let reason = audit::scaling_reason(signups, desired, capped_at);
    let before = CapacitySnapshot::courts(
        i64::from(session.current_court_count),
        existing_count,
        signups,
    );

    let outcome = match plan.adjustment() {
        CourtAdjustment::Hold => {
            tx.insert_audit_entry(&CreateOpenPlayAuditLog {
                session_id: session.id,
                action: action_types::SCALE_UP.to_string(),
                before_state: before.clone(),
                after_state: before,
                reason,
            })
            .await?;

            tx.insert_staff_notification(&CreateStaffNotification {
                facility_id: session.facility_id,
                notification_type: notification_types::OPEN_PLAY_SCALE_UP.to_string(),
                message: audit::capped_message(&rule.name, existing_count, desired, signups),
                related_session_id: Some(session.id),
            })
            .await?;

            tracing::info!(
                session_id = session.id,
                facility_id = session.facility_id,
                rule_id = rule.id,
                signups,
                desired,
                courts = existing_count,
                "Open play scale-up capped by court availability"
            );

            return Ok(ScalingOutcome::Capped {
                courts: existing_count,
                desired,
            });
        }
        CourtAdjustment::Add(count) => {
            for court in available.iter().take(count) {
                tx.add_reservation_court(reservation.id, court.id).await?;
            }
            ScalingOutcome::ScaledUp {
                from: existing_count,
                to: plan.target,
            }
        }
        CourtAdjustment::Release(count) => {
            for assignment in existing.iter().rev().take(count) {
                tx.remove_reservation_court(reservation.id, assignment.court_id)
                    .await?;
            }
            ScalingOutcome::ScaledDown {
                from: existing_count,
                to: plan.target,
            }
        }
    };

    // The target lies within [min_courts, max_courts], both i32.
    let court_count = i32::try_from(plan.target).unwrap_or(rule.max_courts);
    if !tx.update_session_court_count(session.id, court_count).await? {
        return Err(stale_session(session));
    }

    let action = match outcome {
        ScalingOutcome::ScaledDown { .. } => action_types::SCALE_DOWN,
        _ => action_types::SCALE_UP,
    };
    let notification_type = match outcome {
        ScalingOutcome::ScaledDown { .. } => notification_types::OPEN_PLAY_SCALE_DOWN,
        _ => notification_types::OPEN_PLAY_SCALE_UP,
    };

    tx.insert_audit_entry(&CreateOpenPlayAuditLog {
        session_id: session.id,
        action: action.to_string(),
        before_state: before,
        after_state: CapacitySnapshot::courts(plan.target, plan.target, signups),
        reason,
    })
    .await?;

    tx.insert_staff_notification(&CreateStaffNotification {
        facility_id: session.facility_id,
        notification_type: notification_type.to_string(),
        message: audit::scaled_message(&rule.name, existing_count, plan.target, signups),
        related_session_id: Some(session.id),
    })
    .await?;

    tracing::info!(
        session_id = session.id,
        facility_id = session.facility_id,
        rule_id = rule.id,
        reservation_id = reservation.id,
        signups,
        desired,
        from = existing_count,
        to = plan.target,
        capped = plan.is_capped(),
        "Open play session rescaled"
    );

    Ok(outcome)
}
