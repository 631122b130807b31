//! Open play capacity engine.
//!
//! For each scheduled open play session whose cancellation cutoff has
//! arrived, the engine first decides whether to cancel it for
//! under-subscription and, if it survives, whether to rescale the number of
//! courts it occupies. Every state-changing decision writes one audit entry
//! and one staff notification in the same transaction as the court and
//! session mutations.

pub mod cancellation;
pub mod evaluator;
pub mod scaling;

#[cfg(test)]
pub(crate) mod memory_store;

use courtside_core::error::CoreError;
use courtside_db::models::open_play::OpenPlaySession;
use courtside_db::models::reservation::Reservation;
use courtside_db::CapacityTx;

pub use cancellation::run_cancellation_check;
pub use evaluator::{EvaluationSummary, OpenPlayEvaluator, TransactionScope};
pub use scaling::{run_scaling_check, ScalingOutcome};

use crate::error::OpenPlayError;

/// Resolve the reservation backing `session`.
///
/// Every scheduled session must be backed by exactly one reservation; a
/// missing or duplicated one is a data-integrity violation, not a skip.
async fn resolve_reservation<T: CapacityTx>(
    tx: &mut T,
    session: &OpenPlaySession,
) -> Result<Reservation, OpenPlayError> {
    let mut reservations = tx
        .find_reservations(
            session.facility_id,
            session.open_play_rule_id,
            session.start_time,
            session.end_time,
        )
        .await?;

    if reservations.len() > 1 {
        return Err(CoreError::Integrity(format!(
            "Multiple reservations found for open play session {} \
             (facility {}, rule {}, {} - {})",
            session.id,
            session.facility_id,
            session.open_play_rule_id,
            session.start_time,
            session.end_time,
        ))
        .into());
    }

    reservations.pop().ok_or_else(|| {
        CoreError::Integrity(format!(
            "No reservation found for open play session {} \
             (facility {}, rule {}, {} - {})",
            session.id,
            session.facility_id,
            session.open_play_rule_id,
            session.start_time,
            session.end_time,
        ))
        .into()
    })
}

/// Error for a session write that matched no scheduled row: the session
/// changed state since it was read.
fn stale_session(session: &OpenPlaySession) -> OpenPlayError {
    CoreError::Integrity(format!(
        "Open play session {} is no longer scheduled",
        session.id
    ))
    .into()
}
