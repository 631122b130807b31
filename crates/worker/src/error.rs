use std::time::Duration;

use courtside_core::error::CoreError;
use courtside_core::types::DbId;

/// Errors raised while evaluating open play sessions.
///
/// Any error aborts the enclosing transaction; the next scheduler tick
/// re-evaluates from persisted state.
#[derive(Debug, thiserror::Error)]
pub enum OpenPlayError {
    /// Missing rule or reservation for a scheduled session.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A read or write against the capacity store failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Open play evaluation for facility {facility_id} exceeded its {timeout:?} deadline")]
    DeadlineExceeded { facility_id: DbId, timeout: Duration },
}
