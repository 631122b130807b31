//! Open play rule and session models.

use courtside_core::open_play::ScalingPolicy;
use courtside_core::types::{DbId, StatusId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A row from the `open_play_rules` table.
///
/// Bounds (`1 <= min_courts <= max_courts`) are enforced by the staff CRUD
/// layer and a table CHECK constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenPlayRule {
    pub id: DbId,
    pub facility_id: DbId,
    pub name: String,
    pub min_participants: i32,
    pub max_participants_per_court: i32,
    pub cancellation_cutoff_minutes: i32,
    pub auto_scale_enabled: bool,
    pub min_courts: i32,
    pub max_courts: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OpenPlayRule {
    pub fn scaling_policy(&self) -> ScalingPolicy {
        ScalingPolicy {
            max_participants_per_court: self.max_participants_per_court,
            min_courts: self.min_courts,
            max_courts: self.max_courts,
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// A row from the `open_play_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OpenPlaySession {
    pub id: DbId,
    pub facility_id: DbId,
    pub open_play_rule_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status_id: StatusId,
    pub current_court_count: i32,
    /// Session-level opt-in/opt-out shadowing `auto_scale_enabled` on the rule.
    pub auto_scale_override: Option<bool>,
    pub cancelled_at: Option<Timestamp>,
    pub cancellation_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
