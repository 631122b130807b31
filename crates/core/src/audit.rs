//! Open play audit actions, snapshots and staff-facing messages.
//!
//! This module lives in `core` (zero internal deps) so the wording of audit
//! reasons and notifications is shared by every writer and testable without
//! a database.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Actions recorded in `open_play_audit_logs`.
pub mod action_types {
    pub const CANCELLED: &str = "cancelled";
    pub const SCALE_UP: &str = "scale_up";
    pub const SCALE_DOWN: &str = "scale_down";
}

/// Staff notification types. These mirror the audit actions.
pub mod notification_types {
    pub const OPEN_PLAY_CANCELLED: &str = super::action_types::CANCELLED;
    pub const OPEN_PLAY_SCALE_UP: &str = super::action_types::SCALE_UP;
    pub const OPEN_PLAY_SCALE_DOWN: &str = super::action_types::SCALE_DOWN;
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Before/after state of a session, stored as JSON on the audit entry.
///
/// Serialized with camelCase keys; unset fields are omitted so cancellation
/// and scaling entries keep their distinct shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_court_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_courts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signups: Option<i64>,
}

impl CapacitySnapshot {
    /// Snapshot including the session status (cancellation entries).
    pub fn with_status(
        status: &str,
        current_court_count: i64,
        reserved_courts: i64,
        signups: i64,
    ) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::courts(current_court_count, reserved_courts, signups)
        }
    }

    /// Snapshot of court counts only (scaling entries).
    pub fn courts(current_court_count: i64, reserved_courts: i64, signups: i64) -> Self {
        Self {
            status: None,
            current_court_count: Some(current_court_count),
            reserved_courts: Some(reserved_courts),
            signups: Some(signups),
        }
    }
}

// ---------------------------------------------------------------------------
// Reasons
// ---------------------------------------------------------------------------

/// Cancellation reason stored on the session and the audit entry.
pub fn cancellation_reason(signups: i64, min_participants: i32) -> String {
    format!("Only {signups} signups (minimum: {min_participants})")
}

/// Audit reason for a scaling decision.
pub fn scaling_reason(signups: i64, desired: i64, capped_at: Option<i64>) -> String {
    let mut reason = format!("{signups} signups require {desired} courts");
    if let Some(limit) = capped_at {
        reason.push_str(&format!("; availability capped at {limit} courts"));
    }
    reason
}

// ---------------------------------------------------------------------------
// Staff notification messages
// ---------------------------------------------------------------------------

pub fn cancelled_message(rule_name: &str, signups: i64, min_participants: i32) -> String {
    format!(
        "Open play \"{rule_name}\" was cancelled: only {signups} signups \
         (minimum: {min_participants})"
    )
}

pub fn capped_message(rule_name: &str, courts: i64, desired: i64, signups: i64) -> String {
    format!(
        "Open play \"{rule_name}\" is capped at its current {courts} courts: \
         {signups} signups need {desired} courts but no more are available"
    )
}

pub fn scaled_message(rule_name: &str, from: i64, to: i64, signups: i64) -> String {
    format!("Open play \"{rule_name}\" scaled from {from} to {to} courts ({signups} signups)")
}
