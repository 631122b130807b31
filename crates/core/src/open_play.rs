//! Open play capacity decisions.
//!
//! This module lives in `core` (zero internal deps) so the decision logic can
//! be exercised with plain values: the worker loads sessions, rules and court
//! availability from the capacity store and hands the numbers to the
//! functions below. Nothing here performs I/O.

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Open play session status IDs matching `open_play_session_statuses` seed
/// data (1-based SMALLSERIAL).
///
/// Duplicated from the `db` crate's `OpenPlaySessionStatus` enum because
/// `core` must have zero internal deps.
pub mod session_status {
    use crate::types::StatusId;

    pub const SCHEDULED: StatusId = 1;
    pub const COMPLETED: StatusId = 2;
    pub const CANCELLED: StatusId = 3;

    /// Only scheduled sessions are considered by the capacity engine.
    ///
    /// Completed and cancelled sessions are terminal as far as the engine
    /// is concerned and are never touched again.
    pub fn is_evaluable(status: StatusId) -> bool {
        status == SCHEDULED
    }

    /// Lowercase name used in audit snapshots.
    pub fn status_name(status: StatusId) -> &'static str {
        match status {
            SCHEDULED => "scheduled",
            COMPLETED => "completed",
            CANCELLED => "cancelled",
            _ => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Whether a session with `signups` participants falls below the rule minimum.
pub fn is_undersubscribed(signups: i64, min_participants: i32) -> bool {
    signups < i64::from(min_participants)
}

/// Effective auto-scale flag: the session override shadows the rule default.
pub fn effective_auto_scale(session_override: Option<bool>, rule_default: bool) -> bool {
    session_override.unwrap_or(rule_default)
}

// ---------------------------------------------------------------------------
// Desired court count
// ---------------------------------------------------------------------------

/// Ceiling division that treats non-positive inputs as zero.
pub fn ceil_div(value: i64, divisor: i64) -> i64 {
    if value <= 0 || divisor <= 0 {
        return 0;
    }
    value / divisor + i64::from(value % divisor != 0)
}

/// Saturate `value` into `[min, max]`.
///
/// Never panics: if the bounds are inverted the upper bound wins.
pub fn clamp_courts(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

/// The court-count bounds of an open play rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingPolicy {
    pub max_participants_per_court: i32,
    pub min_courts: i32,
    pub max_courts: i32,
}

impl ScalingPolicy {
    /// Courts needed to seat `signups` players, bounded by the rule.
    pub fn desired_courts(&self, signups: i64) -> i64 {
        let needed = ceil_div(signups, i64::from(self.max_participants_per_court));
        clamp_courts(
            needed,
            i64::from(self.min_courts),
            i64::from(self.max_courts),
        )
    }
}

// ---------------------------------------------------------------------------
// Availability capping
// ---------------------------------------------------------------------------

/// How the court assignments of a reservation should change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourtAdjustment {
    /// Keep the current assignments (desired increase fully capped).
    Hold,
    /// Assign this many courts from the available set, in store order.
    Add(usize),
    /// Release this many courts from the tail of the existing list.
    Release(usize),
}

/// A desired court count reconciled with live availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    pub desired: i64,
    pub existing: i64,
    pub available: i64,
    /// `existing + available`: the most courts the session could hold.
    pub availability_limit: i64,
    pub target: i64,
}

impl CapacityPlan {
    pub fn new(desired: i64, existing: i64, available: i64) -> Self {
        let availability_limit = existing + available;
        Self {
            desired,
            existing,
            available,
            availability_limit,
            target: desired.min(availability_limit),
        }
    }

    /// True when availability prevented reaching the desired count.
    pub fn is_capped(&self) -> bool {
        self.desired > self.availability_limit
    }

    pub fn adjustment(&self) -> CourtAdjustment {
        if self.target > self.existing {
            let add = (self.target - self.existing).min(self.available);
            CourtAdjustment::Add(usize::try_from(add).unwrap_or(0))
        } else if self.target < self.existing {
            let release = self.existing - self.target;
            CourtAdjustment::Release(usize::try_from(release).unwrap_or(0))
        } else {
            CourtAdjustment::Hold
        }
    }
}
