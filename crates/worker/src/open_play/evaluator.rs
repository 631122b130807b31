//! Session evaluator: runs the cancellation and scaling checks for every
//! session of a facility whose cutoff has arrived.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use courtside_core::error::CoreError;
use courtside_core::types::{DbId, Timestamp};
use courtside_db::models::open_play::{OpenPlayRule, OpenPlaySession};
use courtside_db::{CapacityStore, CapacityTx};

use super::cancellation::run_cancellation_check;
use super::scaling::{run_scaling_check, ScalingOutcome};
use crate::error::OpenPlayError;

// ---------------------------------------------------------------------------
// Transaction scope
// ---------------------------------------------------------------------------

/// How much work one transaction covers during a facility pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionScope {
    /// One transaction for the whole facility pass. A failure on any session
    /// rolls back every decision of that pass.
    #[default]
    FacilityBatch,
    /// One transaction per session. A failing session is rolled back alone
    /// and its siblings still commit.
    PerSession,
}

impl TransactionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FacilityBatch => "facility_batch",
            Self::PerSession => "per_session",
        }
    }
}

impl fmt::Display for TransactionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facility_batch" | "batch" => Ok(Self::FacilityBatch),
            "per_session" | "session" => Ok(Self::PerSession),
            other => Err(format!(
                "unknown transaction scope '{other}' (expected facility_batch or per_session)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Counts of what a facility pass decided. Used for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub evaluated: usize,
    pub cancelled: usize,
    pub scaled: usize,
    pub capped: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl EvaluationSummary {
    fn record(&mut self, decision: SessionDecision) {
        self.evaluated += 1;
        match decision {
            SessionDecision::Cancelled => self.cancelled += 1,
            SessionDecision::Scaling(
                ScalingOutcome::ScaledUp { .. } | ScalingOutcome::ScaledDown { .. },
            ) => self.scaled += 1,
            SessionDecision::Scaling(ScalingOutcome::Capped { .. }) => self.capped += 1,
            SessionDecision::Scaling(ScalingOutcome::Unchanged { .. } | ScalingOutcome::Skipped) => {
                self.unchanged += 1
            }
        }
    }

    pub fn merge(&mut self, other: &EvaluationSummary) {
        self.evaluated += other.evaluated;
        self.cancelled += other.cancelled;
        self.scaled += other.scaled;
        self.capped += other.capped;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }

    /// Whether any session was cancelled, rescaled or capped.
    pub fn has_changes(&self) -> bool {
        self.cancelled + self.scaled + self.capped > 0
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum SessionDecision {
    Cancelled,
    Scaling(ScalingOutcome),
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluates open play sessions against their rules using a [`CapacityStore`].
pub struct OpenPlayEvaluator<S> {
    store: S,
    scope: TransactionScope,
}

impl<S: CapacityStore> OpenPlayEvaluator<S> {
    /// Create an evaluator using the default facility-batch transaction scope.
    pub fn new(store: S) -> Self {
        Self {
            store,
            scope: TransactionScope::default(),
        }
    }

    pub fn with_transaction_scope(mut self, scope: TransactionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transaction_scope(&self) -> TransactionScope {
        self.scope
    }

    /// Evaluate every scheduled session of `facility_id` whose cutoff has
    /// arrived as of `reference_time` (wall clock when `None`).
    ///
    /// Sessions are processed in store order. Each is checked for
    /// cancellation first; only surviving sessions are checked for scaling.
    pub async fn evaluate_sessions_approaching_cutoff(
        &self,
        facility_id: DbId,
        reference_time: Option<Timestamp>,
    ) -> Result<EvaluationSummary, OpenPlayError> {
        let now = reference_time.unwrap_or_else(Utc::now);

        let summary = match self.scope {
            TransactionScope::FacilityBatch => self.evaluate_batch(facility_id, now).await?,
            TransactionScope::PerSession => self.evaluate_per_session(facility_id, now).await?,
        };

        if summary.has_changes() {
            tracing::info!(
                facility_id,
                evaluated = summary.evaluated,
                cancelled = summary.cancelled,
                scaled = summary.scaled,
                capped = summary.capped,
                "Open play evaluation complete"
            );
        } else {
            tracing::debug!(
                facility_id,
                evaluated = summary.evaluated,
                "Open play evaluation complete, no changes"
            );
        }

        Ok(summary)
    }

    /// Like [`Self::evaluate_sessions_approaching_cutoff`], aborted after
    /// `deadline`. An aborted pass is rolled back in full.
    pub async fn evaluate_with_deadline(
        &self,
        facility_id: DbId,
        reference_time: Option<Timestamp>,
        deadline: Duration,
    ) -> Result<EvaluationSummary, OpenPlayError> {
        tokio::time::timeout(
            deadline,
            self.evaluate_sessions_approaching_cutoff(facility_id, reference_time),
        )
        .await
        .map_err(|_| OpenPlayError::DeadlineExceeded {
            facility_id,
            timeout: deadline,
        })?
    }

    /// Run only the cancellation check for one session, in its own
    /// transaction. Used for manual/administrative invocation.
    ///
    /// The session is re-read and locked by ID, so a caller holding an
    /// outdated copy cannot act on a session that has since been cancelled.
    pub async fn check_cancellation(
        &self,
        session: &OpenPlaySession,
        rule: &OpenPlayRule,
        reference_time: Option<Timestamp>,
    ) -> Result<bool, OpenPlayError> {
        let now = reference_time.unwrap_or_else(Utc::now);
        let mut tx = self.store.begin().await?;
        let current = reload_session(&mut tx, session.id).await?;
        let cancelled = run_cancellation_check(&mut tx, &current, rule, now).await?;
        tx.commit().await?;
        Ok(cancelled)
    }

    /// Run only the scaling check for one session, in its own transaction.
    /// The session is re-read and locked by ID first.
    pub async fn check_scaling(
        &self,
        session: &OpenPlaySession,
        rule: &OpenPlayRule,
    ) -> Result<ScalingOutcome, OpenPlayError> {
        let mut tx = self.store.begin().await?;
        let current = reload_session(&mut tx, session.id).await?;
        let outcome = run_scaling_check(&mut tx, &current, rule).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn evaluate_batch(
        &self,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<EvaluationSummary, OpenPlayError> {
        let mut tx = self.store.begin().await?;
        let sessions = tx.list_sessions_approaching_cutoff(facility_id, now).await?;
        let mut summary = EvaluationSummary::default();

        for session in &sessions {
            match evaluate_session(&mut tx, session, now).await {
                Ok(decision) => summary.record(decision),
                Err(e) => {
                    log_session_failure(session, &e);
                    tracing::warn!(
                        facility_id,
                        sessions = sessions.len(),
                        "Rolling back open play evaluation for the whole facility pass"
                    );
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        Ok(summary)
    }

    async fn evaluate_per_session(
        &self,
        facility_id: DbId,
        now: Timestamp,
    ) -> Result<EvaluationSummary, OpenPlayError> {
        let sessions = {
            let mut tx = self.store.begin().await?;
            let sessions = tx.list_sessions_approaching_cutoff(facility_id, now).await?;
            tx.commit().await?;
            sessions
        };

        let mut summary = EvaluationSummary::default();
        let mut first_error = None;

        for session in &sessions {
            match self.evaluate_session_in_own_tx(session, now).await {
                Ok(decision) => summary.record(decision),
                Err(e) => {
                    log_session_failure(session, &e);
                    summary.failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                tracing::warn!(
                    facility_id,
                    evaluated = summary.evaluated,
                    failed = summary.failed,
                    "Open play evaluation finished with failed sessions"
                );
                Err(e)
            }
            None => Ok(summary),
        }
    }

    async fn evaluate_session_in_own_tx(
        &self,
        session: &OpenPlaySession,
        now: Timestamp,
    ) -> Result<SessionDecision, OpenPlayError> {
        let mut tx = self.store.begin().await?;
        let current = reload_session(&mut tx, session.id).await?;
        let decision = evaluate_session(&mut tx, &current, now).await?;
        tx.commit().await?;
        Ok(decision)
    }
}

/// Load the rule, then cancel or rescale one session.
pub(super) async fn evaluate_session<T: CapacityTx>(
    tx: &mut T,
    session: &OpenPlaySession,
    now: Timestamp,
) -> Result<SessionDecision, OpenPlayError> {
    let rule = tx
        .find_rule(session.open_play_rule_id, session.facility_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "open_play_rule",
            id: session.open_play_rule_id,
        })?;

    if run_cancellation_check(tx, session, &rule, now).await? {
        return Ok(SessionDecision::Cancelled);
    }

    let outcome = run_scaling_check(tx, session, &rule).await?;
    Ok(SessionDecision::Scaling(outcome))
}

/// Re-read a session inside `tx`, locking it until commit.
async fn reload_session<T: CapacityTx>(
    tx: &mut T,
    session_id: DbId,
) -> Result<OpenPlaySession, OpenPlayError> {
    tx.find_session(session_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "open_play_session",
            id: session_id,
        }
        .into()
    })
}

fn log_session_failure(session: &OpenPlaySession, error: &OpenPlayError) {
    tracing::error!(
        facility_id = session.facility_id,
        session_id = session.id,
        rule_id = session.open_play_rule_id,
        error = %error,
        "Open play session evaluation failed"
    );
}
