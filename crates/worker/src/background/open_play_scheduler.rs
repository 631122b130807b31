//! Periodic open play capacity evaluation.
//!
//! [`OpenPlayScheduler`] ticks on a fixed interval and, on every tick, runs
//! the evaluator once for each facility that owns an open play rule. Ticks
//! never overlap: the loop awaits a tick's full evaluation before the next
//! one is taken, and missed ticks are delayed rather than burst.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use courtside_core::types::Timestamp;
use courtside_db::CapacityStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::open_play::{EvaluationSummary, OpenPlayEvaluator};

/// What one tick did across all facilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Facilities evaluated (including failed ones).
    pub facilities: usize,
    /// Facilities whose pass returned an error.
    pub failed: usize,
    /// Merged summary of the facility passes that succeeded.
    pub summary: EvaluationSummary,
}

// ---------------------------------------------------------------------------
// OpenPlayScheduler
// ---------------------------------------------------------------------------

pub struct OpenPlayScheduler<S> {
    evaluator: Arc<OpenPlayEvaluator<S>>,
    interval: Duration,
    pass_timeout: Duration,
}

impl<S: CapacityStore + 'static> OpenPlayScheduler<S> {
    /// `pass_timeout` bounds each facility pass; an expired pass is rolled
    /// back and the tick moves on to the next facility.
    pub fn new(
        evaluator: Arc<OpenPlayEvaluator<S>>,
        interval: Duration,
        pass_timeout: Duration,
    ) -> Self {
        Self {
            evaluator,
            interval,
            pass_timeout,
        }
    }

    pub fn evaluator(&self) -> &Arc<OpenPlayEvaluator<S>> {
        &self.evaluator
    }

    /// Spawn the scheduler loop. The first tick fires immediately.
    pub fn start(self) -> OpenPlaySchedulerHandle {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            self.run(loop_cancel).await;
        });
        OpenPlaySchedulerHandle { cancel, join }
    }

    /// Run the scheduler loop until `cancel` is triggered.
    ///
    /// A tick in progress when `cancel` fires is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            pass_timeout_secs = self.pass_timeout.as_secs(),
            transaction_scope = %self.evaluator.transaction_scope(),
            "Open play scheduler started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Open play scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.run_tick(Utc::now()).await;
                }
            }
        }
    }

    /// Evaluate every facility once, sequentially, as of `now`.
    ///
    /// A failing facility is logged and does not stop the others.
    pub async fn run_tick(&self, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();

        let facility_ids = match self.evaluator.store().list_facility_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Open play scheduler: failed to list facilities");
                return report;
            }
        };

        for facility_id in facility_ids {
            report.facilities += 1;
            match self
                .evaluator
                .evaluate_with_deadline(facility_id, Some(now), self.pass_timeout)
                .await
            {
                Ok(summary) => report.summary.merge(&summary),
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        facility_id,
                        error = %e,
                        "Open play scheduler: facility pass failed"
                    );
                }
            }
        }

        if report.failed > 0 || report.summary.has_changes() {
            tracing::info!(
                facilities = report.facilities,
                failed = report.failed,
                cancelled = report.summary.cancelled,
                scaled = report.summary.scaled,
                capped = report.summary.capped,
                "Open play scheduler tick complete"
            );
        } else {
            tracing::debug!(
                facilities = report.facilities,
                evaluated = report.summary.evaluated,
                "Open play scheduler tick complete, no changes"
            );
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owner of a running scheduler loop.
pub struct OpenPlaySchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl OpenPlaySchedulerHandle {
    /// Cancel the loop and wait up to `grace` for the current tick to
    /// finish. Aborts the task when the grace period runs out, which drops
    /// (and rolls back) any open transaction.
    pub async fn stop(mut self, grace: Duration) {
        self.cancel.cancel();

        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(Ok(())) => tracing::info!("Open play scheduler stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Open play scheduler task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Open play scheduler did not stop in time, aborting"
                );
                self.join.abort();
            }
        }
    }
}
