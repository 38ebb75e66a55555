//! Per-user reconciliation.
//!
//! State machine for one (user, day) pair:
//! fetch worked issues -> empty gives no-work -> list existing logs for
//! every fetched item -> any entry authored by this user gives
//! already-logged -> allocate the day's seconds fairly -> submit one
//! worklog per item concurrently -> logged or partial.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use wa_core::{AllocationPlan, ReconcileOutcome, WorkConfig};
use wa_jira::Tracker;
use wa_resilience::CircuitBreaker;

/// Drives one user's reconciliation against the tracker.
///
/// Dependencies come in through the constructor: the tracker client and
/// the process-wide circuit breaker guarding it. The breaker is shared
/// across users on purpose; one tenant's failure storm protects the
/// remote for everyone.
pub struct Reconciler {
    tracker: Arc<dyn Tracker>,
    breaker: Arc<CircuitBreaker>,
}

impl Reconciler {
    pub fn new(tracker: Arc<dyn Tracker>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { tracker, breaker }
    }

    /// The circuit breaker guarding the tracker, for the status surface.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Reconciles `config` for `day` with an entropy-seeded rng.
    pub async fn reconcile(
        &self,
        config: &WorkConfig,
        day: NaiveDate,
        days_ago: u32,
    ) -> ReconcileOutcome {
        let mut rng = StdRng::from_entropy();
        self.reconcile_with_rng(config, day, days_ago, &mut rng)
            .await
    }

    /// Reconciles with a caller-supplied random source, so tests can pin
    /// the fair allocation.
    ///
    /// Never returns an error: every failure is folded into a
    /// [`ReconcileOutcome`] so one user cannot abort a batch.
    pub async fn reconcile_with_rng<R: Rng>(
        &self,
        config: &WorkConfig,
        day: NaiveDate,
        days_ago: u32,
        rng: &mut R,
    ) -> ReconcileOutcome {
        let items = match self
            .breaker
            .call(|| self.tracker.find_worked_issues(config, days_ago))
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(user_id = %config.user_id, operation = "find_worked_issues", error = %err, "reconciliation failed");
                return ReconcileOutcome::Failed(err.to_string());
            }
        };
        if items.is_empty() {
            debug!(user_id = %config.user_id, %day, "no worked issues found");
            return ReconcileOutcome::NoWork;
        }

        // Day-scoped idempotency check across all fetched items: any
        // entry authored by this user on any item marks the whole day
        // reconciled, including items with no entry of their own.
        for item in &items {
            let entries = match self
                .breaker
                .call(|| self.tracker.list_worklogs_for_day(config, &item.key, day))
                .await
            {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(user_id = %config.user_id, operation = "list_worklogs_for_day", issue_key = %item.key, error = %err, "reconciliation failed");
                    return ReconcileOutcome::Failed(err.to_string());
                }
            };
            if entries
                .iter()
                .any(|entry| entry.authored_by(&config.username))
            {
                info!(user_id = %config.user_id, %day, issue_key = %item.key, "existing entry found, day already reconciled");
                return ReconcileOutcome::AlreadyLogged;
            }
        }

        let plan = match AllocationPlan::fair(items, config.daily_seconds(), rng) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(user_id = %config.user_id, error = %err, "allocation failed");
                return ReconcileOutcome::Failed(err.to_string());
            }
        };

        // Independent remote writes; the tracker is append-only, so a
        // failure on one item does not roll back the others.
        let submissions = join_all(plan.entries().iter().map(|(item, seconds)| async move {
            let result = self
                .breaker
                .call(|| self.tracker.create_worklog(config, &item.key, *seconds, day))
                .await;
            (item.key.clone(), *seconds, result)
        }))
        .await;

        let mut logged = Vec::new();
        let mut failed = Vec::new();
        for (key, seconds, result) in submissions {
            match result {
                Ok(()) => logged.push((key, seconds)),
                Err(err) => {
                    warn!(user_id = %config.user_id, issue_key = %key, error = %err, "worklog submission failed");
                    failed.push((key, err.to_string()));
                }
            }
        }

        if failed.is_empty() {
            info!(user_id = %config.user_id, %day, items = plan.len(), total_seconds = plan.total_seconds(), "day reconciled");
            ReconcileOutcome::Logged(plan)
        } else {
            ReconcileOutcome::Partial { logged, failed }
        }
    }
}
