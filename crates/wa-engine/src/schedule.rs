//! Scheduled trigger for the daily reconciliation batch.
//!
//! One named job at a fixed minute/hour on a fixed weekday range in a
//! fixed timezone offset. The business-day window is encoded in the
//! weekday range itself: firing Tue-Sat with a one-day offset covers
//! Mon-Fri work without a runtime day-of-week check.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use croner::Cron;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use wa_core::day::target_day;

use crate::engine::Engine;

/// 09:00 Tuesday through Saturday (croner: sec min hour dom month dow).
pub const SCHEDULE_CRON: &str = "0 0 9 * * 2-6";

/// The trigger's fixed timezone offset from UTC, in hours.
pub const SCHEDULE_UTC_OFFSET_HOURS: i32 = 3;

/// Scheduled runs reconcile the previous day.
pub const SCHEDULE_DAYS_AGO: u32 = 1;

/// Cron rule plus the offset semantics that go with it.
#[derive(Debug, Clone)]
pub struct ScheduleRule {
    pub cron: String,
    pub utc_offset: FixedOffset,
    pub days_ago: u32,
}

impl Default for ScheduleRule {
    fn default() -> Self {
        Self {
            cron: SCHEDULE_CRON.to_string(),
            // The constant is in range; the UTC fallback never fires.
            utc_offset: FixedOffset::east_opt(SCHEDULE_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
            days_ago: SCHEDULE_DAYS_AGO,
        }
    }
}

/// Fires the engine once per business day.
///
/// Single active instance assumed; scheduler state is process-local and
/// lost on restart.
pub struct Scheduler {
    engine: Arc<Engine>,
    rule: ScheduleRule,
    started: AtomicBool,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_rule(engine, ScheduleRule::default())
    }

    pub fn with_rule(engine: Arc<Engine>, rule: ScheduleRule) -> Self {
        Self {
            engine,
            rule,
            started: AtomicBool::new(false),
        }
    }

    /// Spawns the trigger loop.
    ///
    /// Idempotent: a second call does not register the job twice and
    /// returns `None`.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("schedule already initialized, skipping");
            return None;
        }
        let cron = match Cron::new(&self.rule.cron).with_seconds_optional().parse() {
            Ok(cron) => cron,
            Err(err) => {
                error!(rule = %self.rule.cron, error = %err, "invalid schedule rule");
                return None;
            }
        };
        info!(rule = %self.rule.cron, offset = %self.rule.utc_offset, "schedule initialized");

        let scheduler = Arc::clone(self);
        Some(tokio::spawn(async move {
            scheduler.run_loop(&cron).await;
        }))
    }

    async fn run_loop(&self, cron: &Cron) {
        loop {
            let now = Utc::now().with_timezone(&self.rule.utc_offset);
            let next = match cron.find_next_occurrence(&now, false) {
                Ok(next) => next,
                Err(err) => {
                    error!(error = %err, "no next schedule occurrence, stopping trigger");
                    return;
                }
            };
            info!(next = %next, "next scheduled reconciliation");
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            sleep(wait).await;

            let day = target_day(Utc::now(), self.rule.utc_offset, self.rule.days_ago);
            self.engine.run_batch(day, self.rule.days_ago).await;
        }
    }
}
