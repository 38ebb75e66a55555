//! Reconciliation engine: orchestrator, scheduler, and collaborator seams.
//!
//! The orchestrator drives the per-user state machine (fetch worked
//! issues, check existing logs, allocate, submit). The scheduler fires
//! one batch per business day. Configuration enumeration and outcome
//! delivery are external collaborators behind traits.

mod engine;
mod reconcile;
mod schedule;
mod sink;
mod store;

pub use engine::Engine;
pub use reconcile::Reconciler;
pub use schedule::{
    SCHEDULE_CRON, SCHEDULE_DAYS_AGO, SCHEDULE_UTC_OFFSET_HOURS, ScheduleRule, Scheduler,
};
pub use sink::{LogSink, ResultSink};
pub use store::{ConfigStore, MemoryConfigStore};
