//! Core domain logic for the worklog autopilot.
//!
//! This crate contains the pure parts of the reconciliation engine:
//! - Allocation: splitting a day's total across worked issues
//! - Domain types: work items, worklog entries, per-user tracker configs
//! - Outcomes: the structured result of one reconciliation pass
//! - Day math: target-day computation and the weekend check for the
//!   on-demand path

mod allocation;
pub mod day;
mod outcome;
mod types;

pub use allocation::{
    AllocationError, AllocationPlan, CHUNK_MENU_SECONDS, MIN_CHUNK_SECONDS, even_distribution,
    fair_distribution,
};
pub use outcome::{ReconcileOutcome, UserOutcome};
pub use types::{WorkConfig, WorkItem, WorklogEntry, default_daily_hours};
