//! Structured outcomes of one reconciliation pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::AllocationPlan;

/// Terminal state of reconciling one (user, day) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The tracker returned no worked issues for the day.
    NoWork,

    /// An entry authored by this user already exists on one of the day's
    /// items; the whole day is treated as reconciled.
    AlreadyLogged,

    /// Every planned worklog was submitted.
    Logged(AllocationPlan),

    /// Some submissions landed, some failed. The remote is append-only,
    /// so nothing is rolled back; both halves are reported.
    Partial {
        /// Issue keys and seconds that were submitted.
        logged: Vec<(String, u64)>,
        /// Issue keys and error messages for failed submissions.
        failed: Vec<(String, String)>,
    },

    /// The pass failed before anything was submitted.
    Failed(String),
}

impl ReconcileOutcome {
    /// Short label for log lines and the status surface.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NoWork => "no_work",
            Self::AlreadyLogged => "already_logged",
            Self::Logged(_) => "logged",
            Self::Partial { .. } => "partial",
            Self::Failed(_) => "failed",
        }
    }
}

/// Per-user record handed to the result sink after each pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    pub user_id: String,
    pub guild_id: String,
    pub day: NaiveDate,
    pub outcome: ReconcileOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_every_variant() {
        assert_eq!(ReconcileOutcome::NoWork.label(), "no_work");
        assert_eq!(ReconcileOutcome::AlreadyLogged.label(), "already_logged");
        assert_eq!(
            ReconcileOutcome::Failed("boom".to_string()).label(),
            "failed"
        );
        assert_eq!(
            ReconcileOutcome::Partial {
                logged: vec![("PROJ-1".to_string(), 3600)],
                failed: vec![("PROJ-2".to_string(), "503".to_string())],
            }
            .label(),
            "partial"
        );
    }
}
