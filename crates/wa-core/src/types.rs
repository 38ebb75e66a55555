//! Domain types shared across the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default working hours per day when a config does not override it.
pub const fn default_daily_hours() -> u32 {
    8
}

/// Per-user tracker configuration.
///
/// Owned by the configuration repository and read fresh on every run;
/// the engine never caches these across runs.
#[derive(Clone, Serialize, Deserialize)]
pub struct WorkConfig {
    /// Chat-platform user this config belongs to.
    pub user_id: String,

    /// Chat-platform guild the config was registered in.
    pub guild_id: String,

    /// Base URL of the issue tracker, e.g. `https://example.atlassian.net`.
    pub tracker_host: String,

    /// Tracker account name (email for cloud instances).
    pub username: String,

    /// API token used for basic auth.
    pub api_token: String,

    /// Optional JQL override; `{N}` is replaced with the days-ago offset.
    #[serde(default)]
    pub custom_query_template: Option<String>,

    /// Hours to log per reconciled day.
    #[serde(default = "default_daily_hours")]
    pub daily_hours: u32,

    /// Paused configs are skipped by every scheduled run.
    #[serde(default)]
    pub paused: bool,
}

impl fmt::Debug for WorkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkConfig")
            .field("user_id", &self.user_id)
            .field("guild_id", &self.guild_id)
            .field("tracker_host", &self.tracker_host)
            .field("username", &self.username)
            .field("api_token", &"[REDACTED]")
            .field("custom_query_template", &self.custom_query_template)
            .field("daily_hours", &self.daily_hours)
            .field("paused", &self.paused)
            .finish()
    }
}

impl WorkConfig {
    /// Seconds to allocate across the day's work items.
    pub const fn daily_seconds(&self) -> u64 {
        self.daily_hours as u64 * 3600
    }
}

/// An issue the user was assigned to or active on during the target day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Tracker-internal issue ID.
    pub id: String,

    /// Human-facing issue key, e.g. `PROJ-123`.
    pub key: String,

    /// Issue summary line.
    pub summary: String,

    /// Display name of the current assignee, if any.
    pub assignee_name: Option<String>,
}

/// A recorded unit of time spent on a work item.
///
/// Existing entries are read signals for the idempotency check; new
/// entries are write intents produced from an allocation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklogEntry {
    /// Email of the account that authored the entry.
    pub author_email: String,

    /// Logged duration in seconds.
    pub time_spent_seconds: u64,

    /// Tracker-rendered duration, e.g. `2h 30m`.
    pub time_spent_display: String,

    /// When the logged work started.
    pub started_at: DateTime<Utc>,
}

impl WorklogEntry {
    /// Whether this entry was authored by the given account.
    ///
    /// Tracker accounts are matched case-insensitively on email.
    pub fn authored_by(&self, username: &str) -> bool {
        self.author_email.eq_ignore_ascii_case(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorkConfig {
        WorkConfig {
            user_id: "user-1".to_string(),
            guild_id: "guild-1".to_string(),
            tracker_host: "https://example.atlassian.net".to_string(),
            username: "dev@example.com".to_string(),
            api_token: "super-secret-token".to_string(),
            custom_query_template: None,
            daily_hours: default_daily_hours(),
            paused: false,
        }
    }

    #[test]
    fn debug_redacts_api_token() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn daily_seconds_uses_daily_hours() {
        let mut cfg = config();
        cfg.daily_hours = 6;
        assert_eq!(cfg.daily_seconds(), 21_600);
    }

    #[test]
    fn authored_by_is_case_insensitive() {
        let entry = WorklogEntry {
            author_email: "Dev@Example.com".to_string(),
            time_spent_seconds: 3600,
            time_spent_display: "1h".to_string(),
            started_at: Utc::now(),
        };
        assert!(entry.authored_by("dev@example.com"));
        assert!(!entry.authored_by("other@example.com"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: WorkConfig = serde_json::from_str(
            r#"{
                "user_id": "u",
                "guild_id": "g",
                "tracker_host": "https://example.atlassian.net",
                "username": "dev@example.com",
                "api_token": "t"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.daily_hours, 8);
        assert!(!cfg.paused);
        assert!(cfg.custom_query_template.is_none());
    }
}
