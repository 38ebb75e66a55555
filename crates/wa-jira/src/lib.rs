//! Issue-tracker REST client.
//!
//! Covers the tracker operations the reconciliation engine needs:
//! searching for worked issues, listing a day's worklogs, and creating
//! worklogs. Every request goes through the HTTP retry layer; client
//! errors (4xx) come back as [`TrackerError::Rejected`] without retries.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wa_core::{WorkConfig, WorkItem, WorklogEntry};
use wa_resilience::{RetryOptions, retry_request};

/// Default request timeout for tracker calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues fetched per search; a user touches far fewer in one day.
const SEARCH_MAX_RESULTS: u32 = 50;

/// Worklogs start at 09:00 local to the target day.
const WORKLOG_START_HOUR: u32 = 9;

/// Timestamp format the tracker uses, e.g. `2025-01-15T09:00:00.000+0300`.
const TRACKER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Tracker client errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Network failure or a 5xx that survived the retry budget.
    #[error("tracker unavailable: {0}")]
    Unavailable(String),

    /// The tracker rejected the request (bad credentials, permissions,
    /// unknown issue). Never retried.
    #[error("tracker rejected request: status {status}")]
    Rejected { status: u16 },

    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The tracker answered with a payload we could not interpret.
    #[error("invalid tracker response: {0}")]
    InvalidResponse(String),
}

impl TrackerError {
    /// Whether the condition clears on its own and is worth retrying.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// The four tracker operations the engine consumes.
///
/// Implemented by [`JiraClient`] for real traffic and by in-memory mocks
/// in the engine's tests.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Issues the user was assigned to or active on `days_ago` days back.
    async fn find_worked_issues(
        &self,
        config: &WorkConfig,
        days_ago: u32,
    ) -> Result<Vec<WorkItem>, TrackerError>;

    /// Worklogs on `issue_key` scoped to the UTC calendar day of `day`.
    async fn list_worklogs_for_day(
        &self,
        config: &WorkConfig,
        issue_key: &str,
        day: NaiveDate,
    ) -> Result<Vec<WorklogEntry>, TrackerError>;

    /// Creates a worklog of `seconds` on `issue_key`, started 09:00 local
    /// to `day`, without notifying watchers.
    async fn create_worklog(
        &self,
        config: &WorkConfig,
        issue_key: &str,
        seconds: u64,
        day: NaiveDate,
    ) -> Result<(), TrackerError>;
}

/// Builds the JQL for a worked-issues search.
///
/// A per-user template may override the default; `{N}` is interpolated
/// with the days-ago offset.
pub fn build_query(custom_template: Option<&str>, days_ago: u32) -> String {
    custom_template.map_or_else(
        || {
            format!(
                "assignee WAS currentUser() ON -{days_ago}d \
                 AND status WAS \"In Progress\" ON -{days_ago}d"
            )
        },
        |template| template.replace("{N}", &days_ago.to_string()),
    )
}

/// REST client for a Jira-style tracker.
///
/// Safe to clone and share; clones reuse the HTTP connection pool.
/// Credentials are per call (they live in each user's [`WorkConfig`]),
/// so one client serves every tenant.
#[derive(Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    retry: RetryOptions,
    utc_offset: FixedOffset,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("retry", &self.retry)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    /// Creates a client with the given retry policy and local offset for
    /// worklog start times.
    pub fn new(retry: RetryOptions, utc_offset: FixedOffset) -> Result<Self, TrackerError> {
        Self::with_timeout(retry, utc_offset, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        retry: RetryOptions,
        utc_offset: FixedOffset,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TrackerError::ClientBuild)?;
        Ok(Self {
            http,
            retry,
            utc_offset,
        })
    }

    async fn send_checked(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TrackerError> {
        let response = retry_request(|| build().send(), &self.retry)
            .await
            .map_err(|err| TrackerError::Unavailable(err.to_string()))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(TrackerError::Unavailable(format!("status {status}")));
        }
        if status.is_client_error() {
            return Err(TrackerError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Tracker for JiraClient {
    async fn find_worked_issues(
        &self,
        config: &WorkConfig,
        days_ago: u32,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        let jql = build_query(config.custom_query_template.as_deref(), days_ago);
        tracing::debug!(user_id = %config.user_id, %jql, "searching worked issues");

        let url = format!("{}/rest/api/2/search", config.tracker_host);
        let request = SearchRequest {
            jql: &jql,
            fields: &["summary", "assignee"],
            max_results: SEARCH_MAX_RESULTS,
        };
        let response = self
            .send_checked(|| {
                self.http
                    .post(&url)
                    .basic_auth(&config.username, Some(&config.api_token))
                    .json(&request)
            })
            .await?;

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| TrackerError::InvalidResponse(err.to_string()))?;
        Ok(payload
            .issues
            .into_iter()
            .map(|issue| WorkItem {
                id: issue.id,
                key: issue.key,
                summary: issue.fields.summary.unwrap_or_default(),
                assignee_name: issue.fields.assignee.map(|a| a.display_name),
            })
            .collect())
    }

    async fn list_worklogs_for_day(
        &self,
        config: &WorkConfig,
        issue_key: &str,
        day: NaiveDate,
    ) -> Result<Vec<WorklogEntry>, TrackerError> {
        let url = format!(
            "{}/rest/api/2/issue/{issue_key}/worklog",
            config.tracker_host
        );
        let response = self
            .send_checked(|| {
                self.http
                    .get(&url)
                    .basic_auth(&config.username, Some(&config.api_token))
            })
            .await?;

        let payload: WorklogListResponse = response
            .json()
            .await
            .map_err(|err| TrackerError::InvalidResponse(err.to_string()))?;

        let mut entries = Vec::new();
        for worklog in payload.worklogs {
            let Some(started_at) = parse_tracker_time(&worklog.started) else {
                tracing::warn!(issue_key, started = %worklog.started, "skipping worklog with unparseable start");
                continue;
            };
            if started_at.date_naive() != day {
                continue;
            }
            entries.push(WorklogEntry {
                author_email: worklog
                    .author
                    .and_then(|author| author.email_address)
                    .unwrap_or_default(),
                time_spent_seconds: worklog.time_spent_seconds,
                time_spent_display: worklog.time_spent,
                started_at,
            });
        }
        Ok(entries)
    }

    async fn create_worklog(
        &self,
        config: &WorkConfig,
        issue_key: &str,
        seconds: u64,
        day: NaiveDate,
    ) -> Result<(), TrackerError> {
        let url = format!(
            "{}/rest/api/2/issue/{issue_key}/worklog",
            config.tracker_host
        );
        let started = worklog_start(day, self.utc_offset);
        tracing::debug!(user_id = %config.user_id, issue_key, seconds, %started, "creating worklog");

        let request = CreateWorklogRequest {
            time_spent_seconds: seconds,
            started: &started,
        };
        self.send_checked(|| {
            self.http
                .post(&url)
                .query(&[("notifyUsers", "false")])
                .basic_auth(&config.username, Some(&config.api_token))
                .json(&request)
        })
        .await?;
        Ok(())
    }
}

/// Renders the fixed 09:00-local start timestamp for a worklog.
///
/// 09:00 exists on every calendar day and a fixed offset has no
/// ambiguous local times, so the fallback never fires.
fn worklog_start(day: NaiveDate, offset: FixedOffset) -> String {
    day.and_hms_opt(WORKLOG_START_HOUR, 0, 0)
        .and_then(|naive| naive.and_local_timezone(offset).single())
        .unwrap_or_default()
        .format(TRACKER_TIME_FORMAT)
        .to_string()
}

/// Parses the tracker's timestamp format, falling back to RFC 3339.
fn parse_tracker_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TRACKER_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    jql: &'a str,
    fields: &'a [&'a str],
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssuePayload>,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    id: String,
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    summary: Option<String>,
    assignee: Option<AssigneePayload>,
}

#[derive(Debug, Deserialize)]
struct AssigneePayload {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct WorklogListResponse {
    #[serde(default)]
    worklogs: Vec<WorklogPayload>,
}

#[derive(Debug, Deserialize)]
struct WorklogPayload {
    author: Option<AuthorPayload>,
    #[serde(rename = "timeSpentSeconds")]
    time_spent_seconds: u64,
    #[serde(rename = "timeSpent", default)]
    time_spent: String,
    started: String,
}

#[derive(Debug, Deserialize)]
struct AuthorPayload {
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateWorklogRequest<'a> {
    #[serde(rename = "timeSpentSeconds")]
    time_spent_seconds: u64,
    started: &'a str,
}
