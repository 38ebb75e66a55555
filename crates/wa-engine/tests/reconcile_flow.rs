//! End-to-end orchestrator scenarios against an in-memory tracker.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use wa_core::{ReconcileOutcome, UserOutcome, WorkConfig, WorkItem, WorklogEntry};
use wa_engine::{Engine, MemoryConfigStore, Reconciler, ResultSink};
use wa_jira::{Tracker, TrackerError};
use wa_resilience::CircuitBreaker;

#[derive(Default)]
struct MockTracker {
    issues_by_user: HashMap<String, Vec<WorkItem>>,
    worklogs: Mutex<HashMap<String, Vec<WorklogEntry>>>,
    fail_find_for: HashSet<String>,
    fail_create_for: HashSet<String>,
    find_calls: Mutex<u32>,
    create_calls: Mutex<Vec<(String, u64)>>,
}

impl MockTracker {
    fn with_issues(user_id: &str, keys: &[&str]) -> Self {
        let mut tracker = Self::default();
        tracker.add_user(user_id, keys);
        tracker
    }

    fn add_user(&mut self, user_id: &str, keys: &[&str]) {
        let items = keys
            .iter()
            .map(|key| WorkItem {
                id: format!("id-{key}"),
                key: (*key).to_string(),
                summary: format!("work on {key}"),
                assignee_name: Some("Dev".to_string()),
            })
            .collect();
        self.issues_by_user.insert(user_id.to_string(), items);
    }

    fn seed_worklog(&self, issue_key: &str, author_email: &str, day: NaiveDate) {
        let started_at = Utc
            .from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap());
        self.worklogs
            .lock()
            .unwrap()
            .entry(issue_key.to_string())
            .or_default()
            .push(WorklogEntry {
                author_email: author_email.to_string(),
                time_spent_seconds: 3600,
                time_spent_display: "1h".to_string(),
                started_at,
            });
    }

    fn submitted(&self) -> Vec<(String, u64)> {
        self.create_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tracker for MockTracker {
    async fn find_worked_issues(
        &self,
        config: &WorkConfig,
        _days_ago: u32,
    ) -> Result<Vec<WorkItem>, TrackerError> {
        *self.find_calls.lock().unwrap() += 1;
        if self.fail_find_for.contains(&config.user_id) {
            return Err(TrackerError::Unavailable("status 503".to_string()));
        }
        Ok(self
            .issues_by_user
            .get(&config.user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_worklogs_for_day(
        &self,
        _config: &WorkConfig,
        issue_key: &str,
        day: NaiveDate,
    ) -> Result<Vec<WorklogEntry>, TrackerError> {
        Ok(self
            .worklogs
            .lock()
            .unwrap()
            .get(issue_key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.started_at.date_naive() == day)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_worklog(
        &self,
        config: &WorkConfig,
        issue_key: &str,
        seconds: u64,
        day: NaiveDate,
    ) -> Result<(), TrackerError> {
        if self.fail_create_for.contains(issue_key) {
            return Err(TrackerError::Unavailable("status 503".to_string()));
        }
        self.create_calls
            .lock()
            .unwrap()
            .push((issue_key.to_string(), seconds));
        self.seed_worklog(issue_key, &config.username, day);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    outcomes: Mutex<Vec<UserOutcome>>,
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn deliver(&self, outcome: &UserOutcome) -> anyhow::Result<()> {
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

fn config(user_id: &str, daily_hours: u32) -> WorkConfig {
    WorkConfig {
        user_id: user_id.to_string(),
        guild_id: "guild-1".to_string(),
        tracker_host: "https://example.atlassian.net".to_string(),
        username: format!("{user_id}@example.com"),
        api_token: "token".to_string(),
        custom_query_template: None,
        daily_hours,
        paused: false,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn reconciler(tracker: Arc<MockTracker>) -> Reconciler {
    let breaker = Arc::new(CircuitBreaker::new(10, Duration::from_secs(60)));
    Reconciler::new(tracker, breaker)
}

#[tokio::test]
async fn six_hours_across_two_issues_submits_two_worklogs() {
    let tracker = Arc::new(MockTracker::with_issues("user-1", &["PROJ-1", "PROJ-2"]));
    let reconciler = reconciler(Arc::clone(&tracker));

    let mut rng = StdRng::seed_from_u64(11);
    let outcome = reconciler
        .reconcile_with_rng(&config("user-1", 6), day(), 1, &mut rng)
        .await;

    let ReconcileOutcome::Logged(plan) = outcome else {
        panic!("expected logged outcome, got {outcome:?}");
    };
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.total_seconds(), 21_600);

    let submitted = tracker.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted.iter().map(|(_, s)| s).sum::<u64>(), 21_600);
}

#[tokio::test]
async fn existing_entry_by_the_user_skips_the_day() {
    let tracker = Arc::new(MockTracker::with_issues("user-1", &["PROJ-1"]));
    tracker.seed_worklog("PROJ-1", "user-1@example.com", day());
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    assert_eq!(outcome, ReconcileOutcome::AlreadyLogged);
    assert!(tracker.submitted().is_empty());
}

#[tokio::test]
async fn one_logged_item_suppresses_all_other_items_for_the_day() {
    // Day-scoped skip: an entry on PROJ-1 alone marks the whole day
    // reconciled, so PROJ-2 and PROJ-3 get nothing either.
    let tracker = Arc::new(MockTracker::with_issues(
        "user-1",
        &["PROJ-1", "PROJ-2", "PROJ-3"],
    ));
    tracker.seed_worklog("PROJ-1", "user-1@example.com", day());
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    assert_eq!(outcome, ReconcileOutcome::AlreadyLogged);
    assert!(tracker.submitted().is_empty());
}

#[tokio::test]
async fn entries_by_other_authors_do_not_count() {
    let tracker = Arc::new(MockTracker::with_issues("user-1", &["PROJ-1"]));
    tracker.seed_worklog("PROJ-1", "colleague@example.com", day());
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    assert!(matches!(outcome, ReconcileOutcome::Logged(_)));
    assert_eq!(tracker.submitted().len(), 1);
}

#[tokio::test]
async fn entries_on_other_days_do_not_count() {
    let tracker = Arc::new(MockTracker::with_issues("user-1", &["PROJ-1"]));
    let earlier = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
    tracker.seed_worklog("PROJ-1", "user-1@example.com", earlier);
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    assert!(matches!(outcome, ReconcileOutcome::Logged(_)));
}

#[tokio::test]
async fn reconciling_twice_submits_nothing_the_second_time() {
    let tracker = Arc::new(MockTracker::with_issues("user-1", &["PROJ-1", "PROJ-2"]));
    let reconciler = reconciler(Arc::clone(&tracker));
    let cfg = config("user-1", 8);

    let first = reconciler.reconcile(&cfg, day(), 1).await;
    assert!(matches!(first, ReconcileOutcome::Logged(_)));
    assert_eq!(tracker.submitted().len(), 2);

    let second = reconciler.reconcile(&cfg, day(), 1).await;
    assert_eq!(second, ReconcileOutcome::AlreadyLogged);
    assert_eq!(tracker.submitted().len(), 2);
}

#[tokio::test]
async fn no_worked_issues_is_a_no_work_outcome() {
    let tracker = Arc::new(MockTracker::default());
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    assert_eq!(outcome, ReconcileOutcome::NoWork);
    assert!(tracker.submitted().is_empty());
}

#[tokio::test]
async fn failed_submission_on_one_item_is_partial_not_rolled_back() {
    let mut tracker = MockTracker::with_issues("user-1", &["PROJ-1", "PROJ-2"]);
    tracker.fail_create_for.insert("PROJ-2".to_string());
    let tracker = Arc::new(tracker);
    let reconciler = reconciler(Arc::clone(&tracker));

    let outcome = reconciler.reconcile(&config("user-1", 8), day(), 1).await;

    let ReconcileOutcome::Partial { logged, failed } = outcome else {
        panic!("expected partial outcome, got {outcome:?}");
    };
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].0, "PROJ-1");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "PROJ-2");
    // The successful submission stays.
    assert_eq!(tracker.submitted().len(), 1);
}

#[tokio::test]
async fn one_users_failure_does_not_abort_the_batch() {
    let mut tracker = MockTracker::default();
    tracker.add_user("user-a", &["A-1"]);
    tracker.add_user("user-b", &["B-1"]);
    tracker.fail_find_for.insert("user-a".to_string());
    let tracker = Arc::new(tracker);

    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(
        reconciler(Arc::clone(&tracker)),
        Arc::new(MemoryConfigStore::new(vec![
            config("user-a", 8),
            config("user-b", 8),
        ])),
        Arc::clone(&sink) as Arc<dyn ResultSink>,
    );

    let delivered = engine.run_batch(day(), 1).await;

    assert_eq!(delivered, 2);
    let outcomes = sink.outcomes.lock().unwrap();
    assert!(matches!(outcomes[0].outcome, ReconcileOutcome::Failed(_)));
    assert!(matches!(outcomes[1].outcome, ReconcileOutcome::Logged(_)));
}

#[tokio::test]
async fn open_breaker_fails_later_users_fast() {
    let mut tracker = MockTracker::default();
    tracker.add_user("user-a", &["A-1"]);
    tracker.add_user("user-b", &["B-1"]);
    tracker.fail_find_for.insert("user-a".to_string());
    let tracker = Arc::new(tracker);

    // Threshold 1: user A's failure opens the shared breaker.
    let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(60)));
    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(
        Reconciler::new(Arc::clone(&tracker) as Arc<dyn Tracker>, breaker),
        Arc::new(MemoryConfigStore::new(vec![
            config("user-a", 8),
            config("user-b", 8),
        ])),
        Arc::clone(&sink) as Arc<dyn ResultSink>,
    );

    let delivered = engine.run_batch(day(), 1).await;
    assert_eq!(delivered, 2);

    let outcomes = sink.outcomes.lock().unwrap();
    let ReconcileOutcome::Failed(reason) = &outcomes[1].outcome else {
        panic!("expected fast failure for user-b");
    };
    assert!(reason.contains("circuit open"), "reason: {reason}");
    // The tracker was only reached for user A.
    assert_eq!(*tracker.find_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn paused_configs_are_not_reconciled() {
    let mut tracker = MockTracker::default();
    tracker.add_user("user-a", &["A-1"]);
    tracker.add_user("user-b", &["B-1"]);
    let tracker = Arc::new(tracker);

    let mut paused = config("user-b", 8);
    paused.paused = true;

    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(
        reconciler(Arc::clone(&tracker)),
        Arc::new(MemoryConfigStore::new(vec![config("user-a", 8), paused])),
        Arc::clone(&sink) as Arc<dyn ResultSink>,
    );

    let delivered = engine.run_batch(day(), 1).await;

    assert_eq!(delivered, 1);
    assert_eq!(sink.outcomes.lock().unwrap()[0].user_id, "user-a");
}
