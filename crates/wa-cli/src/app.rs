//! Wiring of the engine and its collaborators from application config.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::FixedOffset;

use wa_engine::{ConfigStore, Engine, LogSink, Reconciler, ScheduleRule};
use wa_jira::JiraClient;
use wa_resilience::{CircuitBreaker, RateLimitRule, RateLimiter};

use crate::config::Config;
use crate::store::{FilteredStore, TomlConfigStore};

/// Action name the on-demand reconcile passes through the rate limiter.
pub const RUN_ACTION: &str = "reconcile.run";

/// Built application: engine, limiter, and the resolved schedule rule.
pub struct App {
    pub engine: Arc<Engine>,
    pub limiter: Arc<RateLimiter>,
    pub rule: ScheduleRule,
    pub sweep_period: Duration,
}

impl App {
    /// Builds the engine from config, optionally restricted to one user.
    pub fn build(config: &Config, user_filter: Option<&str>) -> anyhow::Result<Self> {
        let utc_offset = FixedOffset::east_opt(config.schedule.utc_offset_hours * 3600)
            .context("schedule utc_offset_hours is out of range")?;

        let client = JiraClient::with_timeout(
            config.retry.to_options(),
            utc_offset,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let breaker = Arc::new(CircuitBreaker::new(
            config.breaker.failure_threshold,
            Duration::from_secs(config.breaker.recovery_secs),
        ));
        let reconciler = Reconciler::new(Arc::new(client), breaker);

        let store: Arc<dyn ConfigStore> = match user_filter {
            Some(user_id) => Arc::new(FilteredStore::new(
                TomlConfigStore::new(&config.configs_path),
                user_id,
            )),
            None => Arc::new(TomlConfigStore::new(&config.configs_path)),
        };
        let engine = Arc::new(Engine::new(reconciler, store, Arc::new(LogSink)));

        Ok(Self {
            engine,
            limiter: Arc::new(RateLimiter::new(default_rules())),
            rule: ScheduleRule {
                cron: config.schedule.cron.clone(),
                utc_offset,
                days_ago: config.schedule.days_ago,
            },
            sweep_period: Duration::from_secs(config.sweep_period_secs),
        })
    }
}

/// Rules for the interactive surface; scheduled runs bypass the limiter.
fn default_rules() -> HashMap<String, RateLimitRule> {
    let mut rules = HashMap::new();
    rules.insert(
        RUN_ACTION.to_string(),
        RateLimitRule {
            max_attempts: 3,
            window: Duration::from_secs(60),
            block_duration: Some(Duration::from_secs(300)),
        },
    );
    rules
}
