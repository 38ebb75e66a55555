//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use wa_engine::{SCHEDULE_CRON, SCHEDULE_DAYS_AGO, SCHEDULE_UTC_OFFSET_HOURS};
use wa_resilience::RetryOptions;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the TOML file holding per-user tracker configs.
    pub configs_path: PathBuf,

    /// Tracker request timeout in seconds.
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub breaker: BreakerConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Rate limit record eviction period in seconds.
    pub sweep_period_secs: u64,
}

/// Backoff knobs for tracker calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn to_options(&self) -> RetryOptions {
        RetryOptions {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryOptions::default()
        }
    }
}

/// Circuit breaker knobs for the shared tracker dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_secs: 60,
        }
    }
}

/// Schedule rule overrides; defaults encode the fixed business-day
/// window (09:00 Tue-Sat, one day back).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub cron: String,
    pub utc_offset_hours: i32,
    pub days_ago: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: SCHEDULE_CRON.to_string(),
            utc_offset_hours: SCHEDULE_UTC_OFFSET_HOURS,
            days_ago: SCHEDULE_DAYS_AGO,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            configs_path: config_dir.join("configs.toml"),
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
            schedule: ScheduleConfig::default(),
            sweep_period_secs: 300,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("WA_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for wa.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wa"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_encode_the_fixed_schedule_window() {
        let config = Config::default();
        assert_eq!(config.schedule.cron, "0 0 9 * * 2-6");
        assert_eq!(config.schedule.days_ago, 1);
    }

    #[test]
    fn retry_config_converts_to_options() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        };
        let options = retry.to_options();
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.base_delay, Duration::from_millis(100));
        assert_eq!(options.max_delay, Duration::from_millis(1000));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "configs_path = \"/tmp/users.toml\"\nsweep_period_secs = 60\n\n[breaker]\nfailure_threshold = 2\nrecovery_secs = 30\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.configs_path, PathBuf::from("/tmp/users.toml"));
        assert_eq!(config.sweep_period_secs, 60);
        assert_eq!(config.breaker.failure_threshold, 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.retry.max_attempts, 3);
    }
}
