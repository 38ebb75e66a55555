//! TOML-file-backed config store.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use wa_core::WorkConfig;
use wa_engine::ConfigStore;

/// Reads per-user tracker configs from a TOML document.
///
/// The file is re-read on every enumeration, so edits take effect on the
/// next run without a restart.
#[derive(Debug)]
pub struct TomlConfigStore {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigsFile {
    #[serde(default)]
    configs: Vec<WorkConfig>,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(path: &Path) -> anyhow::Result<Vec<WorkConfig>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: ConfigsFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(parsed.configs)
    }
}

#[async_trait]
impl ConfigStore for TomlConfigStore {
    async fn enumerate_active(&self) -> anyhow::Result<Vec<WorkConfig>> {
        Ok(Self::read(&self.path)?
            .into_iter()
            .filter(|config| !config.paused)
            .collect())
    }
}

/// Restricts another store to a single user, for `wa run --user`.
pub struct FilteredStore<S> {
    inner: S,
    user_id: String,
}

impl<S> FilteredStore<S> {
    pub fn new(inner: S, user_id: impl Into<String>) -> Self {
        Self {
            inner,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl<S: ConfigStore> ConfigStore for FilteredStore<S> {
    async fn enumerate_active(&self) -> anyhow::Result<Vec<WorkConfig>> {
        Ok(self
            .inner
            .enumerate_active()
            .await?
            .into_iter()
            .filter(|config| config.user_id == self.user_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[configs]]
user_id = "user-1"
guild_id = "guild-1"
tracker_host = "https://example.atlassian.net"
username = "dev@example.com"
api_token = "token-1"
daily_hours = 6

[[configs]]
user_id = "user-2"
guild_id = "guild-1"
tracker_host = "https://example.atlassian.net"
username = "other@example.com"
api_token = "token-2"
paused = true
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("configs.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (temp, path)
    }

    #[tokio::test]
    async fn paused_configs_are_filtered_out() {
        let (_temp, path) = write_sample();
        let store = TomlConfigStore::new(path);
        let configs = store.enumerate_active().await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].user_id, "user-1");
        assert_eq!(configs[0].daily_hours, 6);
    }

    #[tokio::test]
    async fn missing_file_is_an_error_with_the_path() {
        let store = TomlConfigStore::new("/nonexistent/configs.toml");
        let err = store.enumerate_active().await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/configs.toml"));
    }

    #[tokio::test]
    async fn filtered_store_keeps_only_the_requested_user() {
        let (_temp, path) = write_sample();
        let store = FilteredStore::new(TomlConfigStore::new(path), "user-2");
        // user-2 is paused, so nothing remains.
        assert!(store.enumerate_active().await.unwrap().is_empty());
    }
}
