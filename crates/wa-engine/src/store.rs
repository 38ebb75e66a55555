//! Configuration repository seam.

use async_trait::async_trait;

use wa_core::WorkConfig;

/// Enumerates per-user tracker configs.
///
/// The engine reads configs fresh on every run and never caches them;
/// CRUD storage (and credential encryption) belongs to the owning
/// service.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// All configs with `paused = false`.
    async fn enumerate_active(&self) -> anyhow::Result<Vec<WorkConfig>>;
}

/// In-memory store for tests and single-file deployments.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: Vec<WorkConfig>,
}

impl MemoryConfigStore {
    pub fn new(configs: Vec<WorkConfig>) -> Self {
        Self { configs }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn enumerate_active(&self) -> anyhow::Result<Vec<WorkConfig>> {
        Ok(self
            .configs
            .iter()
            .filter(|config| !config.paused)
            .cloned()
            .collect())
    }
}
