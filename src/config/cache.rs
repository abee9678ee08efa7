// src/config/cache.rs
// Cached per-project config with explicit invalidation

use super::file::ContextConfig;
use crate::layout::ContextLayout;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Holds the first successfully loaded config for each project.
///
/// Missing or corrupt files produce defaults that are neither cached nor
/// written back, so a config created later is still picked up.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: RwLock<HashMap<PathBuf, ContextConfig>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for a project; defaults (named after the directory) when none can be read
    pub async fn load(&self, project_path: &Path) -> ContextConfig {
        match self.get(project_path).await {
            Some(config) => config,
            None => {
                debug!(project = %project_path.display(), "Using default config");
                ContextConfig::for_project(project_path)
            }
        }
    }

    /// Config actually present on disk (or cached), without defaults
    pub async fn get(&self, project_path: &Path) -> Option<ContextConfig> {
        if let Some(config) = self.entries.read().await.get(project_path) {
            return Some(config.clone());
        }

        let layout = ContextLayout::new(project_path);
        let config = ContextConfig::read(&layout.config_path()).await?;
        Some(
            self.entries
                .write()
                .await
                .entry(project_path.to_path_buf())
                .or_insert(config)
                .clone(),
        )
    }

    /// Drop the cached config for one project so the next load re-reads the file
    pub async fn invalidate(&self, project_path: &Path) {
        self.entries.write().await.remove(project_path);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
