// src/config/file.rs
// File-based configuration from <project>/.context/config.json

use crate::error::Result;
use crate::tokens::DEFAULT_MAX_TOKENS;
use crate::utils::project_basename;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_WARNING_THRESHOLD: u64 = 12_000;
pub const DEFAULT_CONTEXT_DIRECTORY: &str = ".context";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Contents of config.json. Keys are camelCase on disk; absent keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub max_tokens_per_session: u64,
    pub warning_threshold: u64,
    pub auto_summarize: bool,
    pub summary_length: SummaryLength,
    pub context_directory: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            created_at: None,
            max_tokens_per_session: DEFAULT_MAX_TOKENS,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            auto_summarize: true,
            summary_length: SummaryLength::Medium,
            context_directory: DEFAULT_CONTEXT_DIRECTORY.to_string(),
        }
    }
}

impl ContextConfig {
    /// Defaults for a project, named after the last segment of its path
    pub fn for_project(project_path: &Path) -> Self {
        Self {
            project_name: Some(project_basename(project_path)),
            ..Self::default()
        }
    }

    /// Config written by bootstrap: project defaults plus a creation stamp
    pub fn seeded(project_path: &Path, name: Option<&str>) -> Self {
        let mut config = Self::for_project(project_path);
        if let Some(name) = name {
            config.project_name = Some(name.to_string());
        }
        config.created_at = Some(Utc::now());
        config
    }

    /// Read config.json. `None` when the file is missing or cannot be parsed.
    pub async fn read(config_path: &Path) -> Option<Self> {
        let contents = match tokio::fs::read_to_string(config_path).await {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %config_path.display(), error = %e, "Config file not readable");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => {
                debug!(path = %config_path.display(), "Loaded config from file");
                Some(config)
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Failed to parse config file");
                None
            }
        }
    }

    /// Write config.json pretty-printed
    pub async fn write(&self, config_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(config_path, json).await?;
        Ok(())
    }
}
