// src/layout.rs
// On-disk layout of a project's .context directory and its bootstrap

use crate::config::ContextConfig;
use crate::config::file::DEFAULT_CONTEXT_DIRECTORY;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SESSIONS_DIR: &str = "sessions";
pub const PROGRESS_DIR: &str = "progress";
pub const ARTIFACTS_DIR: &str = "artifacts";
pub const CURRENT_SESSION_FILE: &str = "current_session.md";

/// Paths under `<project>/.context/`
#[derive(Debug, Clone)]
pub struct ContextLayout {
    project_path: PathBuf,
    context_dir: PathBuf,
}

impl ContextLayout {
    pub fn new(project_path: impl AsRef<Path>) -> Self {
        let project_path = project_path.as_ref().to_path_buf();
        let context_dir = project_path.join(DEFAULT_CONTEXT_DIRECTORY);
        Self {
            project_path,
            context_dir,
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.context_dir.join("config.json")
    }

    pub fn readme_path(&self) -> PathBuf {
        self.context_dir.join("README.md")
    }

    pub fn project_summary_path(&self) -> PathBuf {
        self.context_dir.join("project_summary.md")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.context_dir.join(SESSIONS_DIR)
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.context_dir.join(PROGRESS_DIR)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.context_dir.join(ARTIFACTS_DIR)
    }

    pub fn milestones_path(&self) -> PathBuf {
        self.progress_dir().join("milestones.md")
    }

    pub fn decisions_path(&self) -> PathBuf {
        self.progress_dir().join("decisions.md")
    }

    pub fn current_session_path(&self) -> PathBuf {
        self.sessions_dir().join(CURRENT_SESSION_FILE)
    }

    /// `sessions/session_<id>_<YYYY-MM-DD>.md`
    pub fn session_record_path(&self, session_id: &str, date: &str) -> PathBuf {
        self.sessions_dir()
            .join(format!("session_{}_{}.md", session_id, date))
    }

    /// Create the directory tree, then seed config.json and README.md if absent.
    ///
    /// Idempotent. Returns true when a new config.json was written.
    pub async fn ensure_structure(&self, project_name: Option<&str>) -> Result<bool> {
        self.ensure_structure_with(&ContextConfig::seeded(&self.project_path, project_name))
            .await
    }

    /// Same as [`ensure_structure`](Self::ensure_structure) with an explicit seed config
    pub async fn ensure_structure_with(&self, seed: &ContextConfig) -> Result<bool> {
        for dir in [self.sessions_dir(), self.progress_dir(), self.artifacts_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        let config_path = self.config_path();
        let seeded = if tokio::fs::try_exists(&config_path).await? {
            debug!(path = %config_path.display(), "Config already present");
            false
        } else {
            seed.write(&config_path).await?;
            info!(path = %config_path.display(), "Seeded default config");
            true
        };

        let readme_path = self.readme_path();
        if !tokio::fs::try_exists(&readme_path).await? {
            let name = seed
                .project_name
                .clone()
                .unwrap_or_else(|| crate::utils::project_basename(&self.project_path));
            tokio::fs::write(&readme_path, usage_guide(&name, &self.project_path)).await?;
        }

        Ok(seeded)
    }

    /// Create only the progress directory
    pub async fn ensure_progress_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.progress_dir()).await?;
        Ok(())
    }
}

fn usage_guide(project_name: &str, project_path: &Path) -> String {
    format!(
        "# {name}

## Context Management

This project records AI session context with continuum.

### Structure

- `.context/sessions/` - Session transcripts and summaries
- `.context/progress/` - Milestones and decisions
- `.context/artifacts/` - Generated documents and diagrams

### Usage

Start the MCP server:
```bash
continuum serve
```

Or register it with an MCP client:
```json
{{
  \"mcpServers\": {{
    \"continuum\": {{
      \"command\": \"continuum\",
      \"args\": [\"serve\"],
      \"cwd\": \"{path}\"
    }}
  }}
}}
```
",
        name = project_name,
        path = project_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = ContextLayout::new("/work/app");
        assert_eq!(layout.context_dir(), Path::new("/work/app/.context"));
        assert_eq!(
            layout.milestones_path(),
            PathBuf::from("/work/app/.context/progress/milestones.md")
        );
        assert_eq!(
            layout.session_record_path("abc", "2025-01-02"),
            PathBuf::from("/work/app/.context/sessions/session_abc_2025-01-02.md")
        );
    }

    #[tokio::test]
    async fn test_ensure_structure_creates_everything() {
        let dir = TempDir::new().unwrap();
        let layout = ContextLayout::new(dir.path());

        let seeded = layout.ensure_structure(None).await.unwrap();
        assert!(seeded);
        assert!(layout.sessions_dir().is_dir());
        assert!(layout.progress_dir().is_dir());
        assert!(layout.artifacts_dir().is_dir());
        assert!(layout.config_path().is_file());
        assert!(layout.readme_path().is_file());
    }

    #[tokio::test]
    async fn test_ensure_structure_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = ContextLayout::new(dir.path());

        assert!(layout.ensure_structure(Some("Named")).await.unwrap());
        let before = std::fs::read_to_string(layout.config_path()).unwrap();

        assert!(!layout.ensure_structure(Some("Other")).await.unwrap());
        let after = std::fs::read_to_string(layout.config_path()).unwrap();
        assert_eq!(before, after);
        assert!(after.contains("Named"));
    }

    #[tokio::test]
    async fn test_ensure_structure_with_seed_limit() {
        let dir = TempDir::new().unwrap();
        let layout = ContextLayout::new(dir.path());
        let seed = ContextConfig {
            max_tokens_per_session: 40_000,
            ..ContextConfig::seeded(dir.path(), None)
        };

        assert!(layout.ensure_structure_with(&seed).await.unwrap());
        let config = ContextConfig::read(&layout.config_path()).await.unwrap();
        assert_eq!(config.max_tokens_per_session, 40_000);
    }
}
