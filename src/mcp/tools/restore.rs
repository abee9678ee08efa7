// src/mcp/tools/restore.rs
// Restoration and project summary tools

use super::require;
use crate::mcp::{ContinuumServer, ProjectRequest};
use std::fmt::Write;
use std::path::PathBuf;

pub async fn restore_session(server: &ContinuumServer, req: ProjectRequest) -> Result<String, String> {
    let project_path = PathBuf::from(require(req.project_path, "projectPath")?);
    let prompt = server.restorer.restoration_prompt(&project_path).await;
    Ok(prompt.full_prompt)
}

pub async fn project_summary(server: &ContinuumServer, req: ProjectRequest) -> Result<String, String> {
    let project_path = PathBuf::from(require(req.project_path, "projectPath")?);
    let summary = server.restorer.project_summary(&project_path).await;

    let mut response = format!("📋 Project Summary: {}\n\n", summary.name);
    let _ = writeln!(response, "📁 Path: {}", summary.path.display());
    let _ = writeln!(response, "💬 Total Sessions: {}", summary.total_sessions);
    let _ = writeln!(response, "🎯 Total Tokens: {}", summary.total_tokens);
    let _ = writeln!(
        response,
        "⏰ Last Activity: {}",
        summary.last_activity.format("%Y-%m-%d")
    );
    if let Some(phase) = &summary.current_phase {
        let _ = writeln!(response, "🚀 Current Phase: {}", phase);
    }

    if !summary.key_milestones.is_empty() {
        response.push_str("\n📍 Key Milestones:\n");
        for milestone in &summary.key_milestones {
            let _ = writeln!(response, "{} {}", milestone.status.icon(), milestone.title);
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewMilestone, milestones};
    use crate::types::MilestoneStatus;
    use tempfile::TempDir;

    fn req(dir: &TempDir) -> ProjectRequest {
        ProjectRequest {
            project_path: Some(dir.path().to_string_lossy().into_owned()),
        }
    }

    #[tokio::test]
    async fn test_requires_project_path() {
        let server = ContinuumServer::default();
        assert_eq!(
            restore_session(&server, ProjectRequest::default()).await.unwrap_err(),
            "projectPath is required"
        );
        assert_eq!(
            project_summary(&server, ProjectRequest { project_path: Some(String::new()) })
                .await
                .unwrap_err(),
            "projectPath is required"
        );
    }

    #[tokio::test]
    async fn test_restore_empty_project() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();
        let text = restore_session(&server, req(&dir)).await.unwrap();
        assert!(text.starts_with("# Context Restoration for "));
        assert!(text.contains("No previous sessions found"));
        assert!(text.contains("**Current Phase:** Development"));
    }

    #[tokio::test]
    async fn test_summary_lists_milestones() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();
        milestones::append(dir.path(), NewMilestone::new("Older"))
            .await
            .unwrap();
        milestones::append(
            dir.path(),
            NewMilestone::new("Newer").status(MilestoneStatus::Completed),
        )
        .await
        .unwrap();

        let text = project_summary(&server, req(&dir)).await.unwrap();
        assert!(text.contains("💬 Total Sessions: 0"));
        assert!(text.contains("🎯 Total Tokens: 0"));
        assert!(!text.contains("🚀 Current Phase"));
        assert!(text.ends_with("\n📍 Key Milestones:\n✅ Newer\n⏳ Older\n"));
    }
}
