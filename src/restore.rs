// src/restore.rs
// Project summaries and restoration prompts rebuilt from .context/ files

use crate::config::ConfigStore;
use crate::error::{ContinuumError, Result};
use crate::layout::ContextLayout;
use crate::ledger::{decisions, milestones};
use crate::session::SessionTracker;
use crate::types::{
    Milestone, MilestoneStatus, ProjectSummary, RestorationPrompt, Session, TechnicalDecision,
};
use crate::utils::{project_basename, single_line};
use chrono::Utc;
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const PHASE_LABEL: &str = "**Current Phase:**";
const KEY_MILESTONES: usize = 5;
const CONTEXT_DECISIONS: usize = 3;
const STEP_DECISIONS: usize = 2;
const MAX_NEXT_STEPS: usize = 5;

/// Read-side view over a project's recorded history
#[derive(Debug, Clone, Default)]
pub struct Restorer {
    configs: Arc<ConfigStore>,
}

impl Restorer {
    pub fn new(configs: Arc<ConfigStore>) -> Self {
        Self { configs }
    }

    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    /// `milestones` are newest first
    async fn summarize(
        &self,
        project_path: &Path,
        sessions: &[Session],
        milestones: &[Milestone],
    ) -> ProjectSummary {
        let config = self.configs.load(project_path).await;

        ProjectSummary {
            name: config
                .project_name
                .unwrap_or_else(|| project_basename(project_path)),
            path: project_path.to_path_buf(),
            total_sessions: sessions.len(),
            total_tokens: sessions.iter().map(|s| s.token_count).sum(),
            last_activity: sessions
                .iter()
                .map(|s| s.start_time)
                .max()
                .unwrap_or_else(Utc::now),
            current_phase: current_phase(project_path).await,
            key_milestones: milestones.iter().take(KEY_MILESTONES).cloned().collect(),
        }
    }

    pub async fn project_summary(&self, project_path: &Path) -> ProjectSummary {
        let sessions = SessionTracker::list_sessions(project_path).await;
        let all_milestones = newest_first(milestones::read_all(project_path).await);
        self.summarize(project_path, &sessions, &all_milestones).await
    }

    pub async fn restoration_prompt(&self, project_path: &Path) -> RestorationPrompt {
        let sessions = SessionTracker::list_sessions(project_path).await;
        let all_milestones = newest_first(milestones::read_all(project_path).await);
        let all_decisions = newest_first(decisions::read_all(project_path).await);
        let summary = self
            .summarize(project_path, &sessions, &all_milestones)
            .await;

        let last_session_summary = sessions
            .last()
            .map(describe_session)
            .unwrap_or_else(|| "No previous sessions found".to_string());

        let key_context = key_context(&summary, &all_milestones, &all_decisions);
        let next_steps = next_steps(&all_milestones, &all_decisions);
        let current_phase = summary
            .current_phase
            .clone()
            .unwrap_or_else(|| "Development".to_string());

        debug!(
            project = %summary.name,
            sessions = summary.total_sessions,
            "Built restoration prompt"
        );

        RestorationPrompt {
            full_prompt: build_prompt(
                &summary.name,
                &current_phase,
                &last_session_summary,
                &key_context,
                &next_steps,
            ),
            project_name: summary.name,
            current_phase,
            last_session_summary,
            key_context,
            next_steps,
        }
    }
}

fn newest_first<T>(mut entries: Vec<T>) -> Vec<T> {
    entries.reverse();
    entries
}

fn describe_session(session: &Session) -> String {
    format!(
        "Last session focused on {} with {} exchanges and {} tokens used.",
        session.session_name.as_deref().unwrap_or("development work"),
        session.message_count,
        session.token_count
    )
}

fn in_progress(milestones: &[Milestone]) -> impl Iterator<Item = &Milestone> {
    milestones
        .iter()
        .filter(|m| m.status == MilestoneStatus::InProgress)
}

fn key_context(
    summary: &ProjectSummary,
    milestones: &[Milestone],
    decisions: &[TechnicalDecision],
) -> Vec<String> {
    let mut lines = vec![
        format!("Project: {}", summary.name),
        format!("Total sessions: {}", summary.total_sessions),
        format!("Total tokens used: {}", summary.total_tokens),
        format!(
            "Current phase: {}",
            summary
                .current_phase
                .as_deref()
                .unwrap_or("Initial development")
        ),
    ];
    lines.extend(in_progress(milestones).map(|m| format!("Active milestone: {}", m.title)));
    lines.extend(
        decisions
            .iter()
            .take(CONTEXT_DECISIONS)
            .map(|d| format!("Decision: {} - {}", d.title, d.decision)),
    );
    lines
}

fn next_steps(milestones: &[Milestone], decisions: &[TechnicalDecision]) -> Vec<String> {
    let mut steps: Vec<String> = in_progress(milestones)
        .map(|m| format!("Continue work on: {}", m.title))
        .chain(
            decisions
                .iter()
                .take(STEP_DECISIONS)
                .map(|d| format!("Implement decision: {}", d.title)),
        )
        .collect();

    if steps.is_empty() {
        steps = vec![
            "Review project status and set priorities".to_string(),
            "Continue development work".to_string(),
        ];
    }
    steps.truncate(MAX_NEXT_STEPS);
    steps
}

pub fn build_prompt(
    project_name: &str,
    current_phase: &str,
    last_session_summary: &str,
    key_context: &[String],
    next_steps: &[String],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Context Restoration for {}\n", project_name);
    let _ = writeln!(out, "## Project Status\n{} {}\n", PHASE_LABEL, current_phase);
    let _ = writeln!(out, "## Last Session Summary\n{}\n", last_session_summary);

    out.push_str("## Key Context\n");
    for line in key_context {
        let _ = writeln!(out, "- {}", line);
    }

    out.push_str("\n## Recommended Next Steps\n");
    for (i, step) in next_steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step);
    }

    let _ = write!(
        out,
        "\n## Instructions\nYou are continuing work on {}. Please review the above context and let me know when you're ready to proceed with the next steps.",
        project_name
    );
    out
}

fn find_phase(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(PHASE_LABEL))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Phase marker from `.context/project_summary.md`
pub async fn current_phase(project_path: &Path) -> Option<String> {
    let path = ContextLayout::new(project_path).project_summary_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => find_phase(&content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No project summary");
            None
        }
    }
}

/// Write or replace the phase marker, creating the summary file if needed
pub async fn set_phase(project_path: &Path, phase: &str) -> Result<()> {
    let phase = single_line(phase);
    if phase.is_empty() {
        return Err(ContinuumError::missing("phase"));
    }

    let layout = ContextLayout::new(project_path);
    tokio::fs::create_dir_all(layout.context_dir()).await?;
    let path = layout.project_summary_path();
    let marker = format!("{} {}", PHASE_LABEL, phase);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(existing)
            if existing
                .lines()
                .any(|l| l.trim_start().starts_with(PHASE_LABEL)) =>
        {
            let mut replaced = false;
            let mut lines: Vec<String> = Vec::new();
            for line in existing.lines() {
                if !replaced && line.trim_start().starts_with(PHASE_LABEL) {
                    lines.push(marker.clone());
                    replaced = true;
                } else {
                    lines.push(line.to_string());
                }
            }
            lines.join("\n") + "\n"
        }
        Ok(existing) => {
            let mut text = existing.trim_end().to_string();
            text.push_str("\n\n");
            text.push_str(&marker);
            text.push('\n');
            text
        }
        Err(_) => format!("# Project Summary\n\n{}\n", marker),
    };

    tokio::fs::write(&path, content).await?;
    info!(project = %project_path.display(), phase = %phase, "Current phase updated");
    Ok(())
}
