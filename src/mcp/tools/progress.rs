// src/mcp/tools/progress.rs
// Milestone, decision and phase tools

use super::require;
use crate::ledger::{NewDecision, NewMilestone, decisions, milestones};
use crate::mcp::{AddMilestoneRequest, ContinuumServer, LogDecisionRequest, SetPhaseRequest};
use crate::restore;
use crate::utils::ResultExt;
use std::path::PathBuf;

pub async fn add_milestone(
    _server: &ContinuumServer,
    req: AddMilestoneRequest,
) -> Result<String, String> {
    let project_path = require(req.project_path, "projectPath")?;
    let title = require(req.title, "title")?;

    let milestone = milestones::append(
        &PathBuf::from(project_path),
        NewMilestone {
            title,
            description: req.description.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
        },
    )
    .await
    .str_err()?;

    let description = if milestone.description.is_empty() {
        "No description provided"
    } else {
        milestone.description.as_str()
    };
    Ok(format!(
        "Milestone added: {}\nStatus: {}\nDescription: {}",
        milestone.title,
        milestone.status.as_str(),
        description
    ))
}

pub async fn log_decision(
    _server: &ContinuumServer,
    req: LogDecisionRequest,
) -> Result<String, String> {
    let project_path = require(req.project_path, "projectPath")?;
    let title = require(req.title, "title")?;
    let decision = require(req.decision, "decision")?;

    let logged = decisions::append(
        &PathBuf::from(project_path),
        NewDecision {
            title,
            context: req.context.unwrap_or_default(),
            decision,
            alternatives: req.alternatives.unwrap_or_default(),
            consequences: req.consequences.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
        },
    )
    .await
    .str_err()?;

    Ok(format!(
        "Decision logged: {} ({})\nStatus: {}\nDecision: {}",
        logged.title,
        logged.id,
        logged.status.as_str(),
        logged.decision
    ))
}

pub async fn set_phase(_server: &ContinuumServer, req: SetPhaseRequest) -> Result<String, String> {
    let project_path = require(req.project_path, "projectPath")?;
    let phase = require(req.phase, "phase")?;

    restore::set_phase(&PathBuf::from(project_path), &phase)
        .await
        .str_err()?;
    Ok(format!("Current phase set: {}", phase.trim()))
}
