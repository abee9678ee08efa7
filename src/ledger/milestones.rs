// src/ledger/milestones.rs
// Milestone ledger: progress/milestones.md

use super::{RawEntry, append_block, field_line, parse_entries, read_ledger};
use crate::error::Result;
use crate::layout::ContextLayout;
use crate::types::{Milestone, MilestoneStatus};
use crate::utils::single_line;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const LEDGER_TITLE: &str = "Project Milestones";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields supplied by the caller; id and timestamps are assigned on append
#[derive(Debug, Clone, Default)]
pub struct NewMilestone {
    pub title: String,
    pub description: String,
    pub status: MilestoneStatus,
}

impl NewMilestone {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: MilestoneStatus) -> Self {
        self.status = status;
        self
    }
}

/// Render one `### <icon> <title>` block
pub fn render(milestone: &Milestone) -> String {
    let mut lines = vec![
        format!("### {} {}", milestone.status.icon(), milestone.title),
        field_line("Status", milestone.status.as_str()),
        field_line("Created", &milestone.created_at.format(DATE_FORMAT).to_string()),
    ];
    if let Some(completed) = milestone.completed_at {
        lines.push(field_line(
            "Completed",
            &completed.format(DATE_FORMAT).to_string(),
        ));
    }
    lines.push(field_line("Description", &milestone.description));
    lines.join("\n")
}

pub(crate) fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn from_entry(index: usize, entry: &RawEntry) -> Milestone {
    let (icon_status, title) = match entry.header.split_once(' ') {
        Some((icon, rest)) => match MilestoneStatus::from_icon(icon) {
            Some(status) => (Some(status), rest.trim().to_string()),
            None => (None, entry.header.clone()),
        },
        None => (MilestoneStatus::from_icon(&entry.header), entry.header.clone()),
    };
    let status = icon_status
        .or_else(|| MilestoneStatus::from_str(entry.field("Status")).ok())
        .unwrap_or_default();

    Milestone {
        id: format!("milestone-{}", index + 1),
        title,
        description: entry.field("Description").to_string(),
        status,
        created_at: parse_date(entry.field("Created")).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        completed_at: parse_date(entry.field("Completed")),
    }
}

/// Parse milestones in file order. Ids are positional (`milestone-<n>`).
pub fn parse(content: &str) -> Vec<Milestone> {
    parse_entries(content)
        .iter()
        .enumerate()
        .map(|(i, entry)| from_entry(i, entry))
        .collect()
}

/// Append a milestone to the project's ledger
pub async fn append(project_path: &Path, new: NewMilestone) -> Result<Milestone> {
    let layout = ContextLayout::new(project_path);
    layout.ensure_progress_dir().await?;

    let now = Utc::now();
    let milestone = Milestone {
        id: crate::session::generate_id(),
        title: single_line(&new.title),
        description: new.description.trim().to_string(),
        status: new.status,
        created_at: now,
        completed_at: (new.status == MilestoneStatus::Completed).then_some(now),
    };

    append_block(&layout.milestones_path(), LEDGER_TITLE, &render(&milestone)).await?;
    info!(
        title = %milestone.title,
        status = milestone.status.as_str(),
        "Milestone recorded"
    );
    Ok(milestone)
}

/// All milestones for a project; empty when the ledger is missing
pub async fn read_all(project_path: &Path) -> Vec<Milestone> {
    let layout = ContextLayout::new(project_path);
    read_ledger(&layout.milestones_path())
        .await
        .map(|text| parse(&text))
        .unwrap_or_default()
}
