// src/ledger/decisions.rs
// Architecture decision ledger: progress/decisions.md

use super::milestones::parse_date;
use super::{RawEntry, append_block, field_line, parse_entries, read_ledger};
use crate::error::Result;
use crate::layout::ContextLayout;
use crate::types::{DecisionStatus, TechnicalDecision};
use crate::utils::single_line;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const LEDGER_TITLE: &str = "Technical Decisions";

#[derive(Debug, Clone, Default)]
pub struct NewDecision {
    pub title: String,
    pub context: String,
    pub decision: String,
    /// Accepted for API compatibility; the ledger format has no slot for it
    pub alternatives: Vec<String>,
    pub consequences: Vec<String>,
    pub status: DecisionStatus,
}

/// `ADR-007`
pub fn adr_id(sequence: usize) -> String {
    format!("ADR-{:03}", sequence)
}

/// Split `ADR-<n>: <title>` into (id, title)
fn split_header(header: &str) -> Option<(&str, &str)> {
    let (id, title) = header.split_once(':')?;
    let number = id.strip_prefix("ADR-")?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((id, title.trim()))
}

pub fn render(decision: &TechnicalDecision) -> String {
    [
        format!("### {}: {}", decision.id, decision.title),
        field_line("Date", &decision.created_at.format("%Y-%m-%d").to_string()),
        field_line("Status", decision.status.as_str()),
        field_line("Context", &decision.context),
        field_line("Decision", &decision.decision),
        field_line("Consequences", &decision.consequences.join(", ")),
    ]
    .join("\n")
}

fn from_entry(entry: &RawEntry) -> Option<TechnicalDecision> {
    let (id, title) = split_header(&entry.header)?;
    Some(TechnicalDecision {
        id: id.to_string(),
        title: title.to_string(),
        context: entry.field("Context").to_string(),
        decision: entry.field("Decision").to_string(),
        alternatives: Vec::new(),
        consequences: entry
            .field("Consequences")
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        status: DecisionStatus::from_str(entry.field("Status")).unwrap_or_default(),
        created_at: parse_date(entry.field("Date")).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

/// Decisions in file order; `###` blocks without an ADR header are skipped
pub fn parse(content: &str) -> Vec<TechnicalDecision> {
    parse_entries(content).iter().filter_map(from_entry).collect()
}

/// Highest numeric `ADR-<n>` id; hand-written ids like `ADR-x7` are ignored
fn last_sequence(decisions: &[TechnicalDecision]) -> usize {
    decisions
        .iter()
        .filter_map(|d| d.id.strip_prefix("ADR-")?.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

/// Append a decision, numbering it after the highest id already recorded
pub async fn append(project_path: &Path, new: NewDecision) -> Result<TechnicalDecision> {
    let layout = ContextLayout::new(project_path);
    layout.ensure_progress_dir().await?;

    let path = layout.decisions_path();
    let last = read_ledger(&path)
        .await
        .map(|text| last_sequence(&parse(&text)))
        .unwrap_or(0);

    let decision = TechnicalDecision {
        id: adr_id(last + 1),
        title: single_line(&new.title),
        context: new.context.trim().to_string(),
        decision: new.decision.trim().to_string(),
        alternatives: new.alternatives,
        consequences: new
            .consequences
            .iter()
            .map(|c| single_line(c))
            .filter(|c| !c.is_empty())
            .collect(),
        status: new.status,
        created_at: Utc::now(),
    };

    append_block(&path, LEDGER_TITLE, &render(&decision)).await?;
    info!(id = %decision.id, title = %decision.title, "Decision logged");
    Ok(decision)
}

pub async fn read_all(project_path: &Path) -> Vec<TechnicalDecision> {
    let layout = ContextLayout::new(project_path);
    read_ledger(&layout.decisions_path())
        .await
        .map(|text| parse(&text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_decision(title: &str, decision: &str) -> NewDecision {
        NewDecision {
            title: title.into(),
            decision: decision.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_adr_id_padding() {
        assert_eq!(adr_id(1), "ADR-001");
        assert_eq!(adr_id(42), "ADR-042");
        assert_eq!(adr_id(1234), "ADR-1234");
    }

    #[test]
    fn test_split_header() {
        assert_eq!(split_header("ADR-003: Use tokio"), Some(("ADR-003", "Use tokio")));
        assert_eq!(split_header("ADR-x7: Legacy"), Some(("ADR-x7", "Legacy")));
        assert_eq!(split_header("Notes: misc"), None);
        assert_eq!(split_header("ADR-: empty"), None);
    }

    #[test]
    fn test_parse_skips_non_adr_blocks() {
        let text = "# Technical Decisions\n\n### Aside\n**Decision:** nope\n\n### ADR-001: Keep it\n**Decision:** yes\n**Status:** proposed\n**Consequences:** a, b ,, c\n";
        let parsed = parse(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "ADR-001");
        assert_eq!(parsed[0].title, "Keep it");
        assert_eq!(parsed[0].decision, "yes");
        assert_eq!(parsed[0].status, DecisionStatus::Proposed);
        assert_eq!(parsed[0].consequences, vec!["a", "b", "c"]);
        assert_eq!(parsed[0].context, "");
    }

    #[test]
    fn test_unknown_status_defaults_to_accepted() {
        let parsed = parse("### ADR-001: T\n**Status:** maybe\n");
        assert_eq!(parsed[0].status, DecisionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_append_numbers_sequentially() {
        let dir = TempDir::new().unwrap();

        let first = append(dir.path(), new_decision("Use markdown", "Plain files"))
            .await
            .unwrap();
        let second = append(
            dir.path(),
            NewDecision {
                context: "Need persistence".into(),
                alternatives: vec!["sqlite".into()],
                consequences: vec!["Readable".into(), "No queries".into()],
                status: DecisionStatus::Proposed,
                ..new_decision("Skip database", "Files only")
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, "ADR-001");
        assert_eq!(second.id, "ADR-002");
        assert_eq!(second.alternatives, vec!["sqlite"]);

        let all = read_all(dir.path()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, "ADR-002");
        assert_eq!(all[1].context, "Need persistence");
        assert_eq!(all[1].decision, "Files only");
        assert_eq!(all[1].consequences, vec!["Readable", "No queries"]);
        assert_eq!(all[1].status, DecisionStatus::Proposed);
        // not persisted
        assert!(all[1].alternatives.is_empty());

        let text = std::fs::read_to_string(ContextLayout::new(dir.path()).decisions_path()).unwrap();
        assert!(text.starts_with("# Technical Decisions\n"));
        assert!(text.contains("### ADR-002: Skip database"));
    }

    #[test]
    fn test_last_sequence_uses_highest_numeric_id() {
        let parsed = parse("### ADR-002: B\n\n### ADR-x7: Legacy\n\n### ADR-009: C\n\n### ADR-004: D\n");
        assert_eq!(last_sequence(&parsed), 9);
        assert_eq!(last_sequence(&[]), 0);
    }

    #[tokio::test]
    async fn test_append_after_gap_never_reuses_id() {
        let dir = TempDir::new().unwrap();
        let layout = ContextLayout::new(dir.path());
        layout.ensure_progress_dir().await.unwrap();
        std::fs::write(
            layout.decisions_path(),
            "# Technical Decisions\n\n### ADR-005: Imported\n**Decision:** kept\n",
        )
        .unwrap();

        let next = append(dir.path(), new_decision("Next", "After the gap"))
            .await
            .unwrap();
        assert_eq!(next.id, "ADR-006");
    }

    #[tokio::test]
    async fn test_multi_line_text_cannot_forge_decisions() {
        let dir = TempDir::new().unwrap();

        append(
            dir.path(),
            NewDecision {
                context: "Background\n## Notes".into(),
                ..new_decision("A", "Pick one\n### ADR-001: Fake\n**Status:** rejected")
            },
        )
        .await
        .unwrap();
        let second = append(dir.path(), new_decision("B", "Second"))
            .await
            .unwrap();
        assert_eq!(second.id, "ADR-002");

        let all = read_all(dir.path()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "A");
        assert_eq!(all[0].decision, "Pick one\n### ADR-001: Fake\n**Status:** rejected");
        assert_eq!(all[0].context, "Background\n## Notes");
        assert_eq!(all[0].status, DecisionStatus::Accepted);
        assert_eq!(all[1].id, "ADR-002");
    }

    #[tokio::test]
    async fn test_read_all_missing_ledger() {
        let dir = TempDir::new().unwrap();
        assert!(read_all(dir.path()).await.is_empty());
    }
}
