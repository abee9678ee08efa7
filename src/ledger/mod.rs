// src/ledger/mod.rs
// Append-only markdown ledgers (milestones, decisions) under .context/progress
//
// Grammar shared by both ledgers:
//   entry  := header field*
//   header := "### " text
//   field  := "**" label ":**" value continuation*
// A continuation is any non-blank line that is neither a header nor a field;
// it extends the previous field's value. `#`/`##` headings end an entry.

pub mod decisions;
pub mod milestones;

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub use decisions::NewDecision;
pub use milestones::NewMilestone;

/// One parsed ledger block: header text after `### ` plus its labelled fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub header: String,
    pub fields: HashMap<String, String>,
}

impl RawEntry {
    pub fn field(&self, label: &str) -> &str {
        self.fields.get(label).map(String::as_str).unwrap_or("")
    }
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("**")?;
    let (label, value) = rest.split_once(":**")?;
    if label.is_empty() || label.contains('*') {
        return None;
    }
    Some((label, value.trim()))
}

/// Parse every `### ` entry in a ledger
pub fn parse_entries(content: &str) -> Vec<RawEntry> {
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut last_label: Option<String> = None;

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("### ") {
            entries.extend(current.take());
            current = Some(RawEntry {
                header: header.trim().to_string(),
                fields: HashMap::new(),
            });
            last_label = None;
            continue;
        }
        if line.starts_with('#') {
            entries.extend(current.take());
            last_label = None;
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        let trimmed = line.trim_end();
        if let Some((label, value)) = split_field(trimmed) {
            entry.fields.insert(label.to_string(), value.to_string());
            last_label = Some(label.to_string());
        } else if !trimmed.trim().is_empty() {
            if let Some(value) = last_label.as_ref().and_then(|l| entry.fields.get_mut(l)) {
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(trimmed.trim());
            }
        }
    }
    entries.extend(current);
    entries
}

/// Read a ledger file. `None` when it is absent or unreadable.
pub async fn read_ledger(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ledger not readable");
            None
        }
    }
}

/// Append a rendered block to a ledger, seeding it with `title` when absent.
pub async fn append_block(path: &Path, title: &str, block: &str) -> Result<()> {
    let mut content = read_ledger(path)
        .await
        .unwrap_or_else(|| format!("# {}\n", title));
    content.push('\n');
    content.push_str(block);
    content.push('\n');
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Render `**Label:** value` with a markdown hard line break.
///
/// Continuation lines are indented so a value line starting with `#` or
/// `**` is never read back as a heading or a field.
pub(crate) fn field_line(label: &str, value: &str) -> String {
    let value = value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n  ");
    format!("**{}:** {}  ", label, value)
}
