// src/types.rs
// Domain types shared by the tracker, ledgers and restoration

use chrono::{DateTime, Utc};
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Who authored a tracked message
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::IntoStaticStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Heading label used in session records
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "👤 User",
            MessageRole::Assistant => "🤖 Assistant",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One tracked span of conversation tied to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub project_path: PathBuf,
    pub session_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub token_count: u64,
    pub message_count: u64,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    pub timestamp: DateTime<Utc>,
    pub token_count: u64,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::IntoStaticStr,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MilestoneStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MilestoneStatus::Completed => "✅",
            MilestoneStatus::InProgress => "🔄",
            MilestoneStatus::Planned => "⏳",
        }
    }

    pub fn from_icon(icon: &str) -> Option<Self> {
        match icon {
            "✅" => Some(MilestoneStatus::Completed),
            "🔄" => Some(MilestoneStatus::InProgress),
            "⏳" => Some(MilestoneStatus::Planned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: MilestoneStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::IntoStaticStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DecisionStatus {
    Proposed,
    #[default]
    Accepted,
    Rejected,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDecision {
    pub id: String,
    pub title: String,
    pub context: String,
    pub decision: String,
    pub alternatives: Vec<String>,
    pub consequences: Vec<String>,
    pub status: DecisionStatus,
    pub created_at: DateTime<Utc>,
}

/// Derived view of a project's recorded history
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub path: PathBuf,
    pub total_sessions: usize,
    pub total_tokens: u64,
    pub last_activity: DateTime<Utc>,
    pub current_phase: Option<String>,
    pub key_milestones: Vec<Milestone>,
}

/// Text handed to a fresh conversation so it can pick up prior work
#[derive(Debug, Clone, Serialize)]
pub struct RestorationPrompt {
    pub project_name: String,
    pub current_phase: String,
    pub last_session_summary: String,
    pub key_context: Vec<String>,
    pub next_steps: Vec<String>,
    pub full_prompt: String,
}
