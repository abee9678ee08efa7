// src/session/mod.rs
// Single-active-session tracker and the session archive reader

pub mod record;

use crate::config::ContextConfig;
use crate::error::{ContinuumError, Result};
use crate::layout::ContextLayout;
use crate::tokens::DEFAULT_MAX_TOKENS;
use crate::types::{MessageRole, Session, SessionMessage, SessionStatus};
use crate::utils::single_line;
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// Generates a new random identifier (UUID v4)
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The in-flight session and the messages tracked so far
#[derive(Debug)]
struct ActiveSession {
    session: Session,
    messages: Vec<SessionMessage>,
}

/// State machine: `NoSession -> Active -> NoSession`.
///
/// Holds no lock of its own. The host serializes access (the MCP server keeps
/// it behind a `tokio::sync::Mutex`).
#[derive(Debug)]
pub struct SessionTracker {
    active: Option<ActiveSession>,
    /// maxTokensPerSession written into config.json of newly bootstrapped projects
    seed_limit: u64,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_TOKENS)
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(seed_limit: u64) -> Self {
        Self {
            active: None,
            seed_limit,
        }
    }

    /// Begin tracking a new session for `project_path`.
    ///
    /// Bootstraps `.context/` (directories, config.json, README.md) first; if
    /// that fails no session is installed.
    pub async fn start_session(
        &mut self,
        project_path: impl AsRef<Path>,
        session_name: Option<String>,
    ) -> Result<Session> {
        if self.active.is_some() {
            return Err(ContinuumError::SessionAlreadyActive);
        }

        let project_path = project_path.as_ref();
        let seed = ContextConfig {
            max_tokens_per_session: self.seed_limit,
            ..ContextConfig::seeded(project_path, None)
        };
        ContextLayout::new(project_path)
            .ensure_structure_with(&seed)
            .await?;

        let session = Session {
            id: generate_id(),
            project_path: project_path.to_path_buf(),
            // the record header is line-oriented
            session_name: session_name
                .map(|name| single_line(&name))
                .filter(|name| !name.is_empty()),
            start_time: Utc::now(),
            end_time: None,
            token_count: 0,
            message_count: 0,
            status: SessionStatus::Active,
        };

        info!(session_id = %session.id, project = %project_path.display(), "Session started");
        self.active = Some(ActiveSession {
            session: session.clone(),
            messages: Vec::new(),
        });
        Ok(session)
    }

    pub fn add_message(&mut self, content: &str, role: MessageRole, token_count: u64) -> Result<()> {
        let active = self.active.as_mut().ok_or(ContinuumError::NoActiveSession)?;

        active.messages.push(SessionMessage {
            id: generate_id(),
            content: content.to_string(),
            role,
            timestamp: Utc::now(),
            token_count,
        });
        active.session.token_count += token_count;
        active.session.message_count += 1;

        debug!(
            session_id = %active.session.id,
            role = role.as_str(),
            tokens = token_count,
            total = active.session.token_count,
            "Message tracked"
        );
        Ok(())
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn messages(&self) -> &[SessionMessage] {
        self.active
            .as_ref()
            .map(|a| a.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Finish the active session and write its record.
    ///
    /// Writes `session_<id>_<date>.md` and overwrites `current_session.md`. If
    /// either write fails the session stays active.
    pub async fn end_session(&mut self, summary: Option<&str>) -> Result<Session> {
        let active = self.active.as_ref().ok_or(ContinuumError::NoActiveSession)?;

        let mut ended = active.session.clone();
        ended.end_time = Some(Utc::now());
        ended.status = SessionStatus::Ended;

        write_record(&ended, &active.messages, summary).await?;

        info!(
            session_id = %ended.id,
            messages = ended.message_count,
            tokens = ended.token_count,
            "Session ended"
        );
        self.active = None;
        Ok(ended)
    }

    /// Archived sessions for a project, oldest first.
    ///
    /// Never fails: a missing directory yields an empty list and unparseable
    /// files are skipped.
    pub async fn list_sessions(project_path: impl AsRef<Path>) -> Vec<Session> {
        let project_path = project_path.as_ref();
        let sessions_dir = ContextLayout::new(project_path).sessions_dir();

        let mut entries = match tokio::fs::read_dir(&sessions_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %sessions_dir.display(), error = %e, "No session archive");
                return Vec::new();
            }
        };

        let mut sessions = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %sessions_dir.display(), error = %e, "Stopped reading session archive");
                    break;
                }
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with("session_") || !file_name.ends_with(".md") {
                continue;
            }

            let content = match tokio::fs::read_to_string(entry.path()).await {
                Ok(c) => c,
                Err(e) => {
                    debug!(file = %file_name, error = %e, "Skipping unreadable session record");
                    continue;
                }
            };

            match record::parse(&content, &file_name, project_path) {
                Some(session) => sessions.push(session),
                None => debug!(file = %file_name, "Skipping unparseable session record"),
            }
        }

        sessions.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.end_time.cmp(&b.end_time))
                .then_with(|| a.id.cmp(&b.id))
        });
        sessions
    }
}

async fn write_record(session: &Session, messages: &[SessionMessage], summary: Option<&str>) -> Result<()> {
    let layout = ContextLayout::new(&session.project_path);
    tokio::fs::create_dir_all(layout.sessions_dir()).await?;

    let markdown = record::render(session, messages, summary);
    let date = session.start_time.format(record::DATE_FORMAT).to_string();
    let path = layout.session_record_path(&session.id, &date);

    tokio::fs::write(&path, &markdown).await?;
    tokio::fs::write(layout.current_session_path(), &markdown).await?;

    debug!(path = %path.display(), "Session record written");
    Ok(())
}
