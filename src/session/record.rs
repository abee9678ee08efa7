// src/session/record.rs
// Markdown session records: rendering and label-based parsing

use crate::types::{MessageRole, Session, SessionMessage, SessionStatus};
use crate::utils::{project_basename, rounded_ratio};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use std::path::Path;
use std::str::FromStr;

/// Timestamp format used for Start Time / End Time
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date stamp embedded in record file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const UNNAMED_SESSION: &str = "Unnamed Session";
const STILL_ACTIVE: &str = "Active";

#[allow(clippy::expect_used)]
static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^session_(.+)_(\d{4}-\d{2}-\d{2})\.md$").expect("valid session file pattern")
});

/// Derived metrics written to the Session Statistics section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub average_length: u64,
    pub tokens_per_thousand_chars: u64,
}

impl SessionStats {
    pub fn compute(messages: &[SessionMessage], token_count: u64) -> Self {
        let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        let user_messages = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();

        Self {
            total_messages: messages.len(),
            user_messages,
            assistant_messages: messages.len() - user_messages,
            average_length: rounded_ratio(total_chars as f64, messages.len() as f64),
            tokens_per_thousand_chars: rounded_ratio(
                token_count as f64 * 1000.0,
                total_chars.max(1) as f64,
            ),
        }
    }
}

/// Split `session_<id>_<YYYY-MM-DD>.md` into (id, date)
pub fn parse_file_name(file_name: &str) -> Option<(String, String)> {
    let caps = FILE_NAME_RE.captures(file_name)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Whole minutes between start and end, rounded
pub fn duration_minutes(session: &Session) -> i64 {
    session
        .end_time
        .map(|end| ((end - session.start_time).num_seconds() as f64 / 60.0).round() as i64)
        .unwrap_or(0)
}

pub fn render(session: &Session, messages: &[SessionMessage], summary: Option<&str>) -> String {
    let mut md = String::new();
    let end_time = session
        .end_time
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| STILL_ACTIVE.to_string());

    let _ = writeln!(md, "# Session {}\n", session.id);
    let _ = writeln!(md, "**Project:** {}", project_basename(&session.project_path));
    let _ = writeln!(
        md,
        "**Session Name:** {}",
        session.session_name.as_deref().unwrap_or(UNNAMED_SESSION)
    );
    let _ = writeln!(md, "**Start Time:** {}", session.start_time.format(TIME_FORMAT));
    let _ = writeln!(md, "**End Time:** {}", end_time);
    let duration = duration_minutes(session);
    if duration > 0 {
        let _ = writeln!(md, "**Duration:** {} minutes", duration);
    }
    let _ = writeln!(md, "**Messages:** {}", session.message_count);
    let _ = writeln!(md, "**Total Tokens:** {}", session.token_count);
    let _ = writeln!(md, "**Status:** {}\n", session.status.as_str());

    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(md, "## Session Summary\n\n{}\n", summary);
    }

    md.push_str("## Conversation\n\n");
    for message in messages {
        let _ = writeln!(
            md,
            "### {} ({}) [{} tokens]\n",
            message.role.label(),
            message.timestamp.format("%H:%M:%S"),
            message.token_count
        );
        let _ = writeln!(md, "{}\n", message.content);
        md.push_str("---\n\n");
    }

    let stats = SessionStats::compute(messages, session.token_count);
    md.push_str("## Session Statistics\n\n");
    let _ = writeln!(md, "- **Total Messages:** {}", stats.total_messages);
    let _ = writeln!(md, "- **User Messages:** {}", stats.user_messages);
    let _ = writeln!(md, "- **Assistant Messages:** {}", stats.assistant_messages);
    let _ = writeln!(
        md,
        "- **Average Message Length:** {} characters",
        stats.average_length
    );
    let _ = writeln!(
        md,
        "- **Token Efficiency:** {} tokens per 1000 characters\n",
        stats.tokens_per_thousand_chars
    );

    md
}

fn field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix("**")?
        .strip_prefix(label)?
        .strip_prefix(":**")
        .map(str::trim)
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Rebuild a Session from a record's header block.
///
/// Only lines before the first `## ` section are considered, so message
/// content can never be mistaken for a field. Returns `None` when the file
/// name does not follow the record pattern or Start Time is missing.
pub fn parse(content: &str, file_name: &str, project_path: &Path) -> Option<Session> {
    let (id, _date) = parse_file_name(file_name)?;

    let mut start_time = None;
    let mut end_time = None;
    let mut session_name = None;
    let mut message_count = 0;
    let mut token_count = 0;
    let mut status = SessionStatus::Ended;

    for line in content.lines().take_while(|l| !l.starts_with("## ")) {
        if let Some(v) = field(line, "Start Time") {
            start_time = parse_time(v);
        } else if let Some(v) = field(line, "End Time") {
            end_time = if v == STILL_ACTIVE { None } else { parse_time(v) };
        } else if let Some(v) = field(line, "Session Name") {
            session_name = (!v.is_empty() && v != UNNAMED_SESSION).then(|| v.to_string());
        } else if let Some(v) = field(line, "Messages") {
            message_count = v.parse().unwrap_or(0);
        } else if let Some(v) = field(line, "Total Tokens") {
            token_count = v.parse().unwrap_or(0);
        } else if let Some(v) = field(line, "Status") {
            status = SessionStatus::from_str(v).unwrap_or(SessionStatus::Ended);
        }
    }

    Some(Session {
        id,
        project_path: project_path.to_path_buf(),
        session_name,
        start_time: start_time?,
        end_time,
        token_count,
        message_count,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    fn sample_session() -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        Session {
            id: "abc-123".into(),
            project_path: PathBuf::from("/work/demo"),
            session_name: Some("Auth refactor".into()),
            start_time: start,
            end_time: Some(start + Duration::minutes(42)),
            token_count: 30,
            message_count: 2,
            status: SessionStatus::Ended,
        }
    }

    fn message(role: MessageRole, content: &str, tokens: u64) -> SessionMessage {
        SessionMessage {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 4, 10, 5, 0).unwrap(),
            token_count: tokens,
        }
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    #[test]
    fn test_render_header_fields() {
        let session = sample_session();
        let md = render(&session, &[], None);
        assert!(md.starts_with("# Session abc-123\n"));
        assert!(md.contains("**Project:** demo\n"));
        assert!(md.contains("**Session Name:** Auth refactor\n"));
        assert!(md.contains("**Start Time:** 2025-03-04 10:00:00\n"));
        assert!(md.contains("**End Time:** 2025-03-04 10:42:00\n"));
        assert!(md.contains("**Duration:** 42 minutes\n"));
        assert!(md.contains("**Messages:** 2\n"));
        assert!(md.contains("**Total Tokens:** 30\n"));
        assert!(md.contains("**Status:** ended\n"));
        assert!(!md.contains("## Session Summary"));
    }

    #[test]
    fn test_render_conversation_and_summary() {
        let session = sample_session();
        let messages = vec![
            message(MessageRole::User, "hello", 10),
            message(MessageRole::Assistant, "hi there", 20),
        ];
        let md = render(&session, &messages, Some("Wrapped up login flow"));
        assert!(md.contains("## Session Summary\n\nWrapped up login flow\n"));
        assert!(md.contains("### 👤 User (10:05:00) [10 tokens]"));
        assert!(md.contains("### 🤖 Assistant (10:05:00) [20 tokens]"));
        assert!(md.contains("- **User Messages:** 1"));
        assert!(md.contains("- **Assistant Messages:** 1"));
        // (5 + 8) / 2 = 6.5 -> 7
        assert!(md.contains("- **Average Message Length:** 7 characters"));
    }

    #[test]
    fn test_render_without_name_or_duration() {
        let mut session = sample_session();
        session.session_name = None;
        session.end_time = Some(session.start_time);
        let md = render(&session, &[], None);
        assert!(md.contains("**Session Name:** Unnamed Session"));
        assert!(!md.contains("**Duration:**"));
    }

    #[test]
    fn test_stats_with_no_messages() {
        let stats = SessionStats::compute(&[], 0);
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.average_length, 0);
        assert_eq!(stats.tokens_per_thousand_chars, 0);
    }

    #[test]
    fn test_stats_token_efficiency() {
        let messages = vec![message(MessageRole::User, &"x".repeat(400), 100)];
        let stats = SessionStats::compute(&messages, 100);
        assert_eq!(stats.tokens_per_thousand_chars, 250);
    }

    // ============================================================================
    // Parsing
    // ============================================================================

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("session_abc-123_2025-03-04.md"),
            Some(("abc-123".into(), "2025-03-04".into()))
        );
        assert_eq!(parse_file_name("current_session.md"), None);
        assert_eq!(parse_file_name("session_abc.md"), None);
    }

    #[test]
    fn test_parse_round_trip() {
        let session = sample_session();
        let md = render(&session, &[message(MessageRole::User, "hi", 1)], Some("s"));
        let parsed = parse(
            &md,
            "session_abc-123_2025-03-04.md",
            Path::new("/work/demo"),
        )
        .unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_parse_unnamed_maps_to_none() {
        let mut session = sample_session();
        session.session_name = None;
        let md = render(&session, &[], None);
        let parsed = parse(&md, "session_abc-123_2025-03-04.md", Path::new("/p")).unwrap();
        assert_eq!(parsed.session_name, None);
    }

    #[test]
    fn test_parse_ignores_fields_inside_conversation() {
        let session = sample_session();
        let sneaky = message(MessageRole::User, "**Total Tokens:** 999999", 1);
        let md = render(&session, &[sneaky], None);
        let parsed = parse(&md, "session_abc-123_2025-03-04.md", Path::new("/p")).unwrap();
        assert_eq!(parsed.token_count, 30);
    }

    #[test]
    fn test_parse_rejects_missing_start_time() {
        let md = "# Session x\n\n**Messages:** 3\n";
        assert!(parse(md, "session_x_2025-01-01.md", Path::new("/p")).is_none());
    }

    #[test]
    fn test_parse_active_end_time() {
        let md = "# Session x\n\n**Start Time:** 2025-01-01 08:00:00\n**End Time:** Active\n**Status:** active\n";
        let parsed = parse(md, "session_x_2025-01-01.md", Path::new("/p")).unwrap();
        assert!(parsed.end_time.is_none());
        assert_eq!(parsed.status, SessionStatus::Active);
    }
}
