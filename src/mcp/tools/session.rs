// src/mcp/tools/session.rs
// Session lifecycle tools

use super::require;
use crate::error::ContinuumError;
use crate::mcp::{ContinuumServer, EndSessionRequest, StartSessionRequest, TrackMessageRequest};
use crate::tokens::{SuggestedAction, get_usage, should_suggest_break};
use crate::types::Session;
use crate::utils::ResultExt;
use chrono::Utc;
use std::path::PathBuf;

/// Token budget for a session: its project's maxTokensPerSession, else the server default
async fn session_limit(server: &ContinuumServer, session: &Session) -> u64 {
    server
        .restorer
        .configs()
        .get(&session.project_path)
        .await
        .map(|config| config.max_tokens_per_session)
        .unwrap_or_else(|| server.counter.default_limit())
}

pub async fn start_session(
    server: &ContinuumServer,
    req: StartSessionRequest,
) -> Result<String, String> {
    let project_path = require(req.project_path, "projectPath")?;
    let session = server
        .tracker
        .lock()
        .await
        .start_session(PathBuf::from(&project_path), req.session_name)
        .await
        .str_err()?;

    Ok(format!(
        "Started new session: {}\nProject: {}\nSession name: {}\n\n\
        Context tracking is now active. Use context_track_message to log important conversations.",
        session.id,
        project_path,
        session.session_name.as_deref().unwrap_or("Unnamed")
    ))
}

pub async fn end_session(server: &ContinuumServer, req: EndSessionRequest) -> Result<String, String> {
    let ended = server
        .tracker
        .lock()
        .await
        .end_session(req.summary.as_deref())
        .await
        .str_err()?;

    Ok(format!(
        "Session ended successfully.\nTotal messages: {}\nTotal tokens: {}\n\n\
        Session files have been saved to .context/sessions/",
        ended.message_count, ended.token_count
    ))
}

pub async fn track_message(
    server: &ContinuumServer,
    req: TrackMessageRequest,
) -> Result<String, String> {
    let message = require(req.message, "message")?;
    let role = req
        .role
        .ok_or_else(|| String::from(ContinuumError::missing("role")))?;

    let tokens = server.counter.count_tokens(&message);
    let mut tracker = server.tracker.lock().await;
    tracker.add_message(&message, role, tokens).str_err()?;

    let Some(session) = tracker.current_session().cloned() else {
        return Err(ContinuumError::NoActiveSession.into());
    };
    drop(tracker);

    let limit = session_limit(server, &session).await;
    let usage = get_usage(session.token_count, limit);

    let mut response = format!(
        "Message tracked ({} tokens)\nTotal session tokens: {}\nToken usage: {}%",
        tokens, session.token_count, usage.percentage
    );
    if let Some(suggestion) = should_suggest_break(session.token_count, limit) {
        let recommendation = match suggestion.suggested_action {
            SuggestedAction::EndSession => "Consider ending this session",
            SuggestedAction::CreateCheckpoint => "Create a checkpoint",
        };
        response.push_str(&format!(
            "\n\n⚠️ {}\nRecommendation: {}",
            suggestion.reason, recommendation
        ));
    }
    Ok(response)
}

pub async fn get_status(server: &ContinuumServer) -> Result<String, String> {
    let Some(session) = server.tracker.lock().await.current_session().cloned() else {
        return Ok("No active session. Use context_start_session to begin tracking.".to_string());
    };

    let limit = session_limit(server, &session).await;
    let usage = get_usage(session.token_count, limit);
    let minutes = ((Utc::now() - session.start_time).num_seconds() as f64 / 60.0).round() as i64;

    let mut status = String::from("📊 Session Status\n");
    status.push_str(&format!("Session ID: {}\n", session.id));
    if let Some(name) = &session.session_name {
        status.push_str(&format!("Session name: {}\n", name));
    }
    status.push_str(&format!("Messages: {}\n", session.message_count));
    status.push_str(&format!("Tokens: {}/{}\n", session.token_count, limit));
    status.push_str(&format!(
        "Usage: {}% ({})\n",
        usage.percentage,
        usage.suggestion.as_str()
    ));
    status.push_str(&format!("Duration: {} minutes", minutes.max(0)));

    if let Some(suggestion) = should_suggest_break(session.token_count, limit) {
        status.push_str(&format!(
            "\n\n⚠️ {}\nAction: {}",
            suggestion.reason, suggestion.summary
        ));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use tempfile::TempDir;

    fn start_req(dir: &TempDir, name: Option<&str>) -> StartSessionRequest {
        StartSessionRequest {
            project_path: Some(dir.path().to_string_lossy().into_owned()),
            session_name: name.map(str::to_string),
        }
    }

    fn track_req(message: &str, role: MessageRole) -> TrackMessageRequest {
        TrackMessageRequest {
            message: Some(message.into()),
            role: Some(role),
        }
    }

    #[tokio::test]
    async fn test_start_session_text() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();

        let text = start_session(&server, start_req(&dir, None)).await.unwrap();
        assert!(text.starts_with("Started new session: "));
        assert!(text.contains("Session name: Unnamed"));
        assert!(text.contains("context_track_message"));
    }

    #[tokio::test]
    async fn test_start_session_collapses_name() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();

        let text = start_session(&server, start_req(&dir, Some("Auth\n## refactor")))
            .await
            .unwrap();
        assert!(text.contains("Session name: Auth ## refactor\n"));

        let status = get_status(&server).await.unwrap();
        assert!(status.contains("Session name: Auth ## refactor\n"));
    }

    #[tokio::test]
    async fn test_start_requires_project_path() {
        let server = ContinuumServer::default();
        let err = start_session(&server, StartSessionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, "projectPath is required");
    }

    #[tokio::test]
    async fn test_start_twice_reports_active() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();
        start_session(&server, start_req(&dir, Some("a"))).await.unwrap();
        let err = start_session(&server, start_req(&dir, Some("b")))
            .await
            .unwrap_err();
        assert!(err.contains("already active"));
    }

    #[tokio::test]
    async fn test_track_without_session() {
        let server = ContinuumServer::default();
        let err = track_message(&server, track_req("hi", MessageRole::User))
            .await
            .unwrap_err();
        assert_eq!(err, "No active session");
    }

    #[tokio::test]
    async fn test_track_validates_arguments() {
        let server = ContinuumServer::default();
        let err = track_message(
            &server,
            TrackMessageRequest {
                message: Some(String::new()),
                role: Some(MessageRole::User),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, "message is required");

        let err = track_message(
            &server,
            TrackMessageRequest {
                message: Some("hi".into()),
                role: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, "role is required");
    }

    #[tokio::test]
    async fn test_track_reports_usage_and_warning() {
        let dir = TempDir::new().unwrap();
        // 100 token budget, ~1 token per 4 chars
        let server = ContinuumServer::new(crate::tokens::TokenCounter::estimate_only(100));
        start_session(&server, start_req(&dir, None)).await.unwrap();

        let text = track_message(&server, track_req(&"x".repeat(40), MessageRole::User))
            .await
            .unwrap();
        assert_eq!(
            text,
            "Message tracked (10 tokens)\nTotal session tokens: 10\nToken usage: 10%"
        );

        let text = track_message(&server, track_req(&"y".repeat(200), MessageRole::Assistant))
            .await
            .unwrap();
        assert!(text.contains("Token usage: 60%"));
        assert!(text.contains("⚠️ High token usage (60% used)"));
        assert!(text.contains("Recommendation: Create a checkpoint"));

        let text = track_message(&server, track_req(&"z".repeat(80), MessageRole::User))
            .await
            .unwrap();
        assert!(text.contains("Approaching token limit (80% used)"));
        assert!(text.contains("Recommendation: Consider ending this session"));
    }

    #[tokio::test]
    async fn test_status_idle_and_active() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::default();

        let idle = get_status(&server).await.unwrap();
        assert_eq!(idle, "No active session. Use context_start_session to begin tracking.");

        start_session(&server, start_req(&dir, Some("Status check"))).await.unwrap();
        let text = get_status(&server).await.unwrap();
        assert!(text.starts_with("📊 Session Status\n"));
        assert!(text.contains("Session name: Status check"));
        assert!(text.contains("Messages: 0"));
        assert!(text.contains("Tokens: 0/15000"));
        assert!(text.contains("Usage: 0% (continue)"));
        assert!(text.contains("Duration: 0 minutes"));
        assert!(!text.contains("⚠️"));
    }

    #[tokio::test]
    async fn test_end_session_text() {
        let dir = TempDir::new().unwrap();
        let server = ContinuumServer::new(crate::tokens::TokenCounter::estimate_only(1000));
        start_session(&server, start_req(&dir, None)).await.unwrap();
        track_message(&server, track_req("abcd", MessageRole::User))
            .await
            .unwrap();

        let text = end_session(&server, EndSessionRequest::default()).await.unwrap();
        assert_eq!(
            text,
            "Session ended successfully.\nTotal messages: 1\nTotal tokens: 1\n\n\
            Session files have been saved to .context/sessions/"
        );

        let err = end_session(&server, EndSessionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, "No active session");
    }
}
