// src/mcp/mod.rs
// MCP Server implementation

pub mod tools;

use crate::config::ConfigStore;
use crate::restore::Restorer;
use crate::session::SessionTracker;
use crate::tokens::TokenCounter;
use crate::types::{DecisionStatus, MessageRole, MilestoneStatus};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// MCP Server state
#[derive(Clone)]
pub struct ContinuumServer {
    pub tracker: Arc<Mutex<SessionTracker>>,
    pub counter: Arc<TokenCounter>,
    pub restorer: Restorer,
    tool_router: ToolRouter<Self>,
}

impl ContinuumServer {
    pub fn new(counter: TokenCounter) -> Self {
        let tracker = SessionTracker::with_limit(counter.default_limit());
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            counter: Arc::new(counter),
            restorer: Restorer::new(Arc::new(ConfigStore::new())),
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for ContinuumServer {
    fn default() -> Self {
        Self::new(TokenCounter::default())
    }
}

// Request types for tools with parameters.
// Required string arguments are optional at the schema level so a missing or
// empty value gets a "<arg> is required" error rather than a generic
// deserialization failure.

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[schemars(description = "Path to project directory (required)")]
    pub project_path: Option<String>,
    #[schemars(description = "Optional session name")]
    pub session_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct EndSessionRequest {
    #[schemars(description = "Optional session summary")]
    pub summary: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct TrackMessageRequest {
    #[schemars(description = "Message content to track (required)")]
    pub message: Option<String>,
    #[schemars(description = "Message sender role: user/assistant (required)")]
    pub role: Option<MessageRole>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[schemars(description = "Path to project directory (required)")]
    pub project_path: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMilestoneRequest {
    #[schemars(description = "Path to project directory (required)")]
    pub project_path: Option<String>,
    #[schemars(description = "Milestone title (required)")]
    pub title: Option<String>,
    #[schemars(description = "Milestone description")]
    pub description: Option<String>,
    #[schemars(description = "Milestone status: planned/in-progress/completed (default planned)")]
    pub status: Option<MilestoneStatus>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogDecisionRequest {
    #[schemars(description = "Path to project directory (required)")]
    pub project_path: Option<String>,
    #[schemars(description = "Decision title (required)")]
    pub title: Option<String>,
    #[schemars(description = "Decision context")]
    pub context: Option<String>,
    #[schemars(description = "The decision made (required)")]
    pub decision: Option<String>,
    #[schemars(description = "Alternative options considered")]
    pub alternatives: Option<Vec<String>>,
    #[schemars(description = "Consequences of the decision")]
    pub consequences: Option<Vec<String>>,
    #[schemars(description = "Decision status: proposed/accepted/rejected (default accepted)")]
    pub status: Option<DecisionStatus>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPhaseRequest {
    #[schemars(description = "Path to project directory (required)")]
    pub project_path: Option<String>,
    #[schemars(description = "Current project phase, e.g. 'Beta hardening' (required)")]
    pub phase: Option<String>,
}

#[tool_router]
impl ContinuumServer {
    #[tool(description = "Start a new context tracking session")]
    async fn context_start_session(
        &self,
        Parameters(req): Parameters<StartSessionRequest>,
    ) -> Result<String, String> {
        tools::session::start_session(self, req).await
    }

    #[tool(description = "End the current context tracking session")]
    async fn context_end_session(
        &self,
        Parameters(req): Parameters<EndSessionRequest>,
    ) -> Result<String, String> {
        tools::session::end_session(self, req).await
    }

    #[tool(description = "Track a message in the current session")]
    async fn context_track_message(
        &self,
        Parameters(req): Parameters<TrackMessageRequest>,
    ) -> Result<String, String> {
        tools::session::track_message(self, req).await
    }

    #[tool(description = "Get current session status and token usage")]
    async fn context_get_status(&self) -> Result<String, String> {
        tools::session::get_status(self).await
    }

    #[tool(description = "Generate a context restoration prompt for continuing work")]
    async fn context_restore_session(
        &self,
        Parameters(req): Parameters<ProjectRequest>,
    ) -> Result<String, String> {
        tools::restore::restore_session(self, req).await
    }

    #[tool(description = "Add a project milestone")]
    async fn context_add_milestone(
        &self,
        Parameters(req): Parameters<AddMilestoneRequest>,
    ) -> Result<String, String> {
        tools::progress::add_milestone(self, req).await
    }

    #[tool(description = "Log a technical decision")]
    async fn context_log_decision(
        &self,
        Parameters(req): Parameters<LogDecisionRequest>,
    ) -> Result<String, String> {
        tools::progress::log_decision(self, req).await
    }

    #[tool(description = "Get a comprehensive project summary")]
    async fn context_get_project_summary(
        &self,
        Parameters(req): Parameters<ProjectRequest>,
    ) -> Result<String, String> {
        tools::restore::project_summary(self, req).await
    }

    #[tool(description = "Set the project's current phase shown in summaries and restoration prompts")]
    async fn context_set_phase(
        &self,
        Parameters(req): Parameters<SetPhaseRequest>,
    ) -> Result<String, String> {
        tools::progress::set_phase(self, req).await
    }
}

#[tool_handler]
impl ServerHandler for ContinuumServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "continuum".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Session context tracking. Call context_start_session at the start of work, \
                context_track_message for important exchanges, and context_end_session when done. \
                Use context_restore_session in a new conversation to pick up where the last one left off."
                    .into(),
            ),
        }
    }
}
