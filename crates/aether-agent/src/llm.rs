// ABOUTME: Defines the LlmClient trait that every model-service adapter implements.
// ABOUTME: Also defines GenerateRequest (what an agent sends) and LlmError (how a call can fail).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use aether_core::{Part, ToolDeclaration, Turn};

/// Everything the model needs for one step of an agent's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Name of the agent issuing the request. Used for logging and by test
    /// clients; not part of the wire payload.
    pub agent: String,
    pub system_instruction: String,
    pub history: Vec<Turn>,
    pub tools: Vec<ToolDeclaration>,
}

/// Errors a model call can produce.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether the call may succeed if simply tried again. Rate limits
    /// always count; those carrying a server delay get special handling in
    /// the retry loop before falling back to this classification.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Transport(_) | LlmError::Server { .. } | LlmError::RateLimited { .. }
        )
    }
}

/// Adapter over a remote language-model service. Implementations are
/// stateless: the full conversation is supplied on every call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one model step and return the parts of the resulting model turn.
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Part>, LlmError>;

    /// Provider name for logging and display (e.g. "gemini").
    fn provider_name(&self) -> &str;

    /// Model identifier being used (e.g. "gemini-2.5-flash").
    fn model_name(&self) -> &str;
}
