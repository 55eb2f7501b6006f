// ABOUTME: Agent API handlers: roster listing, per-agent history, and posting a message to an agent.
// ABOUTME: Message failures map to 404 (unknown agent), 504 (deadline) and 502 (model provider).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use aether_agent::{AgentError, RosterEntry, SwarmError};

use crate::app_state::SharedState;

/// Request body for posting a message to an agent.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
}

/// Response body carrying the agent's final reply.
#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub response: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// GET /api/agents - The roster in creation order.
pub async fn list_agents(State(state): State<SharedState>) -> Json<Vec<RosterEntry>> {
    Json(state.swarm.roster().await)
}

/// GET /api/agents/{name}/history - One agent's conversation.
pub async fn agent_history(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.swarm.history(&name).await {
        Some(history) => Json(history).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("agent '{}' not found", name)),
    }
}

/// POST /api/agents/{name}/messages - Send text and wait for the reply.
pub async fn post_message(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> impl IntoResponse {
    match state.swarm.post_message(&name, &req.text).await {
        Ok(response) => Json(PostMessageResponse { response }).into_response(),
        Err(SwarmError::UnknownAgent(_)) => {
            error(StatusCode::NOT_FOUND, format!("agent '{}' not found", name))
        }
        Err(SwarmError::Agent(AgentError::DeadlineExceeded)) => {
            tracing::warn!(agent = %name, "message timed out");
            error(StatusCode::GATEWAY_TIMEOUT, "the agent did not answer in time")
        }
        Err(SwarmError::Agent(AgentError::Reentrant { .. })) => {
            error(StatusCode::CONFLICT, format!("{} is busy", name))
        }
        Err(SwarmError::Agent(e)) => {
            tracing::error!(agent = %name, error = %e, "message failed");
            error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
