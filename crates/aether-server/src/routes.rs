// ABOUTME: Route definitions for the Aether HTTP API.
// ABOUTME: Assembles the agent and work-item endpoints into one Axum Router with request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agents", get(api::agents::list_agents))
        .route("/api/agents/{name}/history", get(api::agents::agent_history))
        .route("/api/agents/{name}/messages", post(api::agents::post_message))
        .route("/api/work-items", get(api::work_items::list_work_items))
        .route("/api/work-items/{id}", get(api::work_items::get_work_item))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
