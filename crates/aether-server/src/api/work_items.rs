// ABOUTME: Work-item API handlers: list items (optionally by status) and read one item.
// ABOUTME: Read-only; agents change work items through their tools, never over HTTP.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use aether_core::WorkStatus;

use crate::app_state::SharedState;

#[derive(Debug, Deserialize)]
pub struct WorkItemQuery {
    pub status: Option<String>,
}

/// GET /api/work-items?status=pending - Items in creation order.
pub async fn list_work_items(
    State(state): State<SharedState>,
    Query(query): Query<WorkItemQuery>,
) -> impl IntoResponse {
    let queue = state.swarm.work_queue();
    match query.status.as_deref() {
        None => Json(queue.list_all().await).into_response(),
        Some(raw) => match raw.parse::<WorkStatus>() {
            Ok(status) => Json(queue.list_by_status(status).await).into_response(),
            Err(e) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response(),
        },
    }
}

/// GET /api/work-items/{id} - One item with its comments.
pub async fn get_work_item(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.swarm.work_queue().get_detail(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::app_state::{AppState, SharedState};
    use crate::routes::create_router;
    use aether_agent::Swarm;
    use aether_agent::testing::StubLlmClient;
    use aether_core::WorkItemDraft;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn seeded_state() -> SharedState {
        let swarm = Swarm::builder(Arc::new(StubLlmClient::done())).build();
        let queue = swarm.work_queue();
        queue
            .create(WorkItemDraft::new("Build login", "Email + password"))
            .await
            .unwrap();
        let second = queue
            .create(WorkItemDraft::new("Write tests", "Cover login"))
            .await
            .unwrap();
        queue.assign(second.id, "Kenji").await.unwrap();
        Arc::new(AppState::new(Arc::new(swarm)))
    }

    async fn get_json(state: SharedState, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = create_router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn lists_all_items_in_creation_order() {
        let (status, json) = get_json(seeded_state().await, "/api/work-items").await;

        assert_eq!(status, StatusCode::OK);
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], 1000);
        assert_eq!(items[1]["id"], 1001);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let (status, json) = get_json(seeded_state().await, "/api/work-items?status=pending").await;

        assert_eq!(status, StatusCode::OK);
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["assignee"], "Kenji");
    }

    #[tokio::test]
    async fn bad_status_is_400() {
        let (status, json) = get_json(seeded_state().await, "/api/work-items?status=done").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("done"));
    }

    #[tokio::test]
    async fn get_item_and_missing_item() {
        let state = seeded_state().await;

        let (status, json) = get_json(Arc::clone(&state), "/api/work-items/1000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Build login");
        assert_eq!(json["status"], "unassigned");

        let (status, _) = get_json(state, "/api/work-items/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
