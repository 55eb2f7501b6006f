// ABOUTME: In-memory work queue with the unassigned -> pending -> completed item lifecycle.
// ABOUTME: Validates drafts on create, allocates monotonically increasing ids, and guards the terminal state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

/// Ids start here and only ever grow; they are never reused.
pub const FIRST_WORK_ITEM_ID: u64 = 1000;

/// Every way a work-queue operation can be refused. The messages are written
/// to be read by the agent that invoked the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkQueueError {
    #[error("Item must have a title.")]
    MissingTitle,

    #[error("Item must have a description.")]
    MissingDescription,

    #[error("Item must not have an id; ids are assigned by the work queue.")]
    PresetId,

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("You cannot create a completed item.")]
    CompletedOnCreate,

    #[error("Unassigned items must not have an assignee.")]
    UnassignedWithAssignee,

    #[error("Pending items must have an assignee.")]
    PendingWithoutAssignee,

    #[error("Work item {0} does not exist.")]
    NotFound(u64),

    #[error("Work item {0} is already completed and cannot change.")]
    AlreadyCompleted(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    Unassigned,
    Pending,
    Completed,
}

impl WorkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::Unassigned => "unassigned",
            WorkStatus::Pending => "pending",
            WorkStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WorkStatus {
    type Err = WorkQueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unassigned" => Ok(WorkStatus::Unassigned),
            "pending" => Ok(WorkStatus::Pending),
            "completed" => Ok(WorkStatus::Completed),
            _ => Err(WorkQueueError::UnknownStatus(s.to_string())),
        }
    }
}

/// A trackable unit of project work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    pub assignee: Option<String>,
    pub comments: Vec<String>,
}

/// A creation request, typically deserialized straight from a model's tool
/// arguments. Fields the caller is not allowed to set are still captured so
/// they can be rejected rather than silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkItemDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

impl WorkItemDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

struct QueueState {
    items: Vec<WorkItem>,
    next_id: u64,
}

impl QueueState {
    fn find_mut(&mut self, id: u64) -> Result<&mut WorkItem, WorkQueueError> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(WorkQueueError::NotFound(id))
    }
}

/// Shared store of work items. Every mutation happens under a single write
/// lock, so readers never observe a half-applied transition.
pub struct WorkQueue {
    state: RwLock<QueueState>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(QueueState {
                items: Vec::new(),
                next_id: FIRST_WORK_ITEM_ID,
            }),
        }
    }

    /// Validate a draft and store it as a new item with the next id.
    pub async fn create(&self, draft: WorkItemDraft) -> Result<WorkItem, WorkQueueError> {
        let title = non_empty(draft.title).ok_or(WorkQueueError::MissingTitle)?;
        let description = non_empty(draft.description).ok_or(WorkQueueError::MissingDescription)?;
        if draft.id.as_ref().is_some_and(|id| !id.is_null()) {
            return Err(WorkQueueError::PresetId);
        }

        let status = match draft.status.as_deref() {
            None => WorkStatus::Unassigned,
            Some(s) => s.parse()?,
        };
        let assignee = non_empty(draft.assignee);
        match status {
            WorkStatus::Unassigned if assignee.is_some() => {
                return Err(WorkQueueError::UnassignedWithAssignee);
            }
            WorkStatus::Pending if assignee.is_none() => {
                return Err(WorkQueueError::PendingWithoutAssignee);
            }
            WorkStatus::Completed => return Err(WorkQueueError::CompletedOnCreate),
            _ => {}
        }

        let mut state = self.state.write().await;
        let item = WorkItem {
            id: state.next_id,
            title,
            description,
            status,
            assignee,
            comments: Vec::new(),
        };
        state.next_id += 1;
        state.items.push(item.clone());
        tracing::debug!(id = item.id, title = %item.title, "work item created");
        Ok(item)
    }

    /// Hand an item to an agent and mark it pending. Re-assignment of a
    /// pending item is allowed; a completed item cannot be reopened.
    pub async fn assign(&self, id: u64, assignee: &str) -> Result<WorkItem, WorkQueueError> {
        let assignee = assignee.trim();
        if assignee.is_empty() {
            return Err(WorkQueueError::PendingWithoutAssignee);
        }
        let mut state = self.state.write().await;
        let item = state.find_mut(id)?;
        if item.status == WorkStatus::Completed {
            return Err(WorkQueueError::AlreadyCompleted(id));
        }
        item.assignee = Some(assignee.to_string());
        item.status = WorkStatus::Pending;
        tracing::debug!(id, assignee, "work item assigned");
        Ok(item.clone())
    }

    /// Mark an item completed. Completing an already-completed item is a
    /// no-op that still succeeds. The assignee, if any, is retained.
    pub async fn complete(&self, id: u64) -> Result<WorkItem, WorkQueueError> {
        let mut state = self.state.write().await;
        let item = state.find_mut(id)?;
        item.status = WorkStatus::Completed;
        tracing::debug!(id, "work item completed");
        Ok(item.clone())
    }

    /// Append a comment to an item's history. Allowed in every status.
    pub async fn add_comment(&self, id: u64, comment: &str) -> Result<WorkItem, WorkQueueError> {
        let mut state = self.state.write().await;
        let item = state.find_mut(id)?;
        item.comments.push(comment.to_string());
        Ok(item.clone())
    }

    pub async fn get_detail(&self, id: u64) -> Result<WorkItem, WorkQueueError> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(WorkQueueError::NotFound(id))
    }

    /// Items in the given status, in creation order.
    pub async fn list_by_status(&self, status: WorkStatus) -> Vec<WorkItem> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .filter(|item| item.status == status)
            .cloned()
            .collect()
    }

    pub async fn list_all(&self) -> Vec<WorkItem> {
        self.state.read().await.items.clone()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_status_invariants(item: &WorkItem) {
        match item.status {
            WorkStatus::Unassigned => assert!(item.assignee.is_none(), "{item:?}"),
            WorkStatus::Pending => assert!(item.assignee.is_some(), "{item:?}"),
            WorkStatus::Completed => {}
        }
    }

    #[tokio::test]
    async fn create_defaults_to_unassigned() {
        let queue = WorkQueue::new();
        let item = queue
            .create(WorkItemDraft::new("Build login", "Email + password form"))
            .await
            .unwrap();

        assert_eq!(item.id, FIRST_WORK_ITEM_ID);
        assert_eq!(item.status, WorkStatus::Unassigned);
        assert!(item.assignee.is_none());
        assert!(item.comments.is_empty());
        assert_status_invariants(&item);
    }

    #[tokio::test]
    async fn ids_are_unique_and_strictly_increasing() {
        let queue = WorkQueue::new();
        let mut last = 0;
        for n in 0..5 {
            let item = queue
                .create(WorkItemDraft::new(format!("item {n}"), "desc"))
                .await
                .unwrap();
            assert!(item.id > last);
            last = item.id;
        }
        // A rejected create does not consume an id.
        let _ = queue.create(WorkItemDraft::default()).await;
        let next = queue.create(WorkItemDraft::new("after", "desc")).await.unwrap();
        assert_eq!(next.id, last + 1);
    }

    #[tokio::test]
    async fn create_rejects_invalid_drafts() {
        let queue = WorkQueue::new();

        let missing_title = WorkItemDraft {
            description: Some("d".into()),
            ..WorkItemDraft::default()
        };
        assert_eq!(queue.create(missing_title).await, Err(WorkQueueError::MissingTitle));

        let blank_description = WorkItemDraft::new("t", "   ");
        assert_eq!(
            queue.create(blank_description).await,
            Err(WorkQueueError::MissingDescription)
        );

        let preset_id = WorkItemDraft {
            id: Some(json!(7)),
            ..WorkItemDraft::new("t", "d")
        };
        assert_eq!(queue.create(preset_id).await, Err(WorkQueueError::PresetId));

        let completed = WorkItemDraft {
            status: Some("completed".into()),
            ..WorkItemDraft::new("t", "d")
        };
        assert_eq!(queue.create(completed).await, Err(WorkQueueError::CompletedOnCreate));

        let pending_without_assignee = WorkItemDraft {
            status: Some("pending".into()),
            ..WorkItemDraft::new("t", "d")
        };
        assert_eq!(
            queue.create(pending_without_assignee).await,
            Err(WorkQueueError::PendingWithoutAssignee)
        );

        let unassigned_with_assignee = WorkItemDraft {
            assignee: Some("Mei".into()),
            ..WorkItemDraft::new("t", "d")
        };
        assert_eq!(
            queue.create(unassigned_with_assignee).await,
            Err(WorkQueueError::UnassignedWithAssignee)
        );

        assert!(queue.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn create_accepts_pending_with_assignee() {
        let queue = WorkQueue::new();
        let draft = WorkItemDraft {
            status: Some("pending".into()),
            assignee: Some("Mei".into()),
            ..WorkItemDraft::new("t", "d")
        };
        let item = queue.create(draft).await.unwrap();
        assert_eq!(item.status, WorkStatus::Pending);
        assert_eq!(item.assignee.as_deref(), Some("Mei"));
    }

    #[tokio::test]
    async fn draft_deserializes_from_tool_arguments() {
        let draft: WorkItemDraft =
            serde_json::from_value(json!({"title": "t", "description": "d", "id": 3})).unwrap();
        let queue = WorkQueue::new();
        assert_eq!(queue.create(draft).await, Err(WorkQueueError::PresetId));
    }

    #[tokio::test]
    async fn assign_sets_pending_and_allows_reassignment() {
        let queue = WorkQueue::new();
        let item = queue.create(WorkItemDraft::new("t", "d")).await.unwrap();

        let assigned = queue.assign(item.id, "Kenji").await.unwrap();
        assert_eq!(assigned.status, WorkStatus::Pending);
        assert_eq!(assigned.assignee.as_deref(), Some("Kenji"));

        let reassigned = queue.assign(item.id, "Mei").await.unwrap();
        assert_eq!(reassigned.assignee.as_deref(), Some("Mei"));
        assert_status_invariants(&reassigned);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let queue = WorkQueue::new();
        assert_eq!(queue.assign(42, "Mei").await, Err(WorkQueueError::NotFound(42)));
        assert_eq!(queue.complete(42).await, Err(WorkQueueError::NotFound(42)));
        assert_eq!(queue.get_detail(42).await, Err(WorkQueueError::NotFound(42)));
        assert_eq!(queue.add_comment(42, "x").await, Err(WorkQueueError::NotFound(42)));
    }

    #[tokio::test]
    async fn completed_is_terminal() {
        let queue = WorkQueue::new();
        let item = queue.create(WorkItemDraft::new("t", "d")).await.unwrap();
        queue.assign(item.id, "Kenji").await.unwrap();
        queue.complete(item.id).await.unwrap();

        // Double completion is idempotent.
        let again = queue.complete(item.id).await.unwrap();
        assert_eq!(again.status, WorkStatus::Completed);

        assert_eq!(
            queue.assign(item.id, "Mei").await,
            Err(WorkQueueError::AlreadyCompleted(item.id))
        );

        let detail = queue.get_detail(item.id).await.unwrap();
        assert_eq!(detail.status, WorkStatus::Completed);
        assert_eq!(detail.assignee.as_deref(), Some("Kenji"));
    }

    #[tokio::test]
    async fn list_by_status_filters_in_creation_order() {
        let queue = WorkQueue::new();
        let a = queue.create(WorkItemDraft::new("a", "d")).await.unwrap();
        let b = queue.create(WorkItemDraft::new("b", "d")).await.unwrap();
        let c = queue.create(WorkItemDraft::new("c", "d")).await.unwrap();
        queue.assign(a.id, "Mei").await.unwrap();
        queue.assign(c.id, "Mei").await.unwrap();

        let pending: Vec<u64> = queue
            .list_by_status(WorkStatus::Pending)
            .await
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(pending, vec![a.id, c.id]);

        let unassigned = queue.list_by_status(WorkStatus::Unassigned).await;
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, b.id);
    }

    #[tokio::test]
    async fn comments_are_appended_in_order() {
        let queue = WorkQueue::new();
        let item = queue.create(WorkItemDraft::new("t", "d")).await.unwrap();
        queue.add_comment(item.id, "first").await.unwrap();
        let item = queue.add_comment(item.id, "second").await.unwrap();
        assert_eq!(item.comments, vec!["first", "second"]);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Pending".parse(), Ok(WorkStatus::Pending));
        assert_eq!(
            "archived".parse::<WorkStatus>(),
            Err(WorkQueueError::UnknownStatus("archived".into()))
        );
    }
}
