// ABOUTME: Implements the work-item tools: createWorkItem, assignWorkItem, getWorkItemDetail, completeWorkItem.
// ABOUTME: Queue refusals are returned as "Error: ..." text so the model can correct itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::{Schema, ToolDeclaration, WorkItem, WorkItemDraft, WorkQueue};

use super::{Tool, id_arg, string_arg};
use crate::router::MessageRouter;

fn render(item: &WorkItem) -> Result<String, anyhow::Error> {
    Ok(serde_json::to_string_pretty(item)?)
}

fn id_schema() -> Schema {
    Schema::integer("The work item id, as returned by createWorkItem.")
}

/// Tool that adds a new item to the work queue.
#[derive(Clone)]
pub struct CreateWorkItemTool {
    pub(crate) queue: Arc<WorkQueue>,
}

impl CreateWorkItemTool {
    pub fn new(queue: Arc<WorkQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Tool for CreateWorkItemTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "createWorkItem",
            "Create a new work item. The work queue assigns the id; do not supply one. New items start unassigned.",
            Schema::object()
                .required_property("title", Schema::string("Short title of the work item."))
                .required_property(
                    "description",
                    Schema::string("What needs to be done and how to tell when it is finished."),
                ),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let draft: WorkItemDraft = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("invalid work item: {}", e))?;
        match self.queue.create(draft).await {
            Ok(item) => Ok(format!("Created work item {}.\n{}", item.id, render(&item)?)),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}

/// Tool that hands a work item to an agent and notifies them.
#[derive(Clone)]
pub struct AssignWorkItemTool {
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) router: Arc<MessageRouter>,
    pub(crate) owner: String,
}

impl AssignWorkItemTool {
    pub fn new(queue: Arc<WorkQueue>, router: Arc<MessageRouter>, owner: &str) -> Self {
        Self {
            queue,
            router,
            owner: owner.to_string(),
        }
    }
}

#[async_trait]
impl Tool for AssignWorkItemTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "assignWorkItem",
            "Assign a work item to an agent. The assignee is notified with the item's title and description.",
            Schema::object()
                .required_property("id", id_schema())
                .required_property("assignee", Schema::string("Name of the agent who will do the work.")),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let id = id_arg(&args, "id")?;
        let assignee = string_arg(&args, "assignee")?.trim();

        if !self.router.has_agent(assignee).await {
            return Ok(format!(
                "Error: Agent with name '{assignee}' not found. Work item {id} was not assigned."
            ));
        }

        let item = match self.queue.assign(id, assignee).await {
            Ok(item) => item,
            Err(e) => return Ok(format!("Error: {e}")),
        };

        tracing::info!(agent = %self.owner, id, assignee, "work item assigned");
        self.router.dispatch(
            assignee,
            format!(
                "You have been assigned work item {}: {}.\n{}",
                item.id, item.title, item.description
            ),
            &self.owner,
        );

        Ok(format!("Assigned work item {id} to {assignee}."))
    }
}

/// Tool that returns the current state of one work item.
#[derive(Clone)]
pub struct GetWorkItemDetailTool {
    pub(crate) queue: Arc<WorkQueue>,
}

impl GetWorkItemDetailTool {
    pub fn new(queue: Arc<WorkQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Tool for GetWorkItemDetailTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "getWorkItemDetail",
            "Get the title, description, status, assignee and comments of a work item.",
            Schema::object().required_property("id", id_schema()),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let id = id_arg(&args, "id")?;
        match self.queue.get_detail(id).await {
            Ok(item) => render(&item),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}

/// Tool that marks a work item completed, optionally leaving a note.
#[derive(Clone)]
pub struct CompleteWorkItemTool {
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) owner: String,
}

impl CompleteWorkItemTool {
    pub fn new(queue: Arc<WorkQueue>, owner: &str) -> Self {
        Self {
            queue,
            owner: owner.to_string(),
        }
    }
}

#[async_trait]
impl Tool for CompleteWorkItemTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "completeWorkItem",
            "Mark a work item as completed. Completed items cannot be reassigned.",
            Schema::object()
                .required_property("id", id_schema())
                .optional_property(
                    "note",
                    Schema::string("Optional note about the result, kept in the item's comments."),
                ),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let id = id_arg(&args, "id")?;
        let note = args
            .get("note")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty());

        if let Some(note) = note
            && let Err(e) = self
                .queue
                .add_comment(id, &format!("{}: {}", self.owner, note))
                .await
        {
            return Ok(format!("Error: {e}"));
        }

        match self.queue.complete(id).await {
            Ok(_) => {
                tracing::info!(agent = %self.owner, id, "work item completed");
                Ok(format!("Completed work item {id}."))
            }
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}
