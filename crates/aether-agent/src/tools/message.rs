// ABOUTME: Implements the message tool: send text to one named agent and return its reply.
// ABOUTME: The sender is fixed at grant time so agents cannot impersonate one another.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::{Schema, ToolDeclaration};

use super::{Tool, string_arg};
use crate::router::MessageRouter;

/// Tool that sends a direct message to another agent.
#[derive(Clone)]
pub struct MessageTool {
    pub(crate) router: Arc<MessageRouter>,
    pub(crate) owner: String,
}

impl MessageTool {
    pub fn new(router: Arc<MessageRouter>, owner: &str) -> Self {
        Self {
            router,
            owner: owner.to_string(),
        }
    }
}

#[async_trait]
impl Tool for MessageTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "message",
            "Send a message to one other agent by name and wait for their reply.",
            Schema::object()
                .required_property(
                    "name",
                    Schema::string("Name of the agent to message, exactly as listed in the team roster."),
                )
                .required_property("text", Schema::string("The message to send.")),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let target = string_arg(&args, "name")?;
        let text = string_arg(&args, "text")?;
        Ok(self.router.send(target, text, &self.owner).await)
    }
}
