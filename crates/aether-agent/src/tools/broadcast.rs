// ABOUTME: Implements the broadcast tool: send one message to every other agent at once.
// ABOUTME: Returns the router's per-recipient report, one "name: reply" line each.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::{Schema, ToolDeclaration};

use super::{Tool, string_arg};
use crate::router::MessageRouter;

#[derive(Clone)]
pub struct BroadcastTool {
    pub(crate) router: Arc<MessageRouter>,
    pub(crate) owner: String,
}

impl BroadcastTool {
    pub fn new(router: Arc<MessageRouter>, owner: &str) -> Self {
        Self {
            router,
            owner: owner.to_string(),
        }
    }
}

#[async_trait]
impl Tool for BroadcastTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration::new(
            "broadcast",
            "Send the same message to every other agent on the team at once. Returns each agent's reply on its own line.",
            Schema::object().required_property("text", Schema::string("The message to send to everyone.")),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let text = string_arg(&args, "text")?;
        Ok(self.router.broadcast(text, &self.owner).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::directory::Directory;
    use crate::retry::RetryPolicy;
    use crate::testing::ScriptedLlmClient;
    use aether_core::AgentRole;
    use serde_json::json;

    #[tokio::test]
    async fn broadcast_reaches_everyone_but_the_owner() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("Ben", "ready");
        client.push_text("Cat", "also ready");
        let directory = Arc::new(Directory::new());
        for name in ["Ana", "Ben", "Cat"] {
            let agent = Agent::new(name, AgentRole::Coder, "", client.clone(), RetryPolicy::default());
            directory.add(Arc::new(agent)).await.unwrap();
        }
        let tool = BroadcastTool::new(Arc::new(MessageRouter::new(&directory)), "Ana");

        assert_eq!(tool.declaration().name, "broadcast");
        let report = tool.run(json!({"text": "kickoff"})).await.unwrap();

        assert_eq!(report, "Ben: ready\nCat: also ready");
        assert!(client.requests_for("Ana").is_empty());
    }

    #[tokio::test]
    async fn missing_text_is_an_error() {
        let directory = Arc::new(Directory::new());
        let tool = BroadcastTool::new(Arc::new(MessageRouter::new(&directory)), "Ana");

        assert!(tool.run(json!({})).await.is_err());
    }
}
