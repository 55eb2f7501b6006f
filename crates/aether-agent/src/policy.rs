// ABOUTME: CapabilityPolicy decides which tools each role receives and installs them once per agent.
// ABOUTME: Tools are bound to the agent's name so messages and notes are attributed correctly.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use aether_core::{AgentRole, WorkQueue};

use crate::agent::Agent;
use crate::hiring::HiringService;
use crate::router::MessageRouter;
use crate::tools::{
    AssignWorkItemTool, BroadcastTool, CompleteWorkItemTool, CreateWorkItemTool,
    GetWorkItemDetailTool, HireTool, MessageTool, Tool, ToolRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("{0} already has tools that were not granted by this policy")]
    ToolsAlreadyInstalled(String),
}

/// Maps roles to their fixed tool sets.
pub struct CapabilityPolicy {
    router: Arc<MessageRouter>,
    queue: Arc<WorkQueue>,
    hiring: Weak<HiringService>,
    wired: Mutex<HashSet<String>>,
}

impl CapabilityPolicy {
    pub fn new(
        router: Arc<MessageRouter>,
        queue: Arc<WorkQueue>,
        hiring: Weak<HiringService>,
    ) -> Self {
        Self {
            router,
            queue,
            hiring,
            wired: Mutex::new(HashSet::new()),
        }
    }

    /// Names of the tools a role is granted, in grant order.
    pub fn tool_names_for(role: AgentRole) -> &'static [&'static str] {
        match role {
            AgentRole::Ceo => &["message", "broadcast", "hire"],
            AgentRole::ProjectManager => &[
                "message",
                "createWorkItem",
                "assignWorkItem",
                "getWorkItemDetail",
                "completeWorkItem",
            ],
            AgentRole::Coder | AgentRole::Tester => &[
                "message",
                "completeWorkItem",
                "assignWorkItem",
                "getWorkItemDetail",
            ],
        }
    }

    fn tools_for(&self, role: AgentRole, owner: &str) -> Vec<Arc<dyn Tool>> {
        let message: Arc<dyn Tool> = Arc::new(MessageTool::new(self.router.clone(), owner));
        let create = || -> Arc<dyn Tool> { Arc::new(CreateWorkItemTool::new(self.queue.clone())) };
        let assign = || -> Arc<dyn Tool> {
            Arc::new(AssignWorkItemTool::new(
                self.queue.clone(),
                self.router.clone(),
                owner,
            ))
        };
        let detail = || -> Arc<dyn Tool> { Arc::new(GetWorkItemDetailTool::new(self.queue.clone())) };
        let complete =
            || -> Arc<dyn Tool> { Arc::new(CompleteWorkItemTool::new(self.queue.clone(), owner)) };

        match role {
            AgentRole::Ceo => vec![
                message,
                Arc::new(BroadcastTool::new(self.router.clone(), owner)),
                Arc::new(HireTool::new(self.hiring.clone())),
            ],
            AgentRole::ProjectManager => vec![message, create(), assign(), detail(), complete()],
            AgentRole::Coder | AgentRole::Tester => vec![message, complete(), assign(), detail()],
        }
    }

    /// Install the role's tools on `agent`. Returns Ok(false) without
    /// touching the agent if its name has already been wired.
    pub async fn grant(&self, agent: &Agent) -> Result<bool, PolicyError> {
        let mut wired = self.wired.lock().await;
        if wired.contains(agent.name()) {
            tracing::debug!(agent = %agent.name(), "tools already granted");
            return Ok(false);
        }

        let mut registry = ToolRegistry::new();
        for tool in self.tools_for(agent.role(), agent.name()) {
            registry.register(tool);
        }
        if !agent.install_tools(registry) {
            return Err(PolicyError::ToolsAlreadyInstalled(agent.name().to_string()));
        }
        wired.insert(agent.name().to_string());

        tracing::info!(agent = %agent.name(), role = %agent.role(), tools = ?agent.tool_names(), "tools granted");
        Ok(true)
    }
}
