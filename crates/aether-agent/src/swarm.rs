// ABOUTME: Swarm bundles the services of one run: directory, work queue, router and hiring.
// ABOUTME: Built once with SwarmBuilder and shared by the binary, the HTTP layer and tests.

use std::sync::Arc;
use std::time::Duration;

use aether_core::{AgentRole, HistoryEntry, WorkQueue};

use crate::agent::{Agent, AgentError};
use crate::directory::{Directory, RosterEntry};
use crate::hiring::{HireError, HiringService};
use crate::llm::LlmClient;
use crate::personas::{BuiltinPersonas, NamePool, PersonaProvider};
use crate::retry::RetryPolicy;
use crate::router::MessageRouter;

/// Errors from posting a message through the swarm.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwarmError {
    #[error("Agent with name '{0}' not found")]
    UnknownAgent(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// The explicitly constructed services for one run.
pub struct Swarm {
    directory: Arc<Directory>,
    work_queue: Arc<WorkQueue>,
    router: Arc<MessageRouter>,
    hiring: Arc<HiringService>,
    call_timeout: Option<Duration>,
}

impl Swarm {
    pub fn builder(client: Arc<dyn LlmClient>) -> SwarmBuilder {
        SwarmBuilder::new(client)
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn work_queue(&self) -> &Arc<WorkQueue> {
        &self.work_queue
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    pub fn hiring(&self) -> &Arc<HiringService> {
        &self.hiring
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub async fn hire(&self, role: AgentRole, persona: &str) -> Result<Arc<Agent>, HireError> {
        self.hiring.hire_role(role, persona).await
    }

    /// Send text to a named agent from outside the swarm, applying the
    /// configured per-call deadline.
    pub async fn post_message(&self, name: &str, text: &str) -> Result<String, SwarmError> {
        let agent = self
            .directory
            .get(name)
            .await
            .ok_or_else(|| SwarmError::UnknownAgent(name.to_string()))?;
        let reply = match self.call_timeout {
            Some(timeout) => agent.post_message_within(text, timeout).await?,
            None => agent.post_message(text).await?,
        };
        Ok(reply)
    }

    pub async fn roster(&self) -> Vec<RosterEntry> {
        self.directory.roster().await
    }

    pub async fn history(&self, name: &str) -> Option<Vec<HistoryEntry>> {
        let agent = self.directory.get(name).await?;
        Some(agent.history().await)
    }
}

/// Configures and builds a [`Swarm`].
pub struct SwarmBuilder {
    client: Arc<dyn LlmClient>,
    personas: Arc<dyn PersonaProvider>,
    names: Option<NamePool>,
    retry: RetryPolicy,
    call_timeout: Option<Duration>,
}

impl SwarmBuilder {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            personas: Arc::new(BuiltinPersonas),
            names: None,
            retry: RetryPolicy::default(),
            call_timeout: None,
        }
    }

    pub fn personas(mut self, personas: Arc<dyn PersonaProvider>) -> Self {
        self.personas = personas;
        self
    }

    /// Use a fixed name pool instead of the shuffled default.
    pub fn names(mut self, names: NamePool) -> Self {
        self.names = Some(names);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn build(self) -> Swarm {
        let directory = Arc::new(Directory::new());
        let work_queue = Arc::new(WorkQueue::new());
        let router = Arc::new(MessageRouter::new(&directory));
        let hiring = HiringService::new(
            directory.clone(),
            router.clone(),
            work_queue.clone(),
            self.client,
            self.personas,
            self.names.unwrap_or_else(NamePool::shuffled),
            self.retry,
        );
        Swarm {
            directory,
            work_queue,
            router,
            hiring,
            call_timeout: self.call_timeout,
        }
    }
}
