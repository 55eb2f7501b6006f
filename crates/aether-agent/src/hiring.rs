// ABOUTME: HiringService creates agents: allocates a name, composes instructions, grants tools, registers.
// ABOUTME: Owns the CapabilityPolicy so that hire tools it grants can call back into it.

use std::sync::Arc;

use tokio::sync::Mutex;

use aether_core::{AgentRole, RoleError, WorkQueue};

use crate::agent::Agent;
use crate::directory::{Directory, DirectoryError};
use crate::llm::LlmClient;
use crate::personas::{NamePool, PersonaProvider, TOOL_USAGE_GUIDE};
use crate::policy::{CapabilityPolicy, PolicyError};
use crate::retry::RetryPolicy;
use crate::router::MessageRouter;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HireError {
    #[error(transparent)]
    UnknownRole(#[from] RoleError),

    #[error("unknown personality hat '{tag}'; choose one of: {known}")]
    UnknownPersona { tag: String, known: String },

    #[error("all names have been used; no more agents can be hired")]
    NamePoolExhausted,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Builds new agents and puts them to work.
pub struct HiringService {
    directory: Arc<Directory>,
    policy: CapabilityPolicy,
    client: Arc<dyn LlmClient>,
    personas: Arc<dyn PersonaProvider>,
    names: Mutex<NamePool>,
    retry: RetryPolicy,
}

impl HiringService {
    pub fn new(
        directory: Arc<Directory>,
        router: Arc<MessageRouter>,
        queue: Arc<WorkQueue>,
        client: Arc<dyn LlmClient>,
        personas: Arc<dyn PersonaProvider>,
        names: NamePool,
        retry: RetryPolicy,
    ) -> Arc<Self> {
        Arc::new_cyclic(|hiring| Self {
            directory,
            policy: CapabilityPolicy::new(router, queue, hiring.clone()),
            client,
            personas,
            names: Mutex::new(names),
            retry,
        })
    }

    pub fn persona_tags(&self) -> Vec<String> {
        self.personas.persona_tags()
    }

    /// Hire an agent from role and persona strings, as supplied by a tool call.
    pub async fn hire(&self, role: &str, persona: &str) -> Result<Arc<Agent>, HireError> {
        let role: AgentRole = role.parse()?;
        self.hire_role(role, persona).await
    }

    pub async fn hire_role(&self, role: AgentRole, persona: &str) -> Result<Arc<Agent>, HireError> {
        let persona_text = self.personas.persona_instructions(persona).ok_or_else(|| {
            HireError::UnknownPersona {
                tag: persona.to_string(),
                known: self.personas.persona_tags().join(", "),
            }
        })?;

        let name = self
            .names
            .lock()
            .await
            .next_name()
            .ok_or(HireError::NamePoolExhausted)?;

        let instructions = compose_instructions(
            &name,
            &self.personas.role_instructions(role),
            &persona_text,
        );
        let agent = Arc::new(
            Agent::new(
                &name,
                role,
                &instructions,
                Arc::clone(&self.client),
                self.retry.clone(),
            )
            .with_directory(Arc::downgrade(&self.directory)),
        );

        self.policy.grant(&agent).await?;
        self.directory.add(Arc::clone(&agent)).await?;

        tracing::info!(agent = %name, role = %role, persona = %persona, "agent hired");
        Ok(agent)
    }
}

fn compose_instructions(name: &str, role_text: &str, persona_text: &str) -> String {
    format!(
        "You are {name}.\n{role_text}\n\n\
         A little about your personality:\n{persona_text}\n\n\
         Depending on your role, you will have various tools at your disposal.\n\n\
         {TOOL_USAGE_GUIDE}"
    )
}
