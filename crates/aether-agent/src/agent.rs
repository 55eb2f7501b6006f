// ABOUTME: The Agent: one named conversation driving the model/tool-execution loop.
// ABOUTME: Also defines AgentError, the failures a top-level call can surface to its caller.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use aether_core::{AgentRole, FunctionCall, HistoryEntry, Turn};

use crate::directory::Directory;
use crate::llm::{GenerateRequest, LlmClient, LlmError};
use crate::retry::{RetryPolicy, generate_with_retry};
use crate::tools::ToolRegistry;
use crate::wait_graph::WaitEdge;

/// Returned when the model ends a turn with neither text nor a tool call.
pub const NO_RESPONSE: &str = "(no response)";

const INTERRUPTED: &str =
    "Error: this tool call was interrupted before it finished. Its effects are unknown.";

tokio::task_local! {
    /// Names of the agents whose loops are waiting further up this call chain.
    static CALL_CHAIN: Vec<String>;
}

/// Errors that end a top-level call to an agent. Tool failures never show
/// up here; they are fed back to the model as text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("model call failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("model call failed: {0}")]
    Provider(LlmError),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{name} is already waiting on this call chain")]
    Reentrant { name: String },
}

/// A named, role-bound conversation with the model.
///
/// Calls to one agent are serialized: a second `post_message` waits until
/// the first has returned, so history is never interleaved.
pub struct Agent {
    name: String,
    role: AgentRole,
    system_instructions: String,
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    directory: Weak<Directory>,
    tools: OnceLock<ToolRegistry>,
    history: RwLock<Vec<HistoryEntry>>,
    inflight: Mutex<()>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("provider", &self.client.provider_name())
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(
        name: &str,
        role: AgentRole,
        system_instructions: &str,
        client: Arc<dyn LlmClient>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            name: name.to_string(),
            role,
            system_instructions: system_instructions.to_string(),
            client,
            retry,
            directory: Weak::new(),
            tools: OnceLock::new(),
            history: RwLock::new(Vec::new()),
            inflight: Mutex::new(()),
        }
    }

    /// Attach the directory whose roster is appended to every request.
    pub fn with_directory(mut self, directory: Weak<Directory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    /// Install the agent's tools. Only the first call has any effect;
    /// returns false if tools were already installed.
    pub fn install_tools(&self, registry: ToolRegistry) -> bool {
        self.tools.set(registry).is_ok()
    }

    pub fn has_tools(&self) -> bool {
        self.tools.get().is_some()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.get().map(ToolRegistry::names).unwrap_or_default()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.clone()
    }

    pub async fn turns(&self) -> Vec<Turn> {
        self.history
            .read()
            .await
            .iter()
            .map(|e| e.turn.clone())
            .collect()
    }

    /// Send text to the agent and wait for its final reply.
    pub async fn post_message(&self, text: &str) -> Result<String, AgentError> {
        self.post_message_until(text, None).await
    }

    pub async fn post_message_within(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<String, AgentError> {
        self.post_message_until(text, Some(Instant::now() + timeout))
            .await
    }

    /// Send text to the agent, giving up at `deadline`. An abandoned call
    /// leaves the agent usable for later calls.
    pub async fn post_message_until(
        &self,
        text: &str,
        deadline: Option<Instant>,
    ) -> Result<String, AgentError> {
        let mut chain = CALL_CHAIN.try_with(|c| c.clone()).unwrap_or_default();
        if chain.iter().any(|n| *n == self.name) {
            tracing::warn!(agent = %self.name, chain = ?chain, "refusing reentrant call");
            return Err(AgentError::Reentrant {
                name: self.name.clone(),
            });
        }
        let _waiting = self.record_wait(&chain)?;
        chain.push(self.name.clone());

        CALL_CHAIN
            .scope(chain, async {
                let _turn = match deadline {
                    Some(at) => tokio::time::timeout_at(at, self.inflight.lock())
                        .await
                        .map_err(|_| AgentError::DeadlineExceeded)?,
                    None => self.inflight.lock().await,
                };
                self.run(text, deadline).await
            })
            .await
    }

    /// Register the calling agent as waiting on this one, refusing the call
    /// if this agent is already, through any other chain, waiting on one of
    /// the callers. External calls have no caller and are never refused.
    fn record_wait(&self, chain: &[String]) -> Result<Option<WaitEdge>, AgentError> {
        let (Some(caller), Some(directory)) = (chain.last(), self.directory.upgrade()) else {
            return Ok(None);
        };
        match directory.waits().try_wait(caller, &self.name, chain) {
            Some(edge) => Ok(Some(edge)),
            None => {
                tracing::warn!(
                    agent = %self.name,
                    caller = %caller,
                    "refusing call that would wait in a cycle"
                );
                Err(AgentError::Reentrant {
                    name: self.name.clone(),
                })
            }
        }
    }

    async fn run(&self, text: &str, deadline: Option<Instant>) -> Result<String, AgentError> {
        self.seal_dangling_call().await;
        self.append(Turn::user(text)).await;

        loop {
            let request = self.build_request().await;
            let parts =
                generate_with_retry(self.client.as_ref(), &request, &self.retry, deadline).await?;

            let turn = Turn::model(parts);
            let calls: Vec<FunctionCall> = turn.function_calls().into_iter().cloned().collect();
            let reply = turn.first_text().map(str::to_string);
            self.append(turn).await;

            let Some((call, skipped)) = calls.split_first() else {
                return Ok(reply.unwrap_or_else(|| {
                    tracing::warn!(agent = %self.name, "model returned neither text nor a tool call");
                    NO_RESPONSE.to_string()
                }));
            };

            let result = match self.execute(call, deadline).await {
                Ok(result) => result,
                Err(e) => {
                    self.append(Turn::tool_result(&call.name, INTERRUPTED)).await;
                    for extra in skipped {
                        self.append(Turn::tool_result(&extra.name, INTERRUPTED)).await;
                    }
                    return Err(e);
                }
            };
            self.append(Turn::tool_result(&call.name, result)).await;

            for extra in skipped {
                tracing::debug!(agent = %self.name, tool = %extra.name, "skipping extra tool call");
                self.append(Turn::tool_result(
                    &extra.name,
                    format!(
                        "Not executed: only the first tool call in a turn runs (this turn ran '{}'). Call '{}' again if it is still needed.",
                        call.name, extra.name
                    ),
                ))
                .await;
            }
        }
    }

    async fn execute(
        &self,
        call: &FunctionCall,
        deadline: Option<Instant>,
    ) -> Result<String, AgentError> {
        let Some(tool) = self.tools.get().and_then(|tools| tools.get(&call.name)) else {
            tracing::warn!(agent = %self.name, tool = %call.name, "model requested an unavailable tool");
            return Ok(format!(
                "Error: tool '{}' is not available to {}.",
                call.name, self.name
            ));
        };

        tracing::info!(agent = %self.name, tool = %call.name, "executing tool");
        let running = tool.run(call.args.clone());
        let outcome = match deadline {
            Some(at) => tokio::time::timeout_at(at, running).await.map_err(|_| {
                tracing::warn!(agent = %self.name, tool = %call.name, "tool call abandoned at deadline");
                AgentError::DeadlineExceeded
            })?,
            None => running.await,
        };

        Ok(match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(agent = %self.name, tool = %call.name, error = %e, "tool returned an error");
                format!("Error: {e:#}")
            }
        })
    }

    /// If an earlier call was dropped between a tool request and its result,
    /// answer the dangling call so every call keeps a matching result.
    async fn seal_dangling_call(&self) {
        let mut history = self.history.write().await;
        let dangling: Vec<String> = history
            .last()
            .map(|e| {
                e.turn
                    .function_calls()
                    .into_iter()
                    .map(|c| c.name.clone())
                    .collect()
            })
            .unwrap_or_default();
        for name in dangling {
            history.push(HistoryEntry::new(Turn::tool_result(name, INTERRUPTED)));
        }
    }

    async fn build_request(&self) -> GenerateRequest {
        let roster = match self.directory.upgrade() {
            Some(directory) => directory.listing().await,
            None => String::new(),
        };
        let system_instruction = if roster.is_empty() {
            self.system_instructions.clone()
        } else {
            format!(
                "{}\n\nThe current team, as \"name: role\":\n{}",
                self.system_instructions, roster
            )
        };

        GenerateRequest {
            agent: self.name.clone(),
            system_instruction,
            history: self.turns().await,
            tools: self
                .tools
                .get()
                .map(ToolRegistry::declarations)
                .unwrap_or_default(),
        }
    }

    async fn append(&self, turn: Turn) {
        self.history.write().await.push(HistoryEntry::new(turn));
    }
}
