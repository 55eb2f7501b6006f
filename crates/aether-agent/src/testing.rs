// ABOUTME: Test utilities for aether-agent, including stub and scripted LLM clients.
// ABOUTME: Used in tests to simulate model responses per agent without real API calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::Part;

use crate::llm::{GenerateRequest, LlmClient, LlmError};

/// A stub LLM client that always answers with the same text.
#[derive(Debug, Clone)]
pub struct StubLlmClient {
    response_text: String,
}

impl StubLlmClient {
    pub fn new(response_text: &str) -> Self {
        Self {
            response_text: response_text.to_owned(),
        }
    }

    /// Create a stub client that returns "Done."
    pub fn done() -> Self {
        Self::new("Done.")
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn generate(&self, _request: &GenerateRequest) -> Result<Vec<Part>, LlmError> {
        Ok(vec![Part::text(&self.response_text)])
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

struct ScriptedReply {
    delay: Option<Duration>,
    outcome: Result<Vec<Part>, LlmError>,
}

#[derive(Default)]
struct Script {
    queues: HashMap<String, VecDeque<ScriptedReply>>,
    requests: Vec<GenerateRequest>,
}

/// An LLM client that plays back queued replies, keyed by the requesting
/// agent's name. One client can drive a whole swarm in tests.
///
/// When an agent's queue is empty the client answers "Done." so loops
/// always terminate. Every request is recorded for later inspection.
#[derive(Default)]
pub struct ScriptedLlmClient {
    script: Mutex<Script>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, agent: &str, reply: ScriptedReply) {
        self.lock()
            .queues
            .entry(agent.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queue a plain text reply.
    pub fn push_text(&self, agent: &str, text: &str) {
        self.push_parts(agent, vec![Part::text(text)]);
    }

    /// Queue a reply requesting a single tool call.
    pub fn push_call(&self, agent: &str, tool: &str, args: Value) {
        self.push_parts(agent, vec![Part::function_call(tool, args)]);
    }

    pub fn push_parts(&self, agent: &str, parts: Vec<Part>) {
        self.push(
            agent,
            ScriptedReply {
                delay: None,
                outcome: Ok(parts),
            },
        );
    }

    pub fn push_error(&self, agent: &str, error: LlmError) {
        self.push(
            agent,
            ScriptedReply {
                delay: None,
                outcome: Err(error),
            },
        );
    }

    /// Queue a reply that is only returned after `delay` has elapsed.
    pub fn push_delayed(
        &self,
        agent: &str,
        delay: Duration,
        outcome: Result<Vec<Part>, LlmError>,
    ) {
        self.push(
            agent,
            ScriptedReply {
                delay: Some(delay),
                outcome,
            },
        );
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.lock().requests.clone()
    }

    /// Requests issued on behalf of one agent.
    pub fn requests_for(&self, agent: &str) -> Vec<GenerateRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.agent == agent)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Part>, LlmError> {
        let reply = {
            let mut script = self.lock();
            script.requests.push(request.clone());
            script
                .queues
                .get_mut(&request.agent)
                .and_then(|queue| queue.pop_front())
        };

        let Some(reply) = reply else {
            return Ok(vec![Part::text("Done.")]);
        };
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.outcome
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_from(agent: &str) -> GenerateRequest {
        GenerateRequest {
            agent: agent.into(),
            system_instruction: String::new(),
            history: vec![],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn stub_returns_configured_text() {
        let client = StubLlmClient::new("Hello, world!");
        let parts = client.generate(&request_from("Alice")).await.unwrap();
        assert_eq!(parts, vec![Part::text("Hello, world!")]);
    }

    #[tokio::test]
    async fn scripted_replies_are_per_agent_and_in_order() {
        let client = ScriptedLlmClient::new();
        client.push_call("Alice", "broadcast", json!({"text": "hi"}));
        client.push_text("Alice", "second");
        client.push_text("Bob", "bob's turn");

        let first = client.generate(&request_from("Alice")).await.unwrap();
        assert_eq!(first[0].as_function_call().unwrap().name, "broadcast");

        let bob = client.generate(&request_from("Bob")).await.unwrap();
        assert_eq!(bob, vec![Part::text("bob's turn")]);

        let second = client.generate(&request_from("Alice")).await.unwrap();
        assert_eq!(second, vec![Part::text("second")]);

        assert_eq!(client.requests_for("Alice").len(), 2);
        assert_eq!(client.request_count(), 3);
    }

    #[tokio::test]
    async fn empty_queue_answers_done() {
        let client = ScriptedLlmClient::new();
        let parts = client.generate(&request_from("Nobody")).await.unwrap();
        assert_eq!(parts, vec![Part::text("Done.")]);
    }
}
