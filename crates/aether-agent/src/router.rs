// ABOUTME: Routes messages between agents: direct send, concurrent broadcast, background dispatch.
// ABOUTME: Every outcome, including refusals and failures, comes back as text the caller can read.

use std::sync::{Arc, Weak};

use futures::future::join_all;

use crate::agent::AgentError;
use crate::directory::Directory;

/// Looks agents up in the directory and forwards messages to their loops.
pub struct MessageRouter {
    directory: Weak<Directory>,
}

impl MessageRouter {
    pub fn new(directory: &Arc<Directory>) -> Self {
        Self {
            directory: Arc::downgrade(directory),
        }
    }

    pub async fn has_agent(&self, name: &str) -> bool {
        match self.directory.upgrade() {
            Some(directory) => directory.contains(name).await,
            None => false,
        }
    }

    /// Deliver `text` to `target` and wait for its complete reply.
    pub async fn send(&self, target: &str, text: &str, from: &str) -> String {
        if target == from {
            tracing::debug!(agent = %from, "refusing message to self");
            return format!(
                "You cannot send a message to yourself, {from}. Message another agent instead."
            );
        }

        let Some(directory) = self.directory.upgrade() else {
            return "Error: the agent directory is no longer available.".to_string();
        };
        let Some(agent) = directory.get(target).await else {
            tracing::debug!(agent = %from, target = %target, "message to unknown agent");
            return format!("Error: Agent with name '{target}' not found.");
        };

        tracing::info!(agent = %from, target = %target, "delivering message");
        let framed = format!("[Message from {from}]\n{text}");
        match agent.post_message(&framed).await {
            Ok(reply) => reply,
            Err(AgentError::Reentrant { name }) => format!(
                "Error: {name} is waiting on this conversation and cannot take a message right now. Answer without them or try again later."
            ),
            Err(e) => {
                tracing::warn!(agent = %from, target = %target, error = %e, "message delivery failed");
                format!("Error: {target} could not respond: {e}")
            }
        }
    }

    /// Send `text` to every other agent concurrently. The report has one
    /// "name: reply" line per recipient, in directory order. A failing
    /// recipient gets an error line; the others are unaffected.
    pub async fn broadcast(&self, text: &str, from: &str) -> String {
        let Some(directory) = self.directory.upgrade() else {
            return "Error: the agent directory is no longer available.".to_string();
        };
        let recipients: Vec<String> = directory
            .names()
            .await
            .into_iter()
            .filter(|name| !from.starts_with(name.as_str()))
            .collect();

        if recipients.is_empty() {
            return "There is nobody else to broadcast to yet.".to_string();
        }

        tracing::info!(agent = %from, recipients = recipients.len(), "broadcasting");
        let replies = join_all(recipients.iter().map(|name| self.send(name, text, from))).await;

        recipients
            .iter()
            .zip(replies)
            .map(|(name, reply)| format!("{name}: {reply}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Deliver a message in the background without waiting for the reply.
    pub fn dispatch(self: &Arc<Self>, target: &str, text: String, from: &str) {
        let router = Arc::clone(self);
        let target = target.to_string();
        let from = from.to_string();
        tokio::spawn(async move {
            let reply = router.send(&target, &text, &from).await;
            tracing::debug!(agent = %target, reply = %reply, "background message answered");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::llm::LlmError;
    use crate::retry::RetryPolicy;
    use crate::testing::ScriptedLlmClient;
    use aether_core::{AgentRole, Part, Turn};
    use std::time::Duration;

    async fn swarm_of(
        client: &Arc<ScriptedLlmClient>,
        names: &[&str],
    ) -> (Arc<Directory>, Arc<MessageRouter>) {
        let directory = Arc::new(Directory::new());
        for name in names {
            let agent = Agent::new(
                name,
                AgentRole::Coder,
                "",
                client.clone(),
                RetryPolicy::new(1, Duration::ZERO),
            );
            directory.add(Arc::new(agent)).await.unwrap();
        }
        let router = Arc::new(MessageRouter::new(&directory));
        (directory, router)
    }

    #[tokio::test]
    async fn send_to_self_never_calls_the_model() {
        let client = Arc::new(ScriptedLlmClient::new());
        let (_directory, router) = swarm_of(&client, &["Ana"]).await;

        let reply = router.send("Ana", "hi me", "Ana").await;

        assert!(reply.contains("cannot send a message to yourself"));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn send_to_unknown_agent_is_text() {
        let client = Arc::new(ScriptedLlmClient::new());
        let (_directory, router) = swarm_of(&client, &["Ana"]).await;

        let reply = router.send("Ghost", "hello?", "Ana").await;

        assert_eq!(reply, "Error: Agent with name 'Ghost' not found.");
    }

    #[tokio::test]
    async fn send_frames_message_and_returns_reply_verbatim() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_text("Ben", "On it, boss.");
        let (directory, router) = swarm_of(&client, &["Ana", "Ben"]).await;

        let reply = router.send("Ben", "Fix the bug", "Ana").await;

        assert_eq!(reply, "On it, boss.");
        let ben = directory.get("Ben").await.unwrap();
        assert_eq!(
            ben.turns().await[0],
            Turn::user("[Message from Ana]\nFix the bug")
        );
    }

    #[tokio::test]
    async fn send_reports_provider_failures_as_text() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_error("Ben", LlmError::Unauthorized("bad key".into()));
        let (_directory, router) = swarm_of(&client, &["Ana", "Ben"]).await;

        let reply = router.send("Ben", "hello", "Ana").await;

        assert!(reply.starts_with("Error: Ben could not respond"), "got: {reply}");
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_keeps_directory_order_not_completion_order() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_delayed("Ben", Duration::from_secs(3), Ok(vec![Part::text("ben here")]));
        client.push_text("Cat", "cat here");
        let (_directory, router) = swarm_of(&client, &["Ana", "Ben", "Cat"]).await;

        let report = router.broadcast("roll call", "Ana").await;

        assert_eq!(report, "Ben: ben here\nCat: cat here");
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_runs_recipients_concurrently() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_delayed("Ben", Duration::from_secs(5), Ok(vec![Part::text("b")]));
        client.push_delayed("Cat", Duration::from_secs(5), Ok(vec![Part::text("c")]));
        let (_directory, router) = swarm_of(&client, &["Ana", "Ben", "Cat"]).await;

        let started = tokio::time::Instant::now();
        router.broadcast("go", "Ana").await;

        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn broadcast_substitutes_errors_per_recipient() {
        let client = Arc::new(ScriptedLlmClient::new());
        client.push_error(
            "Ben",
            LlmError::Server {
                status: 500,
                body: "boom".into(),
            },
        );
        client.push_text("Cat", "fine");
        let (_directory, router) = swarm_of(&client, &["Ana", "Ben", "Cat"]).await;

        let report = router.broadcast("status?", "Ana").await;
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Ben: Error:"), "got: {}", lines[0]);
        assert_eq!(lines[1], "Cat: fine");
    }

    #[tokio::test]
    async fn broadcast_excludes_sender_by_name_prefix() {
        let client = Arc::new(ScriptedLlmClient::new());
        let (_directory, router) = swarm_of(&client, &["Ana", "Ben"]).await;

        let report = router.broadcast("hello", "Ana (Ceo)").await;

        assert_eq!(report, "Ben: Done.");
        assert_eq!(client.requests_for("Ana").len(), 0);
    }

    #[tokio::test]
    async fn broadcast_with_no_recipients_explains() {
        let client = Arc::new(ScriptedLlmClient::new());
        let (_directory, router) = swarm_of(&client, &["Ana"]).await;

        let report = router.broadcast("anyone?", "Ana").await;

        assert!(report.contains("nobody else"));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let client = Arc::new(ScriptedLlmClient::new());
        let (directory, router) = swarm_of(&client, &["Ana", "Ben"]).await;

        router.dispatch("Ben", "heads up".into(), "Ana");

        let ben = directory.get("Ben").await.unwrap();
        for _ in 0..100 {
            if !ben.turns().await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(ben.turns().await[0], Turn::user("[Message from Ana]\nheads up"));
    }
}
