// ABOUTME: Process-wide registry of live agents keyed by name, in creation order.
// ABOUTME: Supplies roster text for prompts and serves as the router's address book.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use aether_core::AgentRole;

use crate::agent::Agent;
use crate::wait_graph::WaitGraph;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("an agent named '{0}' already exists")]
    DuplicateName(String),
}

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub role: AgentRole,
}

struct DirectoryEntry {
    name: String,
    role: AgentRole,
    agent: Arc<Agent>,
}

/// Registry of every agent hired during a run. Entries are never removed
/// or reordered.
#[derive(Default)]
pub struct Directory {
    entries: RwLock<Vec<DirectoryEntry>>,
    waits: Arc<WaitGraph>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Who is waiting on whom among this directory's agents.
    pub fn waits(&self) -> &Arc<WaitGraph> {
        &self.waits
    }

    pub async fn add(&self, agent: Arc<Agent>) -> Result<(), DirectoryError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.name == agent.name()) {
            return Err(DirectoryError::DuplicateName(agent.name().to_string()));
        }
        entries.push(DirectoryEntry {
            name: agent.name().to_string(),
            role: agent.role(),
            agent,
        });
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.name == name)
            .map(|e| Arc::clone(&e.agent))
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.name == name)
    }

    /// Snapshot of all names in creation order.
    pub async fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub async fn roster(&self) -> Vec<RosterEntry> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| RosterEntry {
                name: e.name.clone(),
                role: e.role,
            })
            .collect()
    }

    /// Roster text, one "name: role" line per agent.
    pub async fn listing(&self) -> String {
        self.roster()
            .await
            .iter()
            .map(|e| format!("{}: {}", e.name, e.role))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
