// ABOUTME: Defines the closed set of agent roles and their parsing from free-form strings.
// ABOUTME: Unknown role names are a configuration error that must halt agent creation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a role name coming from a dynamic source (a model's tool call,
/// configuration, an HTTP request) does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

/// The functional role an agent plays on the team. Each role is granted a
/// fixed set of tools when the agent is hired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "Ceo")]
    Ceo,
    #[serde(rename = "Project Manager")]
    ProjectManager,
    #[serde(rename = "Coder")]
    Coder,
    #[serde(rename = "Tester")]
    Tester,
}

impl AgentRole {
    /// Every role, in the order they are offered to hiring agents.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Ceo,
        AgentRole::ProjectManager,
        AgentRole::Coder,
        AgentRole::Tester,
    ];

    /// The display name used in rosters, prompts and tool schemas.
    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::Ceo => "Ceo",
            AgentRole::ProjectManager => "Project Manager",
            AgentRole::Coder => "Coder",
            AgentRole::Tester => "Tester",
        }
    }

    /// Labels of all roles, for use as a schema `enum`.
    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|r| r.label().to_string()).collect()
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgentRole {
    type Err = RoleError;

    /// Accepts the display label case-insensitively, plus the compact
    /// spellings models tend to produce ("ProjectManager", "project_manager").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "ceo" => Ok(AgentRole::Ceo),
            "projectmanager" | "pm" => Ok(AgentRole::ProjectManager),
            "coder" => Ok(AgentRole::Coder),
            "tester" => Ok(AgentRole::Tester),
            _ => Err(RoleError(s.to_string())),
        }
    }
}
