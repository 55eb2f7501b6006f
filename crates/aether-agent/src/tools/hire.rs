// ABOUTME: Implements the hire tool: bring a new agent with a role and personality hat onto the team.
// ABOUTME: Hiring failures, including an exhausted name pool, are returned as "Error: ..." text.

use std::sync::Weak;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::{AgentRole, Schema, ToolDeclaration};

use super::{Tool, string_arg};
use crate::hiring::HiringService;

#[derive(Clone)]
pub struct HireTool {
    pub(crate) hiring: Weak<HiringService>,
}

impl HireTool {
    pub fn new(hiring: Weak<HiringService>) -> Self {
        Self { hiring }
    }
}

#[async_trait]
impl Tool for HireTool {
    fn declaration(&self) -> ToolDeclaration {
        let hats = self
            .hiring
            .upgrade()
            .map(|hiring| hiring.persona_tags())
            .unwrap_or_default();
        ToolDeclaration::new(
            "hire",
            "Hire a new agent with the given role and personality hat. Returns the new agent's name.",
            Schema::object()
                .required_property(
                    "role",
                    Schema::string("The role of the new agent.").one_of(AgentRole::labels()),
                )
                .required_property(
                    "hat",
                    Schema::string("The personality hat color of the new agent.").one_of(hats),
                ),
        )
    }

    async fn run(&self, args: Value) -> Result<String, anyhow::Error> {
        let role = string_arg(&args, "role")?;
        let hat = string_arg(&args, "hat")?;

        let Some(hiring) = self.hiring.upgrade() else {
            return Ok("Error: hiring is no longer available.".to_string());
        };
        match hiring.hire(role, hat).await {
            Ok(agent) => Ok(format!(
                "You have successfully hired {} as a new {}.",
                agent.name(),
                agent.role()
            )),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::NamePool;
    use crate::swarm::Swarm;
    use crate::testing::StubLlmClient;
    use serde_json::json;
    use std::sync::Arc;

    fn swarm(names: &[&str]) -> Swarm {
        Swarm::builder(Arc::new(StubLlmClient::done()))
            .names(NamePool::new(names.iter().copied()))
            .build()
    }

    #[test]
    fn declaration_lists_roles_and_hats() {
        let swarm = swarm(&[]);
        let tool = HireTool::new(Arc::downgrade(swarm.hiring()));

        let decl = tool.declaration();
        assert_eq!(decl.name, "hire");
        assert_eq!(
            decl.parameters.properties["role"].enum_values,
            vec!["Ceo", "Project Manager", "Coder", "Tester"]
        );
        assert!(
            decl.parameters.properties["hat"]
                .enum_values
                .contains(&"blue".to_string())
        );
    }

    #[tokio::test]
    async fn hires_and_reports_the_new_name() {
        let swarm = swarm(&["Mei"]);
        let tool = HireTool::new(Arc::downgrade(swarm.hiring()));

        let out = tool
            .run(json!({"role": "Project Manager", "hat": "white"}))
            .await
            .unwrap();

        assert_eq!(out, "You have successfully hired Mei as a new Project Manager.");
        assert!(swarm.directory().contains("Mei").await);
    }

    #[tokio::test]
    async fn failures_are_text() {
        let swarm = swarm(&["Mei"]);
        let tool = HireTool::new(Arc::downgrade(swarm.hiring()));

        let bad_role = tool
            .run(json!({"role": "Janitor", "hat": "white"}))
            .await
            .unwrap();
        assert!(bad_role.starts_with("Error:"), "got: {bad_role}");

        tool.run(json!({"role": "Coder", "hat": "red"})).await.unwrap();
        let exhausted = tool
            .run(json!({"role": "Coder", "hat": "red"}))
            .await
            .unwrap();
        assert!(exhausted.contains("names"), "got: {exhausted}");
    }
}
