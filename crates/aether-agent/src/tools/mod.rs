// ABOUTME: The Tool trait every agent capability implements, plus the per-agent ToolRegistry.
// ABOUTME: Submodules hold the concrete tools: message, broadcast, hire and the work-item tools.

pub mod broadcast;
pub mod hire;
pub mod message;
pub mod work_items;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aether_core::ToolDeclaration;

pub use broadcast::BroadcastTool;
pub use hire::HireTool;
pub use message::MessageTool;
pub use work_items::{AssignWorkItemTool, CompleteWorkItemTool, CreateWorkItemTool, GetWorkItemDetailTool};

/// A capability the model can invoke by name.
///
/// `run` returns text fed back into the conversation. Errors are also
/// rendered as text by the agent loop, so the model can adapt.
#[async_trait]
pub trait Tool: Send + Sync {
    fn declaration(&self) -> ToolDeclaration;

    async fn run(&self, args: Value) -> Result<String, anyhow::Error>;
}

/// An agent's tools, in the order they were granted.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.declaration().name;
        if let Some(slot) = self.tools.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = tool;
        } else {
            self.tools.push((name, tool));
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tool)| Arc::clone(tool))
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|(_, tool)| tool.declaration()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Read a required string argument.
pub(crate) fn string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, anyhow::Error> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing '{}' parameter", key))
}

/// Read a work item id. Models send ids as integers, floats or strings.
pub(crate) fn id_arg(args: &Value, key: &str) -> Result<u64, anyhow::Error> {
    let value = args
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("missing '{}' parameter", key))?;
    if let Some(id) = value.as_u64() {
        return Ok(id);
    }
    if let Some(f) = value.as_f64()
        && f >= 0.0
        && f.fract() == 0.0
    {
        return Ok(f as u64);
    }
    if let Some(s) = value.as_str()
        && let Ok(id) = s.trim().parse::<u64>()
    {
        return Ok(id);
    }
    Err(anyhow::anyhow!("'{}' must be a work item id, got {}", key, value))
}
