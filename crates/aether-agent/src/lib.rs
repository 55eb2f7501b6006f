// ABOUTME: Agent engine for Aether Swarm: model clients, the agent loop, routing, tools and hiring.
// ABOUTME: Provider adapters live under providers/, concrete tools under tools/.

pub mod agent;
pub mod client;
pub mod directory;
pub mod hiring;
pub mod llm;
pub mod personas;
pub mod policy;
pub mod providers;
pub mod retry;
pub mod router;
pub mod swarm;
pub mod testing;
pub mod tools;
pub mod wait_graph;

pub use agent::{Agent, AgentError, NO_RESPONSE};
pub use client::create_llm_client;
pub use directory::{Directory, DirectoryError, RosterEntry};
pub use hiring::{HireError, HiringService};
pub use llm::{GenerateRequest, LlmClient, LlmError};
pub use personas::{BuiltinPersonas, NamePool, PersonaProvider};
pub use policy::{CapabilityPolicy, PolicyError};
pub use retry::RetryPolicy;
pub use router::MessageRouter;
pub use swarm::{Swarm, SwarmBuilder, SwarmError};
pub use tools::{Tool, ToolRegistry};
pub use wait_graph::{WaitEdge, WaitGraph};
