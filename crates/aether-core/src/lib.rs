// ABOUTME: Core library for Aether Swarm, holding the domain types shared by every crate.
// ABOUTME: Roles, conversation turns, tool schemas and the work queue live here, free of network I/O.

pub mod role;
pub mod schema;
pub mod turn;
pub mod work_queue;

pub use role::{AgentRole, RoleError};
pub use schema::{Schema, SchemaType, ToolDeclaration};
pub use turn::{FunctionCall, HistoryEntry, Part, Turn};
pub use work_queue::{
    FIRST_WORK_ITEM_ID, WorkItem, WorkItemDraft, WorkQueue, WorkQueueError, WorkStatus,
};
