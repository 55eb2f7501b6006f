// ABOUTME: API handler modules for the Aether HTTP server.
// ABOUTME: Agents (roster, history, messages) and work items (list, detail).

pub mod agents;
pub mod work_items;
