// ABOUTME: HTTP server for Aether Swarm: observe agents and work items, and message agents.
// ABOUTME: Uses Axum with a shared Swarm; configuration comes from AETHER_* environment variables.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{AetherConfig, ConfigError};
pub use routes::create_router;
