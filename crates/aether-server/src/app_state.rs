// ABOUTME: Shared application state for the Aether HTTP server.
// ABOUTME: Holds the run's Swarm so handlers can read the roster, histories and work queue.

use std::sync::Arc;

use aether_agent::Swarm;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub swarm: Arc<Swarm>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(swarm: Arc<Swarm>) -> Self {
        Self { swarm }
    }
}
