// ABOUTME: Configuration loading and validation for an Aether Swarm run.
// ABOUTME: Reads AETHER_* environment variables into AetherConfig with defaults.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use aether_agent::RetryPolicy;

pub const DEFAULT_BIND: &str = "127.0.0.1:7340";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AETHER_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("AETHER_MAX_ATTEMPTS must be at least 1")]
    ZeroAttempts,
}

/// Run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AetherConfig {
    pub bind: SocketAddr,
    pub provider: String,
    pub model: Option<String>,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub call_timeout: Option<Duration>,
    pub ceo_persona: String,
}

impl AetherConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - AETHER_BIND: socket address for the HTTP server (default: 127.0.0.1:7340)
    /// - AETHER_PROVIDER: LLM provider (default: gemini)
    /// - AETHER_MODEL: model override (optional)
    /// - AETHER_MAX_ATTEMPTS: attempts per model call for transient failures (default: 3)
    /// - AETHER_BACKOFF_MS: first retry delay in milliseconds, doubled each retry (default: 1000)
    /// - AETHER_CALL_TIMEOUT_SECS: deadline for each external message (optional)
    /// - AETHER_CEO_PERSONA: personality hat of the first agent (default: blue)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_str = var("AETHER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let provider = var("AETHER_PROVIDER").unwrap_or_else(|| "gemini".to_string());
        let model = var("AETHER_MODEL");

        let max_attempts = parse_number("AETHER_MAX_ATTEMPTS", var("AETHER_MAX_ATTEMPTS"))?
            .unwrap_or(3);
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        let max_attempts = u32::try_from(max_attempts).unwrap_or(u32::MAX);

        let backoff_ms = parse_number("AETHER_BACKOFF_MS", var("AETHER_BACKOFF_MS"))?.unwrap_or(1000);
        let call_timeout = parse_number("AETHER_CALL_TIMEOUT_SECS", var("AETHER_CALL_TIMEOUT_SECS"))?
            .map(Duration::from_secs);

        let ceo_persona = var("AETHER_CEO_PERSONA").unwrap_or_else(|| "blue".to_string());

        Ok(Self {
            bind,
            provider,
            model,
            max_attempts,
            backoff: Duration::from_millis(backoff_ms),
            call_timeout,
            ceo_persona,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff)
    }
}

fn parse_number(var: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { var, value: v })
        })
        .transpose()
}
