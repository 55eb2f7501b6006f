// ABOUTME: Retry loop around a single model call with exponential backoff.
// ABOUTME: Honors server-suggested rate-limit delays and an optional caller deadline.

use std::time::Duration;

use tokio::time::Instant;

use aether_core::Part;

use crate::agent::AgentError;
use crate::llm::{GenerateRequest, LlmClient, LlmError};

/// Retry settings for model calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed for transient failures, counting the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
    /// Server-suggested rate-limit waits allowed per call. These do not
    /// consume `max_attempts`.
    pub max_rate_limit_waits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_rate_limit_waits: 5,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (0-indexed): base * 2^attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

enum Decision {
    Retry(Duration),
    RateLimitWait(Duration),
    Fail(AgentError),
}

/// Call the model until it answers, the budget runs out, or the deadline
/// passes.
pub async fn generate_with_retry(
    client: &dyn LlmClient,
    request: &GenerateRequest,
    policy: &RetryPolicy,
    deadline: Option<Instant>,
) -> Result<Vec<Part>, AgentError> {
    let mut failures: u32 = 0;
    let mut rate_limit_waits: u32 = 0;

    loop {
        let outcome = match deadline {
            Some(at) => match tokio::time::timeout_at(at, client.generate(request)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(agent = %request.agent, "model call abandoned at deadline");
                    return Err(AgentError::DeadlineExceeded);
                }
            },
            None => client.generate(request).await,
        };

        let err = match outcome {
            Ok(parts) => return Ok(parts),
            Err(err) => err,
        };

        let decision = match &err {
            LlmError::RateLimited {
                retry_after: Some(delay),
            } if rate_limit_waits < policy.max_rate_limit_waits => {
                rate_limit_waits += 1;
                Decision::RateLimitWait(*delay)
            }
            e if e.is_transient() => {
                failures += 1;
                if failures >= policy.max_attempts {
                    Decision::Fail(AgentError::RetriesExhausted {
                        attempts: failures,
                        source: err.clone(),
                    })
                } else {
                    Decision::Retry(policy.backoff(failures - 1))
                }
            }
            _ => Decision::Fail(AgentError::Provider(err.clone())),
        };

        let delay = match decision {
            Decision::Fail(e) => {
                tracing::error!(agent = %request.agent, error = %e, "model call failed");
                return Err(e);
            }
            Decision::RateLimitWait(delay) => {
                tracing::warn!(
                    agent = %request.agent,
                    delay_ms = delay.as_millis() as u64,
                    wait = rate_limit_waits,
                    "rate limited, waiting for server-suggested delay"
                );
                delay
            }
            Decision::Retry(delay) => {
                tracing::warn!(
                    agent = %request.agent,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient model failure, backing off"
                );
                delay
            }
        };

        if let Some(at) = deadline
            && Instant::now() + delay > at
        {
            tracing::warn!(agent = %request.agent, "retry would pass the deadline");
            return Err(AgentError::DeadlineExceeded);
        }
        tokio::time::sleep(delay).await;
    }
}
