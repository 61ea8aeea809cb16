//! Bounded retry with timeout and exponential backoff around reasoning
//! calls.
//!
//! Distinct from the fact-checking revision loop: this layer only absorbs
//! transient transport failures. Contract violations (malformed responses)
//! surface immediately so the caller can fall back.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ReasoningError;

/// Bounded retry policy applied to each external reasoning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Base backoff in milliseconds, doubled per retry.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 30_000,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff before retry number `retry` (1-based): base * 2^(retry-1).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Run `call` under the policy: per-attempt timeout, transient failures
/// retried with backoff, non-transient failures returned immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    stage: &str,
    mut call: F,
) -> Result<T, ReasoningError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReasoningError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err = ReasoningError::Unavailable("no attempt made".to_string());

    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(policy.timeout(), call()).await {
            Ok(result) => result,
            Err(_) => Err(ReasoningError::Timeout(policy.timeout_ms)),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(
                    event = "reasoning.retry",
                    stage = stage,
                    attempt = attempt,
                    error = %err,
                );
                tokio::time::sleep(policy.backoff(attempt)).await;
                last_err = err;
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err)
}
