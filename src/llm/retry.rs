//! Bounded retry with exponential backoff for provider calls.
//!
//! Only overload-class errors (HTTP 429 and server 5xx) are retried; every
//! other error class returns immediately. Delays double between attempts:
//! base, 2×base, 4×base, ...

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::error::LlmError;

/// Run `call` up to `config.max_attempts` times.
///
/// Returns the first success, the first non-retryable error, or the last
/// retryable error once attempts are exhausted.
pub async fn call_with_retry<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.base_delay;

    for attempt in 1..=max_attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Provider overloaded, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the final attempt")
}

/// Delay before the nth retry (1-based), for observability and tests.
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base * 2u32.saturating_pow(retry.saturating_sub(1))
}
