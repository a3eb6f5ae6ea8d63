use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

/// Fixed-backoff retry policy used for startup dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts; `0` retries forever.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn allows(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt < self.max_attempts
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    #[error("{what} failed after {attempts} attempts: {last}")]
    Exhausted { what: String, attempts: u32, last: E },
}

impl<E: Display> RetryError<E> {
    pub fn into_last(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// Run `op` until it succeeds or the policy is exhausted, sleeping a fixed
/// delay between attempts.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(what, attempt, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) => {
                if !policy.allows(attempt) {
                    return Err(RetryError::Exhausted {
                        what: what.to_string(),
                        attempts: attempt,
                        last: e,
                    });
                }

                warn!(
                    what,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
