//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::AttemptError;
use super::policy::{RetryDecision, RetryPolicy};
use std::time::Duration;

/// Runs `f(attempt)` (attempt is 1-based) until it succeeds or the retry policy
/// says to stop. On retryable failure, calls `sleep` with the backoff duration
/// then tries again. Returns the last error when the policy gives up.
pub fn run_with_retry<T, F, S>(policy: &RetryPolicy, sleep: S, mut f: F) -> Result<T, AttemptError>
where
    F: FnMut(u32) -> Result<T, AttemptError>,
    S: Fn(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        if !d.is_zero() {
                            tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "backing off");
                        }
                        sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
