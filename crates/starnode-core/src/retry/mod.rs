//! Retry and backoff policy.
//!
//! Error classification (timeouts, throttling, connection failures, HTTP
//! status) and backoff decisions shared by every fetch, so the attempt loop
//! in `fetch` stays a plain bounded loop.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::AttemptError;
pub use policy::{Backoff, ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
