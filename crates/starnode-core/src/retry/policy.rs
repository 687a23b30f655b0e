use std::time::Duration;

/// High-level classification of an attempt error for retry purposes.
///
/// Every network-side kind is retried; only local storage failures stop the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/total/low-speed).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP 5xx other than 503.
    Http5xx(u16),
    /// Any other non-2xx status (404 on a mirror that lacks the release, ...).
    HttpStatus(u16),
    /// Local write to the staged file failed.
    Storage,
    /// Any other curl error.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Delay strategy between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Constant delay between attempts.
    Fixed(Duration),
    /// base * 2^(attempt-1), capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed(Duration::from_secs(2))
    }
}

impl Backoff {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base, max } => {
                let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(exp).min(max)
            }
        }
    }
}

/// Bounded attempt budget plus backoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after attempt `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Storage => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Throttled
            | ErrorKind::Connection
            | ErrorKind::Http5xx(_)
            | ErrorKind::HttpStatus(_)
            | ErrorKind::Other => RetryDecision::RetryAfter(self.backoff.delay(attempt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retry_for_storage() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Storage), RetryDecision::NoRetry);
    }

    #[test]
    fn not_found_is_retried_on_next_mirror() {
        let p = RetryPolicy::default();
        assert!(matches!(
            p.decide(1, ErrorKind::HttpStatus(404)),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn default_is_fixed_two_seconds() {
        let p = RetryPolicy::default();
        for attempt in 1..p.max_attempts {
            assert_eq!(
                p.decide(attempt, ErrorKind::Connection),
                RetryDecision::RetryAfter(Duration::from_secs(2))
            );
        }
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let b = Backoff::Exponential {
            base: Duration::from_millis(250),
            max: Duration::from_secs(30),
        };
        assert_eq!(b.delay(1), Duration::from_millis(250));
        assert_eq!(b.delay(2), Duration::from_millis(500));
        assert_eq!(b.delay(3), Duration::from_secs(1));
        assert_eq!(b.delay(20), Duration::from_secs(30));
    }

    #[test]
    fn exponential_backoff_reaches_a_large_cap() {
        let b = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
        };
        assert_eq!(b.delay(10), Duration::from_millis(51_200));
        assert_eq!(b.delay(11), Duration::from_secs(60));
        assert_eq!(b.delay(64), Duration::from_secs(60));
        assert_eq!(b.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            backoff: Backoff::None,
        };
        assert_eq!(
            p.decide(1, ErrorKind::Throttled),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
        assert_eq!(
            p.decide(2, ErrorKind::Throttled),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
        assert_eq!(p.decide(3, ErrorKind::Throttled), RetryDecision::NoRetry);
    }
}
