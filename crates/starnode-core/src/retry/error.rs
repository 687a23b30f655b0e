//! Per-attempt download error type for retry classification.

use std::fmt;

/// Error returned by a single download attempt against one mirror.
/// Used so we can classify and decide retries before surfacing a typed fetch error.
#[derive(Debug)]
pub enum AttemptError {
    /// Curl reported an error (timeout, connection, DNS, TLS, etc.).
    Curl(curl::Error),
    /// Final HTTP response (after redirects) had a non-2xx status.
    Http(u32),
    /// Writing the staged `.part` file failed (disk full, permission denied). Not retried.
    Storage(std::io::Error),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Curl(e) => write!(f, "{}", e),
            AttemptError::Http(code) => write!(f, "HTTP {}", code),
            AttemptError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Curl(e) => Some(e),
            AttemptError::Storage(e) => Some(e),
            AttemptError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for AttemptError {
    fn from(e: curl::Error) -> Self {
        AttemptError::Curl(e)
    }
}
