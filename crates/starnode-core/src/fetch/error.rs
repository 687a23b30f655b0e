//! Fetch error taxonomy.

use crate::checksum::ManifestParseError;
use crate::retry::{AttemptError, ErrorKind};
use std::fmt;
use std::path::PathBuf;

/// Bad precondition detected before any network call. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("mirror list is empty")]
    NoMirrors,
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One failed attempt, kept so callers can see every mirror that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// 1-based attempt number.
    pub attempt: u32,
    pub mirror: String,
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {} via {}: {}", self.attempt, self.mirror, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("all {attempts} attempts failed; last error: {last_error}")]
    AllAttemptsFailed {
        attempts: u32,
        #[source]
        last_error: AttemptError,
        failures: Vec<AttemptFailure>,
    },
    #[error("cannot write download to {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    ManifestParse(#[from] ManifestParseError),
}

impl FetchError {
    /// Per-attempt failure log, empty unless every attempt was used up.
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            FetchError::AllAttemptsFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}
