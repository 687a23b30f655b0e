use std::path::{Path, PathBuf};

/// One logical artifact download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Origin URL, appended verbatim to each mirror base.
    pub canonical_url: String,
    pub destination: PathBuf,
    /// Total attempts across all mirrors (≥ 1).
    pub max_attempts: u32,
}

impl FetchRequest {
    pub fn new(canonical_url: impl Into<String>, destination: impl Into<PathBuf>, max_attempts: u32) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            destination: destination.into(),
            max_attempts,
        }
    }
}

/// A completely transferred file at the request's destination.
/// Only an `Ok(LocalFile)` is authoritative; file existence alone is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// Attempt number (1-based) that succeeded.
    pub attempts: u32,
    /// Mirror that served the file.
    pub mirror: String,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
