//! Resilient fetch: mirror rotation with a bounded attempt budget.
//!
//! Attempt `i` (1-based) goes to `mirrors[(i-1) mod len]`; the first success
//! wins. Every attempt streams into `<destination>.part`, which is renamed
//! into place only when the transfer completes.

mod error;
mod request;

pub use error::{AttemptFailure, ConfigurationError, FetchError};
pub use request::{FetchRequest, LocalFile};

use crate::checksum::ChecksumManifest;
use crate::mirror::MirrorList;
use crate::retry::{self, AttemptError, RetryPolicy};
use crate::storage::StagedFile;
use crate::transport::{CurlTransport, Transport};
use std::path::Path;
use std::time::Duration;

/// File name used for manifests inside their scratch directory.
const MANIFEST_FILE: &str = "sha256sums.txt";

type Sleeper = Box<dyn Fn(Duration)>;

/// Downloads artifacts through a mirror list.
pub struct ResilientFetcher<T: Transport = CurlTransport> {
    transport: T,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl<T: Transport> ResilientFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the blocking sleep used between attempts (tests pass a recorder).
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request using this fetcher's default attempt budget.
    pub fn request(&self, canonical_url: &str, destination: &Path) -> FetchRequest {
        FetchRequest::new(canonical_url, destination, self.policy.max_attempts)
    }

    /// Fetch `request.canonical_url` through `mirrors` into `request.destination`.
    pub fn fetch(&self, request: &FetchRequest, mirrors: &MirrorList) -> Result<LocalFile, FetchError> {
        if request.max_attempts == 0 {
            return Err(ConfigurationError::ZeroAttempts.into());
        }
        let urls = mirrors.effective_urls(&request.canonical_url)?;
        let policy = RetryPolicy {
            max_attempts: request.max_attempts,
            backoff: self.policy.backoff,
        };

        let mut failures: Vec<AttemptFailure> = Vec::new();
        let outcome = retry::run_with_retry(&policy, &self.sleep, |attempt| {
            let index = mirrors.index_for_attempt(attempt);
            let mirror = mirrors.get(index).unwrap_or_default();
            let url = &urls[index];
            tracing::debug!(attempt, max = request.max_attempts, %mirror, %url, "fetch attempt");
            match self.attempt(url, &request.destination) {
                Ok(bytes) => Ok(LocalFile {
                    path: request.destination.clone(),
                    bytes,
                    attempts: attempt,
                    mirror: mirror.to_string(),
                }),
                Err(e) => {
                    tracing::warn!(attempt, %mirror, error = %e, "fetch attempt failed");
                    failures.push(AttemptFailure {
                        attempt,
                        mirror: mirror.to_string(),
                        url: url.clone(),
                        kind: retry::classify(&e),
                        message: e.to_string(),
                    });
                    Err(e)
                }
            }
        });

        match outcome {
            Ok(local) => {
                tracing::info!(
                    path = %local.path.display(),
                    bytes = local.bytes,
                    attempts = local.attempts,
                    mirror = %local.mirror,
                    "downloaded"
                );
                Ok(local)
            }
            Err(AttemptError::Storage(source)) => Err(FetchError::Storage {
                path: request.destination.clone(),
                source,
            }),
            Err(last_error) => Err(FetchError::AllAttemptsFailed {
                attempts: failures.len() as u32,
                last_error,
                failures,
            }),
        }
    }

    /// Fetch and parse a checksum manifest with the same mirror/retry policy.
    /// The manifest lives in a scratch directory removed before returning.
    pub fn fetch_checksum_manifest(
        &self,
        manifest_url: &str,
        mirrors: &MirrorList,
    ) -> Result<ChecksumManifest, FetchError> {
        let scratch = tempfile::Builder::new()
            .prefix("starnode-manifest")
            .tempdir()
            .map_err(|source| FetchError::Storage {
                path: std::env::temp_dir(),
                source,
            })?;
        let dest = scratch.path().join(MANIFEST_FILE);
        let local = self.fetch(&self.request(manifest_url, &dest), mirrors)?;
        let text = std::fs::read_to_string(local.path()).map_err(|source| FetchError::Storage {
            path: dest.clone(),
            source,
        })?;
        let manifest = ChecksumManifest::parse(&text)?;
        tracing::debug!(url = manifest_url, entries = manifest.len(), "parsed checksum manifest");
        Ok(manifest)
    }

    /// One attempt: stage, transfer, and either rename into place or discard.
    fn attempt(&self, url: &str, destination: &Path) -> Result<u64, AttemptError> {
        let mut staged = StagedFile::create(destination).map_err(AttemptError::Storage)?;
        match self.transport.download(url, &mut staged) {
            Ok(bytes) => {
                staged.finalize(destination).map_err(AttemptError::Storage)?;
                Ok(bytes)
            }
            Err(e) => {
                if let Err(de) = staged.discard() {
                    tracing::debug!(error = %de, "failed to remove partial download");
                }
                Err(e)
            }
        }
    }
}

impl ResilientFetcher<CurlTransport> {
    /// Curl-backed fetcher with the given limits and default fixed backoff.
    pub fn with_curl(opts: crate::transport::CurlOptions, policy: RetryPolicy) -> Self {
        Self::new(CurlTransport::new(opts), policy)
    }
}

impl Default for ResilientFetcher<CurlTransport> {
    fn default() -> Self {
        Self::new(CurlTransport::default(), RetryPolicy::default())
    }
}
