//! SHA-256 digests, checksum manifests and artifact verification.
//!
//! Digests are computed after the transfer completes, never inline with the
//! download path. A missing or mismatching digest is always fatal: nothing is
//! installed unless its checksum is confirmed.

mod manifest;

pub use manifest::{parse_line, ChecksumManifest, ManifestParseError};

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> io::Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("no checksum published for `{filename}`; refusing to install unverified file")]
    ChecksumNotFound { filename: String },
    #[error("checksum mismatch for `{filename}`: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check `local_file` against the manifest entry for `expected_filename`.
/// Lookup is by exact filename; no side effects beyond reading the file.
pub fn verify(
    local_file: &Path,
    expected_filename: &str,
    manifest: &ChecksumManifest,
) -> Result<(), VerificationError> {
    let expected = manifest.digest_for(expected_filename).ok_or_else(|| {
        VerificationError::ChecksumNotFound {
            filename: expected_filename.to_string(),
        }
    })?;
    let actual = sha256_path(local_file).map_err(|source| VerificationError::Io {
        path: local_file.to_path_buf(),
        source,
    })?;
    if actual != expected {
        return Err(VerificationError::ChecksumMismatch {
            filename: expected_filename.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    tracing::debug!(file = %local_file.display(), sha256 = %actual, "checksum verified");
    Ok(())
}
