//! Checksum command: compute SHA-256 of a file.

use anyhow::{Context, Result};
use starnode_core::checksum;
use std::path::Path;

/// Print `<sha256>  <path>`, the line format manifests use.
pub fn run_checksum(path: &Path) -> Result<()> {
    let digest =
        checksum::sha256_path(path).with_context(|| format!("read {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
