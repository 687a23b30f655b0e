//! `starnode verify <file> --manifest <path>`.

use anyhow::{Context, Result};
use starnode_core::checksum::{self, ChecksumManifest};
use std::fs;
use std::path::Path;

pub fn run_verify(file: &Path, manifest_path: &Path, name: Option<&str>) -> Result<()> {
    let text = fs::read_to_string(manifest_path)
        .with_context(|| format!("read manifest {}", manifest_path.display()))?;
    let manifest = ChecksumManifest::parse(&text)
        .with_context(|| format!("parse manifest {}", manifest_path.display()))?;
    let name = match name {
        Some(n) => n.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name; pass --name", file.display()))?,
    };
    checksum::verify(file, &name, &manifest)?;
    println!("{}: OK", name);
    Ok(())
}
