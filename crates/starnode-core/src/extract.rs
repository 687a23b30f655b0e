//! `.tar.gz` extraction of release binaries.
//!
//! Only regular files whose base name is one of the requested binaries are
//! taken; the archive's top-level directory (`prometheus-2.53.0.linux-amd64/`)
//! and everything else is ignored. Files are unpacked into a staging
//! directory; placing them is the install ledger's job.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read archive {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive {} does not contain {}", archive.display(), missing.join(", "))]
    MissingBinaries { archive: PathBuf, missing: Vec<String> },
}

/// A binary unpacked into the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBinary {
    pub name: String,
    pub path: PathBuf,
}

/// Unpack `binaries` from `archive` into `staging_dir`, mode 0755.
/// All-or-nothing: if any binary is missing, already unpacked files are removed.
pub fn extract_binaries(
    archive: &Path,
    binaries: &[String],
    staging_dir: &Path,
) -> Result<Vec<ExtractedBinary>, ExtractError> {
    let io_err = |source: io::Error| ExtractError::Io {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive).map_err(io_err)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    fs::create_dir_all(staging_dir).map_err(io_err)?;

    let mut found: Vec<ExtractedBinary> = Vec::new();
    for entry in tar.entries().map_err(io_err)? {
        let mut entry = entry.map_err(io_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let entry_path = entry.path().map_err(io_err)?.into_owned();
        let name = match entry_path.file_name().and_then(|n| n.to_str()) {
            Some(n) if binaries.iter().any(|b| b == n) => n.to_string(),
            _ => continue,
        };
        if found.iter().any(|b| b.name == name) {
            continue;
        }
        let target = staging_dir.join(&name);
        entry.unpack(&target).map_err(io_err)?;
        set_executable(&target).map_err(io_err)?;
        tracing::debug!(binary = %name, from = %entry_path.display(), "extracted");
        found.push(ExtractedBinary { name, path: target });
    }

    let missing: Vec<String> = binaries
        .iter()
        .filter(|b| !found.iter().any(|f| &f.name == *b))
        .cloned()
        .collect();
    if !missing.is_empty() {
        for f in &found {
            let _ = fs::remove_file(&f.path);
        }
        return Err(ExtractError::MissingBinaries {
            archive: archive.to_path_buf(),
            missing,
        });
    }
    Ok(found)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
