//! Staged download files.
//!
//! Every attempt writes into `<destination>.part`; only a complete transfer is
//! synced and atomically renamed onto the destination, so a file at the final
//! path is never a partial download.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `app.tar.gz` → `app.tar.gz.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for one download attempt.
pub struct StagedFile {
    file: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl StagedFile {
    /// Create (or truncate) the `.part` file next to `final_path`, creating parent dirs.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(StagedFile {
            file: BufWriter::new(file),
            temp_path,
            written: 0,
        })
    }

    /// Append a chunk of the response body.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, fsync and atomically rename the temp file onto `final_path`.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let StagedFile { file, temp_path, .. } = self;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, final_path)
    }

    /// Drop the temp file after a failed attempt.
    pub fn discard(self) -> io::Result<()> {
        let StagedFile { file, temp_path, .. } = self;
        drop(file);
        match fs::remove_file(&temp_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
