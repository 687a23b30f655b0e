//! Record of files placed by one install run, for rollback.
//!
//! A placed file that replaced an existing one keeps the old copy as a
//! `.starnode-old` backup until the run commits; rollback removes new files
//! and restores backups in reverse order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const BACKUP_SUFFIX: &str = ".starnode-old";
const NEW_SUFFIX: &str = ".starnode-new";

#[derive(Debug)]
struct Placed {
    target: PathBuf,
    backup: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct InstallLedger {
    placed: Vec<Placed>,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

impl InstallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically move `staged` onto `target` (same filesystem), backing up any existing file.
    pub fn place(&mut self, staged: &Path, target: &Path) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let backup = if target.exists() {
            let b = with_suffix(target, BACKUP_SUFFIX);
            fs::rename(target, &b)?;
            Some(b)
        } else {
            None
        };
        if let Err(e) = fs::rename(staged, target) {
            if let Some(b) = &backup {
                let _ = fs::rename(b, target);
            }
            return Err(e);
        }
        tracing::debug!(path = %target.display(), replaced = backup.is_some(), "placed");
        self.placed.push(Placed {
            target: target.to_path_buf(),
            backup,
        });
        Ok(())
    }

    /// Write `contents` next to `target` and place it.
    pub fn write_file(&mut self, target: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let staged = with_suffix(target, NEW_SUFFIX);
        fs::write(&staged, contents)?;
        self.place(&staged, target).map_err(|e| {
            let _ = fs::remove_file(&staged);
            e
        })
    }

    pub fn placed(&self) -> impl Iterator<Item = &Path> {
        self.placed.iter().map(|p| p.target.as_path())
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Undo every placement, newest first. Returns how many were undone.
    pub fn rollback(self) -> usize {
        let mut undone = 0;
        for p in self.placed.into_iter().rev() {
            if let Err(e) = fs::remove_file(&p.target) {
                tracing::warn!(path = %p.target.display(), error = %e, "rollback: remove failed");
            }
            if let Some(b) = &p.backup {
                if let Err(e) = fs::rename(b, &p.target) {
                    tracing::warn!(path = %p.target.display(), error = %e, "rollback: restore failed");
                    continue;
                }
            }
            undone += 1;
        }
        undone
    }

    /// Keep every placement and drop the backups.
    pub fn commit(self) {
        for p in self.placed {
            if let Some(b) = p.backup {
                if let Err(e) = fs::remove_file(&b) {
                    tracing::debug!(path = %b.display(), error = %e, "stale backup left behind");
                }
            }
        }
    }
}
