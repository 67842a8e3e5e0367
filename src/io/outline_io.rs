use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::backup::{BackupError, BackupLedger};
use crate::io::lock::{FileLock, LockError};

/// Error type for outline file I/O
#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Backup(#[from] BackupError),
}

/// Read an outline file into a line array plus whether it ended with a
/// newline, so a rewrite can reproduce the original byte for byte.
pub fn read_outline(path: &Path) -> Result<(Vec<String>, bool), OutlineError> {
    let text = fs::read_to_string(path).map_err(|e| OutlineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let trailing_newline = text.is_empty() || text.ends_with('\n');
    Ok((text.lines().map(|l| l.to_string()).collect(), trailing_newline))
}

/// Read an outline file into a line array.
pub fn read_lines(path: &Path) -> Result<Vec<String>, OutlineError> {
    Ok(read_outline(path)?.0)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Overwrite an outline file: lock, snapshot the current content into the
/// backup store, then rename a fully-written temp file over the original.
/// The lock is released on every exit path (Drop).
pub fn write_outline(
    path: &Path,
    lines: &[String],
    trailing_newline: bool,
    ledger: &BackupLedger,
) -> Result<(), OutlineError> {
    let _lock = FileLock::acquire_default(path)?;
    if path.exists() {
        ledger.snapshot(path)?;
    }
    let mut content = lines.join("\n");
    if trailing_newline && !content.is_empty() {
        content.push('\n');
    }
    atomic_write(path, content.as_bytes()).map_err(|e| OutlineError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
