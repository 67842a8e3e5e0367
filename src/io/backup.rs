use std::fs;
use std::path::{Path, PathBuf};

use crate::query::pattern::Pattern;

/// Error type for backup/restore operations
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("could not snapshot {path}: {source}")]
    SnapshotError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not restore {path}: {source}")]
    RestoreError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("nothing to restore")]
    NothingToRestore,
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The backup store: a directory mirroring absolute source paths (one file
/// per source = its most recent backup) plus an ordered ledger listing
/// tracked paths, most-recently-snapshotted last.
#[derive(Debug, Clone)]
pub struct BackupLedger {
    root: PathBuf,
}

impl BackupLedger {
    pub fn new(root: PathBuf) -> Self {
        BackupLedger { root }
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger")
    }

    /// Mirror an absolute source path under the store root.
    fn backup_path(&self, abs: &Path) -> PathBuf {
        let rel = abs.components().skip(1).collect::<PathBuf>();
        self.root.join("files").join(rel)
    }

    /// Copy the file's current content into the store and move its entry to
    /// the end of the ledger. One backup per source: a new snapshot
    /// overwrites the prior one.
    pub fn snapshot(&self, path: &Path) -> Result<(), BackupError> {
        let abs = fs::canonicalize(path).map_err(|e| BackupError::SnapshotError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let dest = self.backup_path(&abs);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&abs, &dest).map_err(|e| BackupError::SnapshotError {
            path: abs.clone(),
            source: e,
        })?;

        let mut entries = self.entries();
        entries.retain(|e| e != &abs);
        entries.push(abs);
        self.write_ledger(&entries)
    }

    /// Restore the most recent backup, optionally filtered by a pattern
    /// against the source path. The backup moves over the live file; stale
    /// ledger entries (backup gone) are pruned along the way.
    pub fn restore(&self, pattern: Option<&Pattern>) -> Result<PathBuf, BackupError> {
        let entries = self.entries();
        let mut keep = entries.clone();
        let mut restored = None;

        for entry in entries.iter().rev() {
            let backup = self.backup_path(entry);
            if !backup.exists() {
                keep.retain(|e| e != entry);
                continue;
            }
            let entry_str = entry.to_string_lossy();
            if let Some(p) = pattern
                && !p.is_match(&entry_str)
            {
                continue;
            }
            fs::copy(&backup, entry).map_err(|e| BackupError::RestoreError {
                path: entry.clone(),
                source: e,
            })?;
            fs::remove_file(&backup)?;
            keep.retain(|e| e != entry);
            restored = Some(entry.clone());
            break;
        }

        self.write_ledger(&keep)?;
        restored.ok_or(BackupError::NothingToRestore)
    }

    /// Tracked paths, oldest first.
    pub fn entries(&self) -> Vec<PathBuf> {
        match fs::read_to_string(self.ledger_path()) {
            Ok(text) => text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn write_ledger(&self, entries: &[PathBuf]) -> Result<(), BackupError> {
        fs::create_dir_all(&self.root)?;
        let mut content = String::new();
        for entry in entries {
            content.push_str(&entry.to_string_lossy());
            content.push('\n');
        }
        crate::io::outline_io::atomic_write(&self.ledger_path(), content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupLedger, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let ledger = BackupLedger::new(tmp.path().join("store"));
        let file = tmp.path().join("work.todo");
        fs::write(&file, "Inbox:\n\t- original\n").unwrap();
        (tmp, ledger, file)
    }

    #[test]
    fn test_snapshot_and_restore() {
        let (_tmp, ledger, file) = setup();
        ledger.snapshot(&file).unwrap();
        fs::write(&file, "Inbox:\n\t- clobbered\n").unwrap();

        let restored = ledger.restore(None).unwrap();
        assert_eq!(restored, fs::canonicalize(&file).unwrap());
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "Inbox:\n\t- original\n"
        );
        // Backup consumed: nothing left to restore
        assert!(matches!(
            ledger.restore(None),
            Err(BackupError::NothingToRestore)
        ));
    }

    #[test]
    fn test_one_backup_per_source() {
        let (_tmp, ledger, file) = setup();
        ledger.snapshot(&file).unwrap();
        fs::write(&file, "Inbox:\n\t- second\n").unwrap();
        ledger.snapshot(&file).unwrap();
        fs::write(&file, "Inbox:\n\t- third\n").unwrap();

        // Latest snapshot wins
        ledger.restore(None).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "Inbox:\n\t- second\n");
        assert_eq!(ledger.entries().len(), 0);
    }

    #[test]
    fn test_restore_most_recent_last() {
        let (tmp, ledger, file_a) = setup();
        let file_b = tmp.path().join("home.todo");
        fs::write(&file_b, "Home:\n").unwrap();

        ledger.snapshot(&file_a).unwrap();
        ledger.snapshot(&file_b).unwrap();
        fs::write(&file_a, "changed a").unwrap();
        fs::write(&file_b, "changed b").unwrap();

        // b was snapshotted last, so a bare restore picks it
        let restored = ledger.restore(None).unwrap();
        assert!(restored.ends_with("home.todo"));
        assert_eq!(fs::read_to_string(&file_b).unwrap(), "Home:\n");
        assert_eq!(fs::read_to_string(&file_a).unwrap(), "changed a");
    }

    #[test]
    fn test_restore_by_pattern() {
        let (tmp, ledger, file_a) = setup();
        let file_b = tmp.path().join("home.todo");
        fs::write(&file_b, "Home:\n").unwrap();

        ledger.snapshot(&file_a).unwrap();
        ledger.snapshot(&file_b).unwrap();
        fs::write(&file_a, "changed a").unwrap();

        let pat = Pattern::from_token("work");
        let restored = ledger.restore(Some(&pat)).unwrap();
        assert!(restored.ends_with("work.todo"));
        assert_eq!(
            fs::read_to_string(&file_a).unwrap(),
            "Inbox:\n\t- original\n"
        );
    }

    #[test]
    fn test_stale_entries_pruned() {
        let (tmp, ledger, file_a) = setup();
        let file_b = tmp.path().join("home.todo");
        fs::write(&file_b, "Home:\n").unwrap();

        ledger.snapshot(&file_a).unwrap();
        ledger.snapshot(&file_b).unwrap();

        // Remove b's backup out from under the ledger
        let abs_b = fs::canonicalize(&file_b).unwrap();
        fs::remove_file(ledger.backup_path(&abs_b)).unwrap();

        // Restore skips the stale entry, lands on a, and prunes b
        let restored = ledger.restore(None).unwrap();
        assert!(restored.ends_with("work.todo"));
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn test_snapshot_missing_file_fails() {
        let (tmp, ledger, _file) = setup();
        let missing = tmp.path().join("nope.todo");
        assert!(ledger.snapshot(&missing).is_err());
    }
}
