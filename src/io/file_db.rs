use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::query::pattern::Pattern;

/// The known-files database: a flat text file of absolute outline paths,
/// deduplicated and sorted. Lets fuzzy path queries resolve without a
/// filesystem walk.
#[derive(Debug, Clone)]
pub struct FileDb {
    path: PathBuf,
}

impl FileDb {
    pub fn new(path: PathBuf) -> Self {
        FileDb { path }
    }

    /// All known paths, sorted.
    pub fn all(&self) -> Vec<PathBuf> {
        match fs::read_to_string(&self.path) {
            Ok(text) => text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Record paths as seen. Relative paths are absolutized; duplicates
    /// collapse.
    pub fn record(&self, paths: &[PathBuf]) -> std::io::Result<()> {
        let mut set: BTreeSet<PathBuf> = self.all().into_iter().collect();
        for path in paths {
            match fs::canonicalize(path) {
                Ok(abs) => {
                    set.insert(abs);
                }
                Err(_) => continue, // vanished between parse and record
            }
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for path in &set {
            content.push_str(&path.to_string_lossy());
            content.push('\n');
        }
        crate::io::outline_io::atomic_write(&self.path, content.as_bytes())
    }

    /// Known paths matching a fuzzy token (substring or `*`/`?` wildcard).
    pub fn resolve(&self, token: &str) -> Vec<PathBuf> {
        let pattern = Pattern::from_token(token);
        self.all()
            .into_iter()
            .filter(|p| pattern.is_match(&p.to_string_lossy()))
            .collect()
    }
}
