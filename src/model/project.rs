use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A named node in the outline hierarchy.
///
/// `line` is the header's 0-based index in its file; `last_line` is the index
/// of the last line belonging to this project's subtree, inclusive. Both are
/// shifted by the mutation engine after any structural edit so they never go
/// stale within one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Owning outline file.
    pub file: PathBuf,
    /// Ancestor names, root first, ending with this project's own name.
    pub path: Vec<String>,
    /// Nesting depth (0 = top-level). Always `path.len() - 1`.
    pub indent: usize,
    /// Header line index.
    pub line: usize,
    /// Last line of the subtree, inclusive.
    pub last_line: usize,
}

impl Project {
    pub fn new(file: PathBuf, path: Vec<String>, line: usize) -> Self {
        let indent = path.len().saturating_sub(1);
        Project {
            file,
            path,
            indent,
            line,
            last_line: line,
        }
    }

    /// This project's own name (last path segment).
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// The `:`-joined path string, e.g. `Work:Backlog`.
    pub fn path_str(&self) -> String {
        self.path.join(":")
    }

    /// Case-insensitive match against a `:`-joined path.
    pub fn matches_path(&self, path: &str) -> bool {
        self.path_str().eq_ignore_ascii_case(path)
    }
}
