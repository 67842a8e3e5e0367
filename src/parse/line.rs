/// Classification of a single outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `<indent><Name>:`
    Project { name: String, indent: usize },
    /// `<indent>- <text>`
    Action { text: String },
    Blank,
    /// Anything else — a note candidate while inside an action.
    Other,
}

/// Classify one line of outline text.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(text) = trimmed.strip_prefix("- ") {
        return LineKind::Action {
            text: text.to_string(),
        };
    }
    if let Some(name) = trimmed.strip_suffix(':') {
        let name = name.trim_end();
        if !name.is_empty() {
            return LineKind::Project {
                name: name.to_string(),
                indent: indent_depth(line),
            };
        }
    }
    LineKind::Other
}

/// Leading indent in tab-equivalents. Each tab counts one level; a run of
/// two or more spaces folds to one tab, so space-indented files still get a
/// sensible hierarchy. A single stray space contributes nothing.
pub fn indent_depth(line: &str) -> usize {
    let mut depth = 0;
    let mut space_run = 0;
    for ch in line.chars() {
        match ch {
            '\t' => {
                if space_run >= 2 {
                    depth += 1;
                }
                space_run = 0;
                depth += 1;
            }
            ' ' => space_run += 1,
            _ => break,
        }
    }
    if space_run >= 2 {
        depth += 1;
    }
    depth
}
