use std::path::Path;

use crate::model::action::Action;
use crate::model::outline::Todo;

/// Rebuild a project header line.
pub fn project_header(name: &str, indent: usize) -> String {
    format!("{}{}:", "\t".repeat(indent), name)
}

/// Rebuild an action's line plus its note lines. `indent` is the action
/// line's depth; note lines sit one level deeper.
pub fn action_lines(action: &Action, indent: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(1 + action.note.len());
    lines.push(format!("{}- {}", "\t".repeat(indent), action.text));
    for note in &action.note {
        lines.push(format!("{}{}", "\t".repeat(indent + 1), note));
    }
    lines
}

/// Reassemble one file's lines from an unmodified parse. Used by the
/// round-trip property: for a canonical tab-indented file this reproduces
/// the input byte for byte.
pub fn serialize(todo: &Todo, file: &Path, total_lines: usize) -> Vec<String> {
    let mut lines = vec![String::new(); total_lines];
    for project in todo.projects.iter().filter(|p| p.file == file) {
        lines[project.line] = project_header(project.name(), project.indent);
    }
    for action in todo.actions.iter().filter(|a| a.file == file) {
        let depth = action.parent.len();
        for (offset, line) in action_lines(action, depth).into_iter().enumerate() {
            lines[action.line + offset] = line;
        }
    }
    lines
}
