use indexmap::IndexMap;
use serde::Serialize;

use crate::model::action::Action;
use crate::model::outline::Todo;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

/// One action on the plugin-protocol surface. Text goes out brace-escaped
/// via `display_text` so downstream templating stays safe.
#[derive(Serialize)]
pub struct ActionJson {
    pub file: String,
    pub project: String,
    pub text: String,
    pub line: usize,
    pub tags: IndexMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<String>,
}

pub fn action_to_json(action: &Action) -> ActionJson {
    ActionJson {
        file: action.file.display().to_string(),
        project: action.parent.join(":"),
        text: action.display_text(),
        line: action.line,
        tags: action.tags.clone(),
        note: action.note.clone(),
    }
}

pub fn actions_to_json(actions: &[Action]) -> Vec<ActionJson> {
    actions.iter().map(action_to_json).collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single action as a one-line summary with its project path.
pub fn format_action_line(action: &Action) -> String {
    if action.parent.is_empty() {
        format!("- {}", action.text)
    } else {
        format!("- {} ({})", action.text, action.parent.join(":"))
    }
}

/// Format a listing grouped by file (when several) and project path.
pub fn format_listing(todo: &Todo) -> Vec<String> {
    let mut lines = Vec::new();
    let multi = todo.files.len() > 1;

    for file in &todo.files {
        let actions: Vec<&Action> = todo.actions.iter().filter(|a| &a.file == file).collect();
        if actions.is_empty() {
            continue;
        }
        if multi {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("== {} ==", file.display()));
        }

        let mut current: Option<&[String]> = None;
        for action in actions {
            if current != Some(action.parent.as_slice()) {
                current = Some(action.parent.as_slice());
                if action.parent.is_empty() {
                    lines.push("(no project)".to_string());
                } else {
                    lines.push(format!("{}:", action.parent.join(":")));
                }
            }
            lines.push(format!("  - {}", action.text));
            for note in &action.note {
                lines.push(format!("      {}", note));
            }
        }
    }

    lines
}
