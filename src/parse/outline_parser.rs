use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::action::Action;
use crate::model::config::Config;
use crate::model::outline::Todo;
use crate::model::project::Project;
use crate::parse::line::{LineKind, classify};
use crate::query::dates::DateResolver;
use crate::query::matcher;
use crate::query::pattern::Pattern;
use crate::query::term::Query;

/// Filters applied while scanning. Inclusion order is fixed: done state,
/// primary tag, query, project path.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Include actions carrying the done tag.
    pub include_done: bool,
    /// Only include actions carrying the configured primary tag.
    pub require_primary_tag: bool,
    /// Query filter over text/tags.
    pub query: Query,
    /// Also match query terms against action notes.
    pub search_notes: bool,
    /// Only include actions whose ancestor path matches.
    pub project: Option<Pattern>,
}

/// Parse outline files into an addressable model, filtering actions as we
/// go. Projects are always recorded unfiltered — the mutation engine needs
/// the full hierarchy regardless of what the query keeps.
pub fn parse_files(
    paths: &[PathBuf],
    opts: &ParseOptions,
    cfg: &Config,
    resolver: &dyn DateResolver,
) -> io::Result<Todo> {
    let mut todo = Todo::default();
    for path in paths {
        let text = fs::read_to_string(path)?;
        parse_text(path, &text, opts, cfg, resolver, &mut todo);
        todo.files.push(path.clone());
    }
    Ok(todo)
}

/// Parse one file's text into `todo`. Never fails: malformed structure
/// degrades (orphan actions get an empty ancestor path, over-deep dedents
/// truncate to the deepest matching prefix).
pub fn parse_text(
    file: &Path,
    text: &str,
    opts: &ParseOptions,
    cfg: &Config,
    resolver: &dyn DateResolver,
    todo: &mut Todo,
) {
    let base = todo.projects.len();
    let mut parent: Vec<String> = Vec::new();
    // Indices (into todo.projects) of the projects whose subtree is still
    // open, one per stack depth. Every scanned line extends their last_line.
    let mut open: Vec<usize> = Vec::new();
    let mut indent_level = 0usize;
    let mut pending: Option<Action> = None;

    for (idx, raw) in text.lines().enumerate() {
        match classify(raw) {
            LineKind::Project { name, indent } => {
                flush(&mut pending, &mut todo.actions, opts, cfg, resolver);
                if indent == 0 {
                    parent = vec![name];
                } else if indent <= indent_level {
                    parent.truncate(indent.min(parent.len()));
                    parent.push(name);
                } else {
                    parent.push(name);
                }
                indent_level = indent;

                open.truncate(indent.min(open.len()));
                for &i in &open {
                    todo.projects[i].last_line = idx;
                }
                todo.projects
                    .push(Project::new(file.to_path_buf(), parent.clone(), idx));
                open.push(todo.projects.len() - 1);
            }
            LineKind::Action { text } => {
                flush(&mut pending, &mut todo.actions, opts, cfg, resolver);
                for &i in &open {
                    todo.projects[i].last_line = idx;
                }
                pending = Some(Action::new(file.to_path_buf(), parent.clone(), text, idx));
            }
            LineKind::Blank => {
                // Ends note accumulation but not the project subtree
                flush(&mut pending, &mut todo.actions, opts, cfg, resolver);
            }
            LineKind::Other => {
                if let Some(action) = pending.as_mut() {
                    action.note.push(raw.trim().to_string());
                    for &i in &open {
                        todo.projects[i].last_line = idx;
                    }
                }
            }
        }
    }
    flush(&mut pending, &mut todo.actions, opts, cfg, resolver);

    debug_assert!(
        todo.projects[base..]
            .iter()
            .all(|p| p.indent == p.path.len().saturating_sub(1))
    );
}

/// Finalize a pending action: apply the fixed-order inclusion filters and
/// keep it if it survives. Runs once the action's note is fully accumulated
/// so note-aware queries see the whole thing.
fn flush(
    pending: &mut Option<Action>,
    actions: &mut Vec<Action>,
    opts: &ParseOptions,
    cfg: &Config,
    resolver: &dyn DateResolver,
) {
    let Some(action) = pending.take() else {
        return;
    };
    if !opts.include_done && action.is_done(&cfg.done_tag) {
        return;
    }
    if opts.require_primary_tag && !action.has_tag(&cfg.primary_tag) {
        return;
    }
    if !matcher::matches(&action, &opts.query, opts.search_notes, resolver) {
        return;
    }
    if let Some(filter) = &opts.project
        && !filter.is_match(&action.parent.join(":"))
    {
        return;
    }
    actions.push(action);
}
