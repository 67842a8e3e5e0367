use std::io;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::io::backup::BackupLedger;
use crate::io::outline_io::{self, OutlineError};
use crate::model::action::Action;
use crate::model::config::Config;
use crate::model::outline::Todo;
use crate::model::project::Project;
use crate::parse::outline_parser::{ParseOptions, parse_text};
use crate::parse::serializer::{action_lines, project_header};
use crate::query::dates::DateResolver;

/// Error type for mutation operations
#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    /// Recoverable: the caller may retry with `create_project` set.
    #[error("no project matching \"{0}\" — create it or cancel")]
    ProjectNotFound(String),
    #[error("no action matched")]
    NoMatch,
    #[error("{0} actions matched; pass the all-matches flag to apply to every one")]
    Ambiguous(usize),
    #[error("editor failed: {0}")]
    EditorError(#[from] io::Error),
    #[error(transparent)]
    Io(#[from] OutlineError),
}

/// Where a (re-)inserted action lands within its destination project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// After the project's last line.
    #[default]
    Append,
    /// Immediately after the project header.
    Prepend,
}

/// The transformations one mutation pass applies to each target.
#[derive(Debug, Clone, Default)]
pub struct TransformSet {
    pub priority: Option<u32>,
    /// Tags to add, stripping any same-name tag first.
    pub add_tags: Vec<(String, Option<String>)>,
    /// Tag name patterns to remove (`*`/`?` capable).
    pub remove_tags: Vec<String>,
    /// Stamp the done tag.
    pub finish: bool,
    /// Remove the action (and its note) entirely.
    pub delete: bool,
    /// Hand the action to the external editor collaborator.
    pub edit: bool,
    /// Destination project path (`:`-joined) for a move.
    pub move_to: Option<String>,
    /// Note lines to merge.
    pub note: Vec<String>,
    /// Replace the existing note instead of appending.
    pub overwrite_note: bool,
    /// Synthesize a missing destination project instead of failing.
    pub create_project: bool,
    /// Plugin-protocol fields: explicit start/done stamps and a duration.
    pub started_at: Option<NaiveDateTime>,
    pub done_at: Option<NaiveDateTime>,
    pub duration_seconds: Option<u64>,
}

/// External editor collaborator: receives the action text and note, returns
/// the edited pair. The subprocess plumbing lives outside the core.
pub trait ActionEditor {
    fn edit(&self, text: &str, note: &[String]) -> io::Result<(String, Vec<String>)>;
}

impl<F> ActionEditor for F
where
    F: Fn(&str, &[String]) -> io::Result<(String, Vec<String>)>,
{
    fn edit(&self, text: &str, note: &[String]) -> io::Result<(String, Vec<String>)> {
        self(text, note)
    }
}

/// The structure-preserving mutation engine. One instance per invocation;
/// all clock and date handling is injected so passes are deterministic.
pub struct Mutator<'a> {
    pub cfg: &'a Config,
    pub resolver: &'a dyn DateResolver,
    pub now: NaiveDateTime,
}

impl Mutator<'_> {
    /// Apply a transform set to already-resolved targets within one file,
    /// splice the file's line array accordingly, and persist through the
    /// backup ledger. Returns the mutated actions with fresh line numbers.
    ///
    /// Targets must be a finalized list (selection UIs live outside the
    /// engine). A file that vanished since resolution fails here, fatally
    /// for this file only.
    pub fn apply(
        &self,
        file: &Path,
        targets: &[Action],
        transforms: &TransformSet,
        placement: Placement,
        editor: Option<&dyn ActionEditor>,
        ledger: &BackupLedger,
    ) -> Result<Vec<Action>, MutateError> {
        if targets.is_empty() {
            return Err(MutateError::NoMatch);
        }
        let (mut lines, trailing_newline) = outline_io::read_outline(file)?;
        let mut projects = projects_of(file, &lines, self.cfg, self.resolver);

        self.resolve_destination(file, &mut lines, &mut projects, transforms)?;

        // Highest line first, so earlier targets' indices stay valid while
        // later lines are spliced.
        let mut order: Vec<Action> = targets.to_vec();
        order.sort_by(|a, b| b.line.cmp(&a.line));

        let mut results = Vec::new();
        let mut idx = 0;
        while idx < order.len() {
            let mut action = order[idx].clone();
            idx += 1;

            let span = 1 + action.note.len();
            let start = action.line;
            if start + span <= lines.len() {
                lines.drain(start..start + span);
                reindex(&mut projects, start, -(span as isize));
            }
            if transforms.delete {
                continue;
            }

            if transforms.edit
                && let Some(editor) = editor
            {
                let (text, note) = editor.edit(&action.text, &action.note)?;
                action.set_text(text);
                action.note = note;
            }

            self.apply_transforms(&mut action, transforms);
            merge_note(&mut action, transforms);

            let (insert_at, added) =
                self.insert_action(&mut lines, &mut projects, &mut action, transforms, placement);
            // A splice below a pending target shifts its lines too; keep the
            // remaining cached indices in step.
            for later in order[idx..].iter_mut() {
                if later.line >= insert_at {
                    later.line += added;
                }
            }
            results.push(action);
        }

        outline_io::write_outline(file, &lines, trailing_newline, ledger)?;
        results.reverse();
        Ok(results)
    }

    /// Insert a brand-new action (the add path): same destination and
    /// splice logic as `apply`, minus the removal step.
    pub fn add(
        &self,
        file: &Path,
        text: &str,
        transforms: &TransformSet,
        placement: Placement,
        ledger: &BackupLedger,
    ) -> Result<Action, MutateError> {
        let (mut lines, trailing_newline) = if file.exists() {
            outline_io::read_outline(file)?
        } else {
            (Vec::new(), true)
        };
        let mut projects = projects_of(file, &lines, self.cfg, self.resolver);

        self.resolve_destination(file, &mut lines, &mut projects, transforms)?;

        let parent = transforms
            .move_to
            .as_deref()
            .map(path_segments)
            .unwrap_or_default();
        let mut action = Action::new(file.to_path_buf(), parent, text.to_string(), 0);
        self.apply_transforms(&mut action, transforms);
        merge_note(&mut action, transforms);

        self.insert_action(&mut lines, &mut projects, &mut action, transforms, placement);

        outline_io::write_outline(file, &lines, trailing_newline, ledger)?;
        Ok(action)
    }

    /// Make sure the move destination exists, synthesizing it when allowed.
    fn resolve_destination(
        &self,
        file: &Path,
        lines: &mut Vec<String>,
        projects: &mut Vec<Project>,
        transforms: &TransformSet,
    ) -> Result<(), MutateError> {
        let Some(dest) = transforms.move_to.as_deref() else {
            return Ok(());
        };
        if find_project(projects, dest).is_none() {
            if transforms.create_project {
                insert_project(lines, projects, file, dest);
            } else {
                return Err(MutateError::ProjectNotFound(dest.to_string()));
            }
        }
        Ok(())
    }

    /// Text transforms, in the fixed order: priority, tag removal, tag
    /// addition, completion stamp, date-tag normalization.
    fn apply_transforms(&self, action: &mut Action, t: &TransformSet) {
        if let Some(p) = t.priority {
            action.set_priority(p);
        }
        for pattern in &t.remove_tags {
            action.remove_tag(pattern);
        }
        for (name, value) in &t.add_tags {
            action.add_tag(name, value.as_deref());
        }
        if let Some(started) = t.started_at {
            action.add_tag("start", Some(&started.format("%Y-%m-%d %H:%M").to_string()));
        }
        if let Some(secs) = t.duration_seconds {
            action.add_tag("duration", Some(&secs.to_string()));
        }
        if t.finish {
            action.finish(&self.cfg.done_tag, t.done_at.unwrap_or(self.now));
        }
        action.normalize_date_tags(self.resolver, &self.cfg.date_tags);
    }

    /// Splice the rebuilt action lines into place and fix every project's
    /// cached indices. Returns the splice position and line count so the
    /// caller can shift its own pending indices.
    fn insert_action(
        &self,
        lines: &mut Vec<String>,
        projects: &mut Vec<Project>,
        action: &mut Action,
        transforms: &TransformSet,
        placement: Placement,
    ) -> (usize, usize) {
        let dest_path = transforms
            .move_to
            .clone()
            .unwrap_or_else(|| action.parent.join(":"));

        let (insert_at, depth, dest_segments) = match find_project(projects, &dest_path) {
            Some(i) => {
                let dest = &projects[i];
                let at = match placement {
                    Placement::Append => (dest.last_line + 1).min(lines.len()),
                    Placement::Prepend => (dest.line + 1).min(lines.len()),
                };
                (at, dest.path.len(), dest.path.clone())
            }
            // Orphan path (no project): keep the action at its old spot,
            // or the end of the file for a new one.
            None => (action.line.min(lines.len()), 0, Vec::new()),
        };

        action.parent = dest_segments.clone();
        action.project = dest_segments.first().cloned().unwrap_or_default();
        action.line = insert_at;

        let rebuilt = action_lines(action, depth);
        let added = rebuilt.len();
        for (offset, line) in rebuilt.into_iter().enumerate() {
            lines.insert(insert_at + offset, line);
        }
        reindex(projects, insert_at, added as isize);
        extend_subtree(projects, &dest_segments, insert_at, insert_at + added - 1);
        (insert_at, added)
    }
}

/// Merge a supplied note into the action: replace or append per the
/// overwrite flag.
fn merge_note(action: &mut Action, t: &TransformSet) {
    if t.note.is_empty() {
        return;
    }
    if t.overwrite_note {
        action.note = t.note.clone();
    } else {
        action.note.extend(t.note.iter().cloned());
    }
}

/// Shift every project's cached indices after a structural edit at `at` by
/// `delta` lines.
pub fn reindex(projects: &mut [Project], at: usize, delta: isize) {
    for p in projects.iter_mut() {
        if p.line >= at {
            p.line = p.line.saturating_add_signed(delta);
        }
        if p.last_line >= at {
            p.last_line = p.last_line.saturating_add_signed(delta);
        }
    }
}

/// Extend the subtree span of the destination project and its ancestors
/// when lines were inserted right past their old end.
fn extend_subtree(projects: &mut [Project], dest: &[String], insert_at: usize, end: usize) {
    if dest.is_empty() {
        return;
    }
    for p in projects.iter_mut() {
        if p.path.len() <= dest.len()
            && p.path == dest[..p.path.len()]
            && p.last_line + 1 >= insert_at
            && p.last_line < end
        {
            p.last_line = end;
        }
    }
}

/// Synthesize the missing tail of a project path: walk to the deepest
/// existing ancestor, then insert header lines one per missing segment.
/// With no ancestor at all, new top-level projects go before the first
/// existing one — except an `Archive`-rooted path, which goes to the end of
/// the file. Returns the index of the deepest created project.
pub fn insert_project(
    lines: &mut Vec<String>,
    projects: &mut Vec<Project>,
    file: &Path,
    path: &str,
) -> usize {
    let segments = path_segments(path);

    let mut depth = 0;
    let mut anchor = None;
    for i in (1..=segments.len()).rev() {
        let prefix = segments[..i].join(":");
        if let Some(idx) = find_project(projects, &prefix) {
            anchor = Some(idx);
            depth = i;
            break;
        }
    }
    if depth == segments.len()
        && let Some(idx) = anchor
    {
        return idx; // whole path already present
    }

    let mut insert_at = match anchor {
        Some(idx) => (projects[idx].last_line + 1).min(lines.len()),
        None if segments.first().is_some_and(|s| s == "Archive") => lines.len(),
        None => projects
            .iter()
            .filter(|p| p.indent == 0)
            .map(|p| p.line)
            .min()
            .unwrap_or(lines.len()),
    };

    // Seed from the anchor's stored segments, not the caller's casing:
    // path lookups are case-insensitive, but subtree extension compares the
    // recorded paths directly.
    let mut built: Vec<String> = match anchor {
        Some(idx) => projects[idx].path.clone(),
        None => Vec::new(),
    };
    let mut last_idx = anchor.unwrap_or(0);
    for segment in &segments[depth..] {
        built.push(segment.clone());
        let indent = built.len() - 1;
        lines.insert(insert_at, project_header(segment, indent));
        reindex(projects, insert_at, 1);
        extend_subtree(projects, &built[..built.len() - 1], insert_at, insert_at);
        projects.push(Project::new(file.to_path_buf(), built.clone(), insert_at));
        last_idx = projects.len() - 1;
        insert_at += 1;
    }
    last_idx
}

fn find_project(projects: &[Project], path: &str) -> Option<usize> {
    projects.iter().position(|p| p.matches_path(path))
}

fn path_segments(path: &str) -> Vec<String> {
    path.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive the project list for a line array. The mutation engine always
/// works against projects computed from the exact lines it splices, so
/// cached state can never drift from the text.
fn projects_of(
    file: &Path,
    lines: &[String],
    cfg: &Config,
    resolver: &dyn DateResolver,
) -> Vec<Project> {
    let mut todo = Todo::default();
    let opts = ParseOptions {
        include_done: true,
        ..Default::default()
    };
    let text = lines.join("\n");
    parse_text(file, &text, &opts, cfg, resolver, &mut todo);
    todo.projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dates::ChronoResolver;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    struct Ctx {
        _tmp: TempDir,
        file: PathBuf,
        ledger: BackupLedger,
        cfg: Config,
        resolver: ChronoResolver,
    }

    impl Ctx {
        fn new(content: &str) -> Ctx {
            let tmp = TempDir::new().unwrap();
            let file = tmp.path().join("work.todo");
            fs::write(&file, content).unwrap();
            let ledger = BackupLedger::new(tmp.path().join("store"));
            Ctx {
                _tmp: tmp,
                file,
                ledger,
                cfg: Config::default(),
                resolver: ChronoResolver::at(fixed_now()),
            }
        }

        fn mutator(&self) -> Mutator<'_> {
            Mutator {
                cfg: &self.cfg,
                resolver: &self.resolver,
                now: fixed_now(),
            }
        }

        fn parse(&self) -> Todo {
            let opts = ParseOptions {
                include_done: true,
                ..Default::default()
            };
            crate::parse::parse_files(&[self.file.clone()], &opts, &self.cfg, &self.resolver)
                .unwrap()
        }

        fn content(&self) -> String {
            fs::read_to_string(&self.file).unwrap()
        }
    }

    #[test]
    fn test_finish_in_place() {
        let ctx = Ctx::new("Inbox:\n\t- Buy milk @home\n");
        let todo = ctx.parse();
        let t = TransformSet {
            finish: true,
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(results[0].text, "Buy milk @home @done(2025-03-10 14:30)");
        assert_eq!(
            ctx.content(),
            "Inbox:\n\t- Buy milk @home @done(2025-03-10 14:30)\n"
        );
    }

    #[test]
    fn test_complete_and_move_to_archive() {
        let ctx = Ctx::new("Inbox:\n\t- Buy milk @home\nArchive:\n");
        let todo = ctx.parse();
        let t = TransformSet {
            finish: true,
            move_to: Some("Archive".to_string()),
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(
            ctx.content(),
            "Inbox:\nArchive:\n\t- Buy milk @home @done(2025-03-10 14:30)\n"
        );
    }

    #[test]
    fn test_delete_removes_action_and_note() {
        let ctx = Ctx::new("A:\n\t- keep\n\t- drop me\n\t\tnote 1\n\t\tnote 2\nB:\n\t- other\n");
        let todo = ctx.parse();
        let target: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| a.text.contains("drop"))
            .cloned()
            .collect();
        let t = TransformSet {
            delete: true,
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &target, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(ctx.content(), "A:\n\t- keep\nB:\n\t- other\n");

        // B's indices shifted by exactly the removed span
        let after = ctx.parse();
        let b = after.projects.iter().find(|p| p.name() == "B").unwrap();
        assert_eq!(b.line, 2);
        assert_eq!(b.last_line, 3);
    }

    #[test]
    fn test_reindex_shifts_only_later_projects() {
        let mut projects = vec![
            Project::new(PathBuf::from("f"), vec!["A".to_string()], 0),
            Project::new(PathBuf::from("f"), vec!["B".to_string()], 5),
            Project::new(PathBuf::from("f"), vec!["C".to_string()], 10),
        ];
        // Action + 2 note lines removed at line 6
        reindex(&mut projects, 6, -3);
        assert_eq!(projects[0].line, 0);
        assert_eq!(projects[1].line, 5);
        assert_eq!(projects[2].line, 7);
    }

    #[test]
    fn test_move_creates_missing_subproject() {
        let ctx = Ctx::new("Work:\n\t- ship the release\nHome:\n\t- mow lawn\n");
        let todo = ctx.parse();
        let target: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| a.text.contains("ship"))
            .cloned()
            .collect();
        let t = TransformSet {
            move_to: Some("Work:Backlog".to_string()),
            create_project: true,
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &target, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(
            ctx.content(),
            "Work:\n\tBacklog:\n\t\t- ship the release\nHome:\n\t- mow lawn\n"
        );
        assert_eq!(results[0].parent, vec!["Work", "Backlog"]);
    }

    #[test]
    fn test_multi_target_move_to_earlier_project() {
        // The destination sits above the targets, so each splice pushes the
        // remaining targets down; their cached lines must follow.
        let ctx = Ctx::new("Archive:\nA:\n\t- one\n\t- two\n");
        let todo = ctx.parse();
        let targets: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| a.project == "A")
            .cloned()
            .collect();
        assert_eq!(targets.len(), 2);
        let t = TransformSet {
            move_to: Some("Archive".to_string()),
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &targets, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(ctx.content(), "Archive:\n\t- two\n\t- one\nA:\n");
    }

    #[test]
    fn test_case_insensitive_destination_path() {
        let ctx = Ctx::new("Work:\n\t- a\n\t- ship it\n");
        let todo = ctx.parse();
        let target: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| a.text.contains("ship"))
            .cloned()
            .collect();
        let t = TransformSet {
            move_to: Some("work:Backlog".to_string()),
            create_project: true,
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &target, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        // The new subproject nests under the existing header's casing
        assert_eq!(
            ctx.content(),
            "Work:\n\t- a\n\tBacklog:\n\t\t- ship it\n"
        );
        assert_eq!(results[0].parent, vec!["Work", "Backlog"]);
    }

    #[test]
    fn test_no_trailing_newline_preserved() {
        let ctx = Ctx::new("Inbox:\n\t- task");
        let todo = ctx.parse();
        let t = TransformSet {
            finish: true,
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(
            ctx.content(),
            "Inbox:\n\t- task @done(2025-03-10 14:30)"
        );
    }

    #[test]
    fn test_move_without_create_is_recoverable() {
        let ctx = Ctx::new("Work:\n\t- task\n");
        let todo = ctx.parse();
        let t = TransformSet {
            move_to: Some("Nowhere".to_string()),
            ..Default::default()
        };
        let err = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap_err();
        assert!(matches!(err, MutateError::ProjectNotFound(p) if p == "Nowhere"));
        // File untouched
        assert_eq!(ctx.content(), "Work:\n\t- task\n");
    }

    #[test]
    fn test_insert_project_new_root_goes_first() {
        let ctx = Ctx::new("Work:\n\t- task\n");
        let mut lines = outline_io::read_lines(&ctx.file).unwrap();
        let mut projects = projects_of(&ctx.file, &lines, &ctx.cfg, &ctx.resolver);
        insert_project(&mut lines, &mut projects, &ctx.file, "Errands");
        assert_eq!(lines, vec!["Errands:", "Work:", "\t- task"]);
        // Work shifted down
        let work = projects.iter().find(|p| p.name() == "Work").unwrap();
        assert_eq!(work.line, 1);
    }

    #[test]
    fn test_insert_project_archive_goes_last() {
        let ctx = Ctx::new("Work:\n\t- task\n");
        let mut lines = outline_io::read_lines(&ctx.file).unwrap();
        let mut projects = projects_of(&ctx.file, &lines, &ctx.cfg, &ctx.resolver);
        insert_project(&mut lines, &mut projects, &ctx.file, "Archive");
        assert_eq!(lines, vec!["Work:", "\t- task", "Archive:"]);
    }

    #[test]
    fn test_insert_project_nested_chain() {
        let ctx = Ctx::new("Work:\n\t- task\n");
        let mut lines = outline_io::read_lines(&ctx.file).unwrap();
        let mut projects = projects_of(&ctx.file, &lines, &ctx.cfg, &ctx.resolver);
        let idx = insert_project(&mut lines, &mut projects, &ctx.file, "Work:Q2:Goals");
        assert_eq!(
            lines,
            vec!["Work:", "\t- task", "\tQ2:", "\t\tGoals:"]
        );
        assert_eq!(projects[idx].path_str(), "Work:Q2:Goals");
        assert_eq!(projects[idx].line, 3);
        // Work's subtree now covers the new headers
        let work = projects.iter().find(|p| p.path_str() == "Work").unwrap();
        assert_eq!(work.last_line, 3);
    }

    #[test]
    fn test_prepend_placement() {
        let ctx = Ctx::new("Inbox:\n\t- first\n\t- second\n");
        let t = TransformSet {
            move_to: Some("Inbox".to_string()),
            ..Default::default()
        };
        ctx.mutator()
            .add(&ctx.file, "urgent thing", &t, Placement::Prepend, &ctx.ledger)
            .unwrap();
        assert_eq!(
            ctx.content(),
            "Inbox:\n\t- urgent thing\n\t- first\n\t- second\n"
        );
    }

    #[test]
    fn test_add_with_note_and_tags() {
        let ctx = Ctx::new("Inbox:\n");
        let t = TransformSet {
            move_to: Some("Inbox".to_string()),
            add_tags: vec![("due".to_string(), Some("tomorrow".to_string()))],
            note: vec!["call first".to_string()],
            ..Default::default()
        };
        let action = ctx
            .mutator()
            .add(&ctx.file, "Renew passport", &t, Placement::Append, &ctx.ledger)
            .unwrap();
        // Date tag normalized from the phrase
        assert_eq!(action.tag_value("due"), Some("2025-03-11"));
        assert_eq!(
            ctx.content(),
            "Inbox:\n\t- Renew passport @due(2025-03-11)\n\t\tcall first\n"
        );
    }

    #[test]
    fn test_priority_then_remove_then_add_order() {
        let ctx = Ctx::new("Inbox:\n\t- task @waiting @priority(1)\n");
        let todo = ctx.parse();
        let t = TransformSet {
            priority: Some(3),
            remove_tags: vec!["waiting".to_string()],
            add_tags: vec![("home".to_string(), None)],
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(results[0].text, "task @priority(3) @home");
    }

    #[test]
    fn test_explicit_stamps_for_time_tracking() {
        let ctx = Ctx::new("Inbox:\n\t- deep work\n");
        let todo = ctx.parse();
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let t = TransformSet {
            finish: true,
            started_at: day.and_hms_opt(13, 0, 0),
            done_at: day.and_hms_opt(14, 0, 0),
            duration_seconds: Some(3600),
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(results[0].tag_value("start"), Some("2025-03-10 13:00"));
        assert_eq!(results[0].tag_value("duration"), Some("3600"));
        // Explicit done stamp wins over the pass clock
        assert_eq!(results[0].tag_value("done"), Some("2025-03-10 14:00"));
    }

    #[test]
    fn test_note_overwrite_and_append() {
        let ctx = Ctx::new("Inbox:\n\t- task\n\t\told note\n");
        let todo = ctx.parse();

        let t = TransformSet {
            note: vec!["new note".to_string()],
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(results[0].note, vec!["old note", "new note"]);

        let todo = ctx.parse();
        let t = TransformSet {
            note: vec!["only note".to_string()],
            overwrite_note: true,
            ..Default::default()
        };
        let results = ctx
            .mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(results[0].note, vec!["only note"]);
        assert_eq!(ctx.content(), "Inbox:\n\t- task\n\t\tonly note\n");
    }

    #[test]
    fn test_edit_transform_uses_collaborator() {
        let ctx = Ctx::new("Inbox:\n\t- old text\n");
        let todo = ctx.parse();
        let t = TransformSet {
            edit: true,
            ..Default::default()
        };
        let editor = |_text: &str, _note: &[String]| {
            Ok(("edited text @due(2025-04-01)".to_string(), vec!["edited note".to_string()]))
        };
        let results = ctx
            .mutator()
            .apply(
                &ctx.file,
                &todo.actions,
                &t,
                Placement::Append,
                Some(&editor),
                &ctx.ledger,
            )
            .unwrap();
        assert_eq!(results[0].tag_value("due"), Some("2025-04-01"));
        assert_eq!(
            ctx.content(),
            "Inbox:\n\t- edited text @due(2025-04-01)\n\t\tedited note\n"
        );
    }

    #[test]
    fn test_multi_target_pass_keeps_indices_consistent() {
        let ctx = Ctx::new("A:\n\t- one\n\t- two\n\t- three\nB:\n\t- other\n");
        let todo = ctx.parse();
        let targets: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| a.project == "A")
            .cloned()
            .collect();
        assert_eq!(targets.len(), 3);
        let t = TransformSet {
            delete: true,
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &targets, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(ctx.content(), "A:\nB:\n\t- other\n");
    }

    #[test]
    fn test_empty_targets_is_no_match() {
        let ctx = Ctx::new("A:\n");
        let err = ctx
            .mutator()
            .apply(
                &ctx.file,
                &[],
                &TransformSet::default(),
                Placement::Append,
                None,
                &ctx.ledger,
            )
            .unwrap_err();
        assert!(matches!(err, MutateError::NoMatch));
    }

    #[test]
    fn test_mutation_is_undoable() {
        let ctx = Ctx::new("Inbox:\n\t- Buy milk\n");
        let todo = ctx.parse();
        let t = TransformSet {
            delete: true,
            ..Default::default()
        };
        ctx.mutator()
            .apply(&ctx.file, &todo.actions, &t, Placement::Append, None, &ctx.ledger)
            .unwrap();
        assert_eq!(ctx.content(), "Inbox:\n");

        ctx.ledger.restore(None).unwrap();
        assert_eq!(ctx.content(), "Inbox:\n\t- Buy milk\n");
    }
}
