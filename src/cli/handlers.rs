use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::cli::commands::*;
use crate::cli::output::{actions_to_json, format_action_line, format_listing};
use crate::io::backup::BackupLedger;
use crate::io::config_io;
use crate::io::file_db::FileDb;
use crate::model::action::Action;
use crate::model::config::Config;
use crate::model::outline::Todo;
use crate::ops::{ActionEditor, MutateError, Mutator, Placement, TransformSet};
use crate::parse::outline_parser::{ParseOptions, parse_files};
use crate::query::dates::ChronoResolver;
use crate::query::pattern::Pattern;
use crate::query::term::Query;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let json = cli.json;
    let ctx = Context {
        cfg: config_io::read_config(),
        resolver: ChronoResolver::default(),
        file: cli.file,
    };

    match cli.command {
        // Bare `td` is a plain listing
        None => cmd_ls(LsArgs::default(), &ctx, json),
        Some(cmd) => match cmd {
            Commands::Ls(args) => cmd_ls(args, &ctx, json),
            Commands::Add(args) => cmd_add(args, &ctx, json),
            Commands::Done(args) => cmd_done(args, &ctx, json),
            Commands::Mv(args) => cmd_mv(args, &ctx, json),
            Commands::Rm(args) => cmd_rm(args, &ctx, json),
            Commands::Tag(args) => cmd_tag(args, &ctx, json),
            Commands::Edit(args) => cmd_edit(args, &ctx, json),
            Commands::Undo(args) => cmd_undo(args, &ctx),
            Commands::Files(args) => cmd_files(args, &ctx, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Shared context and helpers
// ---------------------------------------------------------------------------

struct Context {
    cfg: Config,
    resolver: ChronoResolver,
    /// `--file` token, overriding the configured file list.
    file: Option<String>,
}

impl Context {
    fn ledger(&self) -> BackupLedger {
        BackupLedger::new(self.cfg.backup_root())
    }

    fn file_db(&self) -> FileDb {
        FileDb::new(self.cfg.file_db_path())
    }

    fn mutator(&self) -> Mutator<'_> {
        Mutator {
            cfg: &self.cfg,
            resolver: &self.resolver,
            now: self.resolver.now,
        }
    }

    /// The outline files this invocation operates on: the `--file` token (a
    /// literal path, or a fuzzy match against the known-files db), else the
    /// configured list.
    fn files(&self) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        if let Some(token) = &self.file {
            let literal = PathBuf::from(token);
            if literal.exists() {
                return Ok(vec![literal]);
            }
            let hits = self.file_db().resolve(token);
            if hits.is_empty() {
                return Err(format!("no outline file matching '{}'", token).into());
            }
            return Ok(hits);
        }
        if self.cfg.files.is_empty() {
            return Err("no outline files: pass --file or set `files` in config.toml".into());
        }
        Ok(self.cfg.files.clone())
    }
}

fn parse_options(sel: &SelectArgs, include_done: bool, require_primary_tag: bool) -> ParseOptions {
    let search = sel.query.join(" ");
    ParseOptions {
        include_done,
        require_primary_tag,
        query: Query::parse_with_mode(&search, sel.tag.as_deref().unwrap_or(""), sel.regex),
        search_notes: sel.notes,
        project: sel.project.as_deref().map(Pattern::from_token),
    }
}

/// Resolve a mutation's targets. More than one match without the
/// all-matches flag is refused; zero matches is an error either way.
fn select_targets(
    ctx: &Context,
    sel: &SelectArgs,
    include_done: bool,
    all_matches: bool,
) -> Result<Todo, Box<dyn Error>> {
    let files = ctx.files()?;
    let opts = parse_options(sel, include_done, false);
    let todo = parse_files(&files, &opts, &ctx.cfg, &ctx.resolver)?;
    let _ = ctx.file_db().record(&todo.files);

    match todo.actions.len() {
        0 => Err(Box::new(MutateError::NoMatch)),
        1 => Ok(todo),
        n if !all_matches => Err(Box::new(MutateError::Ambiguous(n))),
        _ => Ok(todo),
    }
}

/// Run one transform pass file by file. The engine takes targets for a
/// single file at a time; each file gets its own lock/backup/write cycle.
/// An I/O failure (e.g. a file that vanished since resolution) is fatal for
/// that file only — the rest of the batch still goes through.
fn apply_per_file(
    ctx: &Context,
    todo: &Todo,
    transforms: &TransformSet,
    placement: Placement,
    editor: Option<&dyn ActionEditor>,
) -> Result<Vec<Action>, Box<dyn Error>> {
    let ledger = ctx.ledger();
    let mutator = ctx.mutator();
    let mut results = Vec::new();
    let mut skipped = 0usize;
    for file in &todo.files {
        let targets: Vec<Action> = todo
            .actions
            .iter()
            .filter(|a| &a.file == file)
            .cloned()
            .collect();
        if targets.is_empty() {
            continue;
        }
        match mutator.apply(file, &targets, transforms, placement, editor, &ledger) {
            Ok(mut actions) => results.append(&mut actions),
            Err(MutateError::ProjectNotFound(p)) => {
                return Err(
                    format!("project '{}' does not exist (pass --create to create it)", p).into(),
                );
            }
            Err(e) => {
                eprintln!("warning: skipping {}: {}", file.display(), e);
                skipped += 1;
            }
        }
    }
    if results.is_empty() && skipped > 0 {
        return Err("no files could be modified".into());
    }
    Ok(results)
}

fn report(results: &[Action], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&actions_to_json(results))?);
    } else {
        for action in results {
            println!("{}", format_action_line(action));
        }
    }
    Ok(())
}

/// Split a `name` / `name=value` tag spec from the command line.
fn parse_tag_spec(spec: &str) -> (String, Option<String>) {
    match spec.split_once('=') {
        Some((name, value)) => (name.to_string(), Some(value.to_string())),
        None => (spec.to_string(), None),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_ls(args: LsArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let files = ctx.files()?;
    let opts = parse_options(&args.select, args.all, args.primary);
    let todo = parse_files(&files, &opts, &ctx.cfg, &ctx.resolver)?;
    let _ = ctx.file_db().record(&todo.files);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&actions_to_json(&todo.actions))?
        );
    } else {
        for line in format_listing(&todo) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let files = ctx.files()?;
    // New actions land in the first outline file
    let file = files.first().cloned().ok_or("no outline file to add to")?;

    // Default destination is Inbox, synthesized on first use
    let (dest, create) = match args.project {
        Some(p) => (p, args.create),
        None => ("Inbox".to_string(), true),
    };
    let transforms = TransformSet {
        move_to: Some(dest),
        create_project: create,
        note: args.note,
        ..Default::default()
    };
    let placement = if args.prepend {
        Placement::Prepend
    } else {
        Placement::Append
    };

    let text = args.text.join(" ");
    match ctx
        .mutator()
        .add(&file, &text, &transforms, placement, &ctx.ledger())
    {
        Ok(action) => {
            let _ = ctx.file_db().record(&[file]);
            report(&[action], json)
        }
        Err(MutateError::ProjectNotFound(p)) => {
            Err(format!("project '{}' does not exist (pass --create to create it)", p).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_done(args: DoneArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let todo = select_targets(ctx, &args.select, false, args.all_matches)?;
    let transforms = TransformSet {
        finish: true,
        move_to: args.to,
        create_project: args.create,
        ..Default::default()
    };
    let results = apply_per_file(ctx, &todo, &transforms, Placement::Append, None)?;
    report(&results, json)
}

fn cmd_mv(args: MvArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let todo = select_targets(ctx, &args.select, true, args.all_matches)?;
    let transforms = TransformSet {
        move_to: Some(args.to),
        create_project: args.create,
        ..Default::default()
    };
    let placement = if args.prepend {
        Placement::Prepend
    } else {
        Placement::Append
    };
    let results = apply_per_file(ctx, &todo, &transforms, placement, None)?;
    report(&results, json)
}

fn cmd_rm(args: RmArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let todo = select_targets(ctx, &args.select, true, args.all_matches)?;
    let transforms = TransformSet {
        delete: true,
        ..Default::default()
    };
    apply_per_file(ctx, &todo, &transforms, Placement::Append, None)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&actions_to_json(&todo.actions))?);
    } else {
        for action in &todo.actions {
            println!("removed {}", format_action_line(action));
        }
    }
    Ok(())
}

fn cmd_tag(args: TagArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    if args.add.is_empty()
        && args.remove.is_empty()
        && args.priority.is_none()
        && args.note.is_empty()
    {
        return Err("nothing to do: pass --add, --remove, --priority or --note".into());
    }
    let todo = select_targets(ctx, &args.select, true, args.all_matches)?;
    let transforms = TransformSet {
        priority: args.priority,
        add_tags: args.add.iter().map(|s| parse_tag_spec(s)).collect(),
        remove_tags: args.remove,
        note: args.note,
        overwrite_note: args.overwrite_note,
        ..Default::default()
    };
    let results = apply_per_file(ctx, &todo, &transforms, Placement::Append, None)?;
    report(&results, json)
}

fn cmd_edit(args: EditArgs, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let todo = select_targets(ctx, &args.select, true, args.all_matches)?;
    let transforms = TransformSet {
        edit: true,
        ..Default::default()
    };
    let editor = ShellEditor;
    let results = apply_per_file(ctx, &todo, &transforms, Placement::Append, Some(&editor))?;
    report(&results, json)
}

fn cmd_undo(args: UndoArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let pattern = args.pattern.as_deref().map(Pattern::from_token);
    let restored = ctx.ledger().restore(pattern.as_ref())?;
    println!("restored {}", restored.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Known-files database
// ---------------------------------------------------------------------------

fn cmd_files(args: FilesCmd, ctx: &Context, json: bool) -> Result<(), Box<dyn Error>> {
    let db = ctx.file_db();
    match args.action {
        None | Some(FilesAction::List) => {
            let all = db.all();
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                for path in all {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }
        Some(FilesAction::Add(add)) => {
            db.record(&add.paths)?;
            println!("{} files known", db.all().len());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// External editor collaborator
// ---------------------------------------------------------------------------

/// Spawns `$VISUAL`/`$EDITOR` on a temp file holding the action text (first
/// line) and note (remaining lines), then reads the result back.
struct ShellEditor;

impl ActionEditor for ShellEditor {
    fn edit(&self, text: &str, note: &[String]) -> io::Result<(String, Vec<String>)> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "{}", text)?;
        for line in note {
            writeln!(tmp, "{}", line)?;
        }
        tmp.flush()?;

        let editor = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| "vi".to_string());
        let status = Command::new(&editor).arg(tmp.path()).status()?;
        if !status.success() {
            return Err(io::Error::other(format!("editor '{}' failed: {}", editor, status)));
        }

        let content = fs::read_to_string(tmp.path())?;
        let mut lines = content.lines();
        let text = lines.next().unwrap_or("").trim().to_string();
        let note = lines
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Ok((text, note))
    }
}
