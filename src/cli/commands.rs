use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("td v", env!("CARGO_PKG_VERSION"), " - your todos are plain text"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Outline file to operate on: a path, or a fuzzy token matched against
    /// the known-files database
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List actions (default when no subcommand is given)
    Ls(LsArgs),
    /// Add a new action
    Add(AddArgs),
    /// Mark matching actions done
    Done(DoneArgs),
    /// Move matching actions to another project
    Mv(MvArgs),
    /// Delete matching actions
    Rm(RmArgs),
    /// Add or remove tags on matching actions
    Tag(TagArgs),
    /// Open a matching action in $EDITOR
    Edit(EditArgs),
    /// Restore the most recent backup
    Undo(UndoArgs),
    /// List or extend the known-files database
    Files(FilesCmd),
}

// ---------------------------------------------------------------------------
// Shared selection args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct SelectArgs {
    /// Search terms (comma/space separated; leading + = required,
    /// - or ! = negated; * and ? wildcards)
    pub query: Vec<String>,
    /// Tag criteria, e.g. "due<=tomorrow,-waiting,priority>2"
    #[arg(long, short)]
    pub tag: Option<String>,
    /// Only actions under this project path (wildcards ok)
    #[arg(long, short)]
    pub project: Option<String>,
    /// Match search terms against notes too
    #[arg(long)]
    pub notes: bool,
    /// Treat search terms as regular expressions
    #[arg(long)]
    pub regex: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct LsArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Include completed actions
    #[arg(long)]
    pub all: bool,
    /// Only actions carrying the configured primary tag
    #[arg(long)]
    pub primary: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Action text (tags inline as @name or @name(value))
    #[arg(required = true)]
    pub text: Vec<String>,
    /// Destination project path (default: Inbox, created if missing)
    #[arg(long, short)]
    pub project: Option<String>,
    /// Note line to attach (repeatable)
    #[arg(long)]
    pub note: Vec<String>,
    /// Insert at the top of the project instead of the bottom
    #[arg(long)]
    pub prepend: bool,
    /// Create the destination project if it does not exist
    #[arg(long)]
    pub create: bool,
}

#[derive(Args)]
pub struct DoneArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Move the completed action to this project (e.g. Archive)
    #[arg(long)]
    pub to: Option<String>,
    /// Create the destination project if it does not exist
    #[arg(long)]
    pub create: bool,
    /// Apply to every match instead of refusing on more than one
    #[arg(long)]
    pub all_matches: bool,
}

#[derive(Args)]
pub struct MvArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Destination project path
    #[arg(long)]
    pub to: String,
    /// Create the destination project if it does not exist
    #[arg(long)]
    pub create: bool,
    /// Insert at the top of the project instead of the bottom
    #[arg(long)]
    pub prepend: bool,
    /// Apply to every match instead of refusing on more than one
    #[arg(long)]
    pub all_matches: bool,
}

#[derive(Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Apply to every match instead of refusing on more than one
    #[arg(long)]
    pub all_matches: bool,
}

#[derive(Args)]
pub struct TagArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Tag to add, as name or name=value (repeatable)
    #[arg(long)]
    pub add: Vec<String>,
    /// Tag name to remove, wildcards ok (repeatable)
    #[arg(long)]
    pub remove: Vec<String>,
    /// Set the priority tag
    #[arg(long)]
    pub priority: Option<u32>,
    /// Note line to append (repeatable)
    #[arg(long)]
    pub note: Vec<String>,
    /// Replace the existing note instead of appending
    #[arg(long)]
    pub overwrite_note: bool,
    /// Apply to every match instead of refusing on more than one
    #[arg(long)]
    pub all_matches: bool,
}

#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Apply to every match instead of refusing on more than one
    #[arg(long)]
    pub all_matches: bool,
}

#[derive(Args)]
pub struct UndoArgs {
    /// Restrict the restore to backups whose source path matches
    pub pattern: Option<String>,
}

// ---------------------------------------------------------------------------
// Known-files database
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FilesCmd {
    #[command(subcommand)]
    pub action: Option<FilesAction>,
}

#[derive(Subcommand)]
pub enum FilesAction {
    /// List known outline files (default)
    List,
    /// Record outline files
    Add(FilesAddArgs),
}

#[derive(Args)]
pub struct FilesAddArgs {
    /// Paths to record
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
