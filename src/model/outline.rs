use std::path::PathBuf;

use crate::model::action::Action;
use crate::model::project::Project;

/// The transient result of parsing one or more outline files. Rebuilt from
/// scratch on every invocation, never persisted.
#[derive(Debug, Clone, Default)]
pub struct Todo {
    pub files: Vec<PathBuf>,
    pub projects: Vec<Project>,
    pub actions: Vec<Action>,
}
