use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tag that marks an action as actionable "next" work. Actions without it
    /// can be filtered out when `require_primary_tag` is requested.
    #[serde(default = "default_primary_tag")]
    pub primary_tag: String,
    /// Tag that marks an action as completed.
    #[serde(default = "default_done_tag")]
    pub done_tag: String,
    /// Tags whose values are dates; their natural-language values get
    /// rewritten to canonical timestamps on mutation.
    #[serde(default = "default_date_tags")]
    pub date_tags: Vec<String>,
    /// Outline files used when a command names none.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Root of the backup store. Defaults under XDG data.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    /// Path of the known-files database. Defaults under XDG data.
    #[serde(default)]
    pub file_db: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            primary_tag: default_primary_tag(),
            done_tag: default_done_tag(),
            date_tags: default_date_tags(),
            files: Vec::new(),
            backup_dir: None,
            file_db: None,
        }
    }
}

fn default_primary_tag() -> String {
    "next".to_string()
}

fn default_done_tag() -> String {
    "done".to_string()
}

fn default_date_tags() -> Vec<String> {
    ["due", "start", "defer", "done"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// Resolved backup store root.
    pub fn backup_root(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("backups"))
    }

    /// Resolved known-files database path.
    pub fn file_db_path(&self) -> PathBuf {
        self.file_db
            .clone()
            .unwrap_or_else(|| data_dir().join("files"))
    }
}

/// Data directory, respecting XDG_DATA_HOME.
pub fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"));
    base.join("tdo")
}

/// Config directory, respecting XDG_CONFIG_HOME.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("tdo")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}
