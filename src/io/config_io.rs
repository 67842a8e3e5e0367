use std::fs;
use std::path::Path;

use crate::model::config::{Config, config_dir};

/// Read the config from a specific path.
/// If the file doesn't exist, returns defaults.
/// If the file is corrupted, backs it up as .bak and returns defaults.
pub fn read_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<Config>(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                // Corrupted — back up and start fresh
                let bak = path.with_extension("toml.bak");
                let _ = fs::copy(path, &bak);
                eprintln!(
                    "warning: could not parse {} (backed up as {}): {}",
                    path.display(),
                    bak.display(),
                    e
                );
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}

/// Read the config from the default location.
pub fn read_config() -> Config {
    read_config_from(&config_dir().join("config.toml"))
}
