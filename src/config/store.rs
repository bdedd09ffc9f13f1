//! Configuration access for the runner and locator.
//!
//! Wraps the loaded file, applies command line overrides and hands out
//! home-expanded paths.

use std::path::{Path, PathBuf};

use crate::config::loader::ConfigError;
use crate::config::types::Config;

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<String>,
    pub bin_dev_dir: Option<String>,
    pub bin_rel_dir: Option<String>,
    pub bin_name: Option<String>,
}

/// Loaded configuration plus the path it came from.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: Config,
    path: PathBuf,
}

impl ConfigStore {
    /// Create a ConfigStore from initial config and path.
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn open(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(Config::config_path, Path::to_path_buf);
        let config = Config::load_from(&path)?;
        Ok(Self::new(config, path))
    }

    pub fn apply(&mut self, overrides: Overrides) {
        let section = &mut self.config.fs_uae;
        if let Some(dir) = overrides.data_dir {
            section.data_dir = dir;
        }
        if let Some(dir) = overrides.bin_dev_dir {
            section.bin_dev_dir = dir;
        }
        if let Some(dir) = overrides.bin_rel_dir {
            section.bin_rel_dir = dir;
        }
        if let Some(name) = overrides.bin_name {
            section.bin_name = Some(name);
        }
    }

    /// Get the current config.
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.config.fs_uae.data_dir)
    }

    pub fn bin_dev_dir(&self) -> PathBuf {
        expand_home(&self.config.fs_uae.bin_dev_dir)
    }

    pub fn bin_rel_dir(&self) -> PathBuf {
        expand_home(&self.config.fs_uae.bin_rel_dir)
    }

    pub fn bin_name(&self) -> Option<&str> {
        self.config.fs_uae.bin_name.as_deref()
    }
}

/// Replace a leading `~` with the user's home directory.
///
/// `~user` forms and paths without a home directory are left unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
