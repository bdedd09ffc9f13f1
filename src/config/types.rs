use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "fs-uae", default)]
    pub fs_uae: FsUaeConfig,
}

/// Where FS-UAE and its data live. Values may start with `~`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsUaeConfig {
    /// FS-UAE data directory (holds `Configurations/`).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory searched for development builds.
    #[serde(default = "default_bin_dir")]
    pub bin_dev_dir: String,
    /// Directory searched for release builds.
    #[serde(default = "default_bin_dir")]
    pub bin_rel_dir: String,
    /// Executable name relative to the binary directory.
    #[serde(default)]
    pub bin_name: Option<String>,
}

fn default_data_dir() -> String {
    "~/Documents/FS-UAE".to_string()
}

fn default_bin_dir() -> String {
    "~/fs-uae-dev".to_string()
}

impl Default for FsUaeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bin_dev_dir: default_bin_dir(),
            bin_rel_dir: default_bin_dir(),
            bin_name: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fs_uae: FsUaeConfig::default(),
        }
    }
}
