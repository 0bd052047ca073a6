//! Daemon configuration.
//!
//! Read from `timetabled.toml` in the selected workspace. A missing file means
//! defaults; every field is optional.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::timetable::ConflictPolicy;

pub const CONFIG_FILE_NAME: &str = "timetabled.toml";
pub const CONFIG_PATH_ENV: &str = "TIMETABLED_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timetable: TimetableSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableSettings {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default = "default_bulk_update_max_edits")]
    pub bulk_update_max_edits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bulk_update_max_edits() -> usize {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TimetableSettings {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            bulk_update_max_edits: default_bulk_update_max_edits(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("parse timetabled config")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Startup config: the file named by `TIMETABLED_CONFIG`, else defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(p) => Self::from_file(&PathBuf::from(p)),
            None => Ok(Self::default()),
        }
    }

    /// Workspace config layered over `base`: a present file replaces it.
    pub fn for_workspace(workspace: &Path, base: &Config) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(base.clone());
        }
        Self::from_file(&path)
    }
}
