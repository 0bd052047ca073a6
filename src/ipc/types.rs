use std::path::PathBuf;

use serde::Deserialize;

use crate::config::Config;
use crate::sqlite::{SharedConn, SqliteBackend};
use crate::timetable::GridStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Per-process state. One grid per selected workspace; selecting another
/// workspace replaces all of it.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<SharedConn>,
    pub grid: Option<GridStore<SqliteBackend>>,
    pub config: Config,
    pub base_config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            workspace: None,
            db: None,
            grid: None,
            base_config: config.clone(),
            config,
        }
    }
}
