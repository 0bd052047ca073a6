use parking_lot::Mutex;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::sqlite::SqliteBackend;
use crate::timetable::GridStore;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "conflictPolicy": state.config.timetable.conflict_policy.as_str(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // A broken config file must not silently change the conflict policy.
    let config = match Config::for_workspace(&path, &state.base_config) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "bad_config", format!("{e:#}"), None),
    };

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    let shared = Arc::new(Mutex::new(conn));
    let backend = SqliteBackend::new(Arc::clone(&shared));
    let stored = match backend.load_assignments() {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "failed to load timetable");
            return err(&req.id, "db_query_failed", format!("{e:#}"), None);
        }
    };
    let grid = GridStore::new(backend);
    let assignment_count = grid.load(stored);
    info!(
        workspace = %path.display(),
        assignment_count,
        policy = config.timetable.conflict_policy.as_str(),
        "workspace selected"
    );

    state.workspace = Some(path.clone());
    state.db = Some(shared);
    state.grid = Some(grid);
    state.config = config;

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "assignmentCount": assignment_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
