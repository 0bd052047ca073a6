use serde_json::json;
use tracing::warn;

use crate::ipc::error::{err, grid_details, grid_err, ok};
use crate::ipc::helpers::{policy_param, required_day, required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::sqlite::SqliteBackend;
use crate::timetable::{CellEdit, Day, GridStore, SlotCatalog};

struct CellRef {
    class_id: String,
    day: Day,
    slot_id: String,
}

fn cell_ref(params: &serde_json::Value) -> Result<CellRef, HandlerErr> {
    Ok(CellRef {
        class_id: required_str(params, "classId")?,
        day: required_day(params)?,
        slot_id: required_str(params, "slotId")?,
    })
}

fn require_grid<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a GridStore<SqliteBackend>, serde_json::Value> {
    state
        .grid
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn slots_json(grid: &GridStore<SqliteBackend>) -> Result<serde_json::Value, HandlerErr> {
    let slots = grid.backend().list_slots().map_err(|e| {
        warn!(error = %e, "slot catalog unavailable");
        HandlerErr {
            code: "db_query_failed",
            message: e.to_string(),
            details: None,
        }
    })?;
    Ok(json!(slots))
}

fn handle_timetable_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let cell = match cell_ref(&req.params) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    let assignment = grid.get(&cell.class_id, cell.day, &cell.slot_id);
    ok(&req.id, json!({ "assignment": assignment }))
}

/// Ids must be strings or null; anything else is refused rather than read
/// as absent, which would turn the edit into a clear.
fn parse_edit(value: &serde_json::Value) -> Result<CellEdit, HandlerErr> {
    let cell = cell_ref(value)?;
    let edit: CellEdit = serde_json::from_value(value.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid edit: {e}")))?;
    Ok(CellEdit {
        class_id: cell.class_id,
        day: cell.day,
        slot_id: cell.slot_id,
        ..edit
    })
}

fn handle_timetable_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match policy_param(&req.params, state.config.timetable.conflict_policy) {
        Ok(p) => p,
        Err(e) => return e.response(&req.id),
    };
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let edit = match parse_edit(&req.params) {
        Ok(e) => e,
        Err(e) => return e.response(&req.id),
    };

    match grid.upsert_checked(edit, policy) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "assignment": outcome.assignment,
                "conflicts": outcome.conflicts,
            }),
        ),
        Err(e) => grid_err(&req.id, &e),
    }
}

fn handle_timetable_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let cell = match cell_ref(&req.params) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match grid.clear(&cell.class_id, cell.day, &cell.slot_id) {
        Ok(cleared) => ok(&req.id, json!({ "cleared": cleared })),
        Err(e) => grid_err(&req.id, &e),
    }
}

/// Applies each edit independently; one bad edit does not stop the rest.
/// Oversized payloads are rejected whole before anything is applied.
fn handle_timetable_bulk_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match policy_param(&req.params, state.config.timetable.conflict_policy) {
        Ok(p) => p,
        Err(e) => return e.response(&req.id),
    };
    let max_edits = state.config.timetable.bulk_update_max_edits;
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let Some(edits) = req.params.get("edits").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing edits", None);
    };

    if edits.len() > max_edits {
        warn!(count = edits.len(), max_edits, "bulk update over limit");
        return ok(
            &req.id,
            json!({
                "updated": 0,
                "rejected": edits.len(),
                "limitExceeded": true,
                "errors": [{
                    "code": "too_many_edits",
                    "message": format!("at most {max_edits} edits per request"),
                    "details": { "count": edits.len(), "max": max_edits },
                }],
            }),
        );
    }

    let mut updated = 0usize;
    let mut conflicts = Vec::new();
    let mut errors = Vec::new();
    for (index, raw) in edits.iter().enumerate() {
        let edit = match parse_edit(raw) {
            Ok(e) => e,
            Err(e) => {
                errors.push(json!({
                    "index": index,
                    "code": e.code,
                    "message": e.message,
                }));
                continue;
            }
        };
        match grid.upsert_checked(edit, policy) {
            Ok(outcome) => {
                updated += 1;
                if !outcome.conflicts.is_empty() {
                    conflicts.push(json!({ "index": index, "conflicts": outcome.conflicts }));
                }
            }
            Err(e) => errors.push(json!({
                "index": index,
                "code": e.code(),
                "message": e.to_string(),
                "details": grid_details(&e),
            })),
        }
    }

    let rejected = errors.len();
    let mut result = serde_json::Map::new();
    result.insert("updated".into(), json!(updated));
    if !conflicts.is_empty() {
        result.insert("conflicts".into(), json!(conflicts));
    }
    if rejected > 0 {
        result.insert("rejected".into(), json!(rejected));
        result.insert("errors".into(), json!(errors));
    }
    ok(&req.id, serde_json::Value::Object(result))
}

fn handle_timetable_class_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let slots = match slots_json(grid) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let cells: Vec<_> = grid.class_view(&class_id).into_values().collect();
    ok(
        &req.id,
        json!({
            "classId": class_id,
            "days": Day::ALL,
            "slots": slots,
            "cells": cells,
        }),
    )
}

fn handle_timetable_teacher_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let teacher_id = match required_str(&req.params, "teacherId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let slots = match slots_json(grid) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let cells: Vec<_> = grid
        .teacher_view(&teacher_id)
        .into_iter()
        .map(|((day, slot_id), classes)| {
            json!({
                "day": day,
                "slotId": slot_id,
                "classes": classes,
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "teacherId": teacher_id,
            "days": Day::ALL,
            "slots": slots,
            "cells": cells,
        }),
    )
}

/// With a candidate cell: the classes it would collide with. Without one:
/// every double-booking in the workspace.
fn handle_timetable_conflicts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grid = match require_grid(state, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };

    if req.params.get("teacherId").is_none() {
        return ok(&req.id, json!({ "records": grid.conflict_report() }));
    }

    let cell = match cell_ref(&req.params) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    let teacher_id = match required_str(&req.params, "teacherId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conflicts = grid.conflicts_for(cell.day, &cell.slot_id, &teacher_id, &cell.class_id);
    ok(&req.id, json!({ "conflicts": conflicts }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.get" => Some(handle_timetable_get(state, req)),
        "timetable.upsert" => Some(handle_timetable_upsert(state, req)),
        "timetable.clear" => Some(handle_timetable_clear(state, req)),
        "timetable.bulkUpdate" => Some(handle_timetable_bulk_update(state, req)),
        "timetable.classView" => Some(handle_timetable_class_view(state, req)),
        "timetable.teacherView" => Some(handle_timetable_teacher_view(state, req)),
        "timetable.conflicts" => Some(handle_timetable_conflicts(state, req)),
        _ => None,
    }
}
