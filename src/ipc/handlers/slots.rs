use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::sqlite;
use crate::timetable::{parse_slot_time, validate_slots, TimeSlot};

fn handle_slots_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(shared) = state.db.as_ref() else {
        return ok(&req.id, json!({ "slots": [] }));
    };
    match sqlite::list_slots(&shared.lock()) {
        Ok(slots) => ok(&req.id, json!({ "slots": slots })),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn parse_new_slot(params: &serde_json::Value) -> Result<TimeSlot, HandlerErr> {
    let label = required_str(params, "label")?;
    let start = required_str(params, "startTime")?;
    let end = required_str(params, "endTime")?;
    let time = |raw: &str| {
        parse_slot_time(raw).map_err(|e| HandlerErr {
            code: "bad_params",
            message: e.to_string(),
            details: Some(json!({ "time": raw })),
        })
    };
    Ok(TimeSlot {
        id: optional_str(params, "slotId").unwrap_or_else(|| Uuid::new_v4().to_string()),
        label,
        start_time: time(&start)?,
        end_time: time(&end)?,
    })
}

/// Adds a period after checking it against the existing catalog, so the
/// stored list stays ordered and non-overlapping.
fn handle_slots_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(shared) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let slot = match parse_new_slot(&req.params) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };

    let conn = shared.lock();
    let mut all = match sqlite::list_slots(&conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    all.push(slot.clone());
    if let Err(e) = validate_slots(&all) {
        return err(
            &req.id,
            "bad_params",
            e.to_string(),
            Some(json!({ "slot": slot })),
        );
    }

    if let Err(e) = sqlite::insert_slot(&conn, &slot) {
        return err(
            &req.id,
            "db_insert_failed",
            format!("{e:#}"),
            Some(json!({ "table": "time_slots" })),
        );
    }

    info!(slot_id = %slot.id, label = %slot.label, "slot created");
    ok(&req.id, json!({ "slot": slot }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "slots.list" => Some(handle_slots_list(state, req)),
        "slots.create" => Some(handle_slots_create(state, req)),
        _ => None,
    }
}
