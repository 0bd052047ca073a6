use serde_json::json;

use crate::timetable::GridError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn grid_details(e: &GridError) -> Option<serde_json::Value> {
    match e {
        GridError::InvalidReference { kind, id } => {
            Some(json!({ "kind": kind.to_string(), "id": id }))
        }
        GridError::PersistenceFailure { operation, .. } => Some(json!({ "operation": operation })),
        GridError::TeacherConflict {
            teacher_id,
            day,
            slot_id,
            classes,
        } => Some(json!({
            "teacherId": teacher_id,
            "day": day,
            "slotId": slot_id,
            "conflicts": classes,
        })),
    }
}

pub fn grid_err(id: &str, e: &GridError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), grid_details(e))
}
