use serde_json::json;

use super::error::err;
use crate::timetable::{ConflictPolicy, Day};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        Some(_) => Err(HandlerErr::bad_params(format!("{key} must not be empty"))),
        None => Err(HandlerErr::bad_params(format!("missing {key}"))),
    }
}

/// Absent, null and blank all read as `None`.
pub fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_day(params: &serde_json::Value) -> Result<Day, HandlerErr> {
    let raw = required_str(params, "day")?;
    raw.parse::<Day>().map_err(|e| HandlerErr {
        code: "bad_params",
        message: e.to_string(),
        details: Some(json!({ "day": raw })),
    })
}

/// Per-request `policy` param. Absent or null falls back to the configured
/// default.
pub fn policy_param(
    params: &serde_json::Value,
    default: ConflictPolicy,
) -> Result<ConflictPolicy, HandlerErr> {
    match params.get("policy") {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(serde_json::Value::String(raw)) => raw.parse().map_err(HandlerErr::bad_params),
        Some(other) => Err(HandlerErr::bad_params(format!(
            "policy must be a string, got {other}"
        ))),
    }
}
