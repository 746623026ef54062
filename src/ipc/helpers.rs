use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::{StaffProfile, StudentScope};

pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Deserializes `params[key]` into a typed record.
pub fn required_obj<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let raw = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        HandlerErr::bad_params(format!("invalid {}", key)).with_details(json!({ "reason": e.to_string() }))
    })
}

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::friendly("no_workspace"))
}

pub fn require_actor(state: &AppState) -> Result<&StaffProfile, HandlerErr> {
    state
        .actor
        .as_ref()
        .ok_or_else(|| HandlerErr::friendly("not_signed_in"))
}

pub fn require_admin(state: &AppState) -> Result<&StaffProfile, HandlerErr> {
    let actor = require_actor(state)?;
    if !actor.is_admin() {
        return Err(HandlerErr::friendly("permission_denied"));
    }
    Ok(actor)
}

/// Reads `branch`, `session` and `branches` into a [`StudentScope`].
pub fn parse_scope(params: &Value) -> Result<StudentScope, HandlerErr> {
    let branch = optional_str(params, "branch");
    let session = optional_str(params, "session");
    let branches: Option<Vec<String>> = match params.get("branches") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(|s| s.to_string())
                        .ok_or_else(|| HandlerErr::bad_params("branches must be strings"))
                })
                .collect::<Result<_, _>>()?,
        ),
        Some(_) => return Err(HandlerErr::bad_params("branches must be an array")),
    };

    match (branches, branch, session) {
        (Some(branches), _, Some(session)) => Ok(StudentScope::Branches { branches, session }),
        (Some(_), _, None) => Err(HandlerErr::bad_params("branches requires session")),
        (None, Some(branch), Some(session)) => Ok(StudentScope::Batch { branch, session }),
        (None, Some(branch), None) => Ok(StudentScope::Branch(branch)),
        (None, None, Some(_)) => Err(HandlerErr::bad_params("session requires branch")),
        (None, None, None) => Ok(StudentScope::All),
    }
}
