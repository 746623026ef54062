use rusqlite::Connection;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, optional_str, require_admin, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{BranchDraft, SessionDraft, StaffDraft, StaffProfile, UserRole};
use crate::store;

fn staff_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let staff = store::list_staff(conn)?;
    Ok(json!({ "staff": staff }))
}

fn staff_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let admin = require_admin(state)?;
    let draft: StaffDraft = required_obj(params, "staff")?;

    let mut fields = serde_json::Map::new();
    if !draft.email.contains('@') {
        fields.insert("email".into(), json!("Enter a valid email address"));
    }
    if draft.name.trim().is_empty() {
        fields.insert("name".into(), json!("Name is required"));
    }
    if draft.role == UserRole::SuperAdmin {
        fields.insert("role".into(), json!("Only coaches can be added here"));
    }
    if !fields.is_empty() {
        return Err(HandlerErr::new("validation_failed", "Please fix the highlighted fields")
            .with_details(json!({ "fields": fields })));
    }

    let conn = db_conn(state)?;
    let profile = StaffProfile {
        uid: Uuid::new_v4().to_string(),
        email: draft.email.trim().to_string(),
        role: draft.role,
        name: draft.name.trim().to_string(),
        phone_number: draft.phone_number,
        academy_name: draft.academy_name.or_else(|| admin.academy_name.clone()),
        branch_ids: draft.branch_ids,
        profile_url: None,
    };
    store::insert_staff(conn, &profile, &state.now_rfc3339())?;
    info!(uid = %profile.uid, by = %admin.uid, "staff member created");
    Ok(json!({ "profile": profile }))
}

fn staff_delete(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let admin = require_admin(state)?;
    let uid = required_str(params, "uid")?;
    if uid == admin.uid {
        return Err(HandlerErr::bad_params("cannot remove your own account"));
    }
    store::delete_staff(db_conn(state)?, &uid)?;
    info!(uid = %uid, by = %admin.uid, "staff member removed");
    Ok(json!({ "deleted": uid }))
}

fn branches_save(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let draft: BranchDraft = required_obj(params, "branch")?;
    if draft.name.trim().is_empty() {
        return Err(HandlerErr::new("validation_failed", "Please fix the highlighted fields")
            .with_details(json!({ "fields": { "name": "Branch name is required" } })));
    }
    let id = optional_str(params, "id");
    let id = store::save_branch(conn, &draft, id.as_deref())?;
    Ok(json!({ "id": id }))
}

fn sessions_save(
    conn: &Connection,
    params: &serde_json::Value,
    now: &str,
) -> Result<serde_json::Value, HandlerErr> {
    let draft: SessionDraft = required_obj(params, "session")?;
    let mut fields = serde_json::Map::new();
    if draft.name.trim().is_empty() {
        fields.insert("name".into(), json!("Session name is required"));
    }
    if draft.timings.trim().is_empty() {
        fields.insert("timings".into(), json!("Session timings are required"));
    }
    if !draft.fee.is_finite() || draft.fee < 0.0 {
        fields.insert("fee".into(), json!("Enter a valid amount"));
    }
    if !fields.is_empty() {
        return Err(HandlerErr::new("validation_failed", "Please fix the highlighted fields")
            .with_details(json!({ "fields": fields })));
    }
    let id = optional_str(params, "id");
    let id = store::save_session(conn, &draft, id.as_deref(), now)?;
    Ok(json!({ "id": id }))
}

fn dispatch(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let params = &req.params;
    match req.method.as_str() {
        "staff.create" => return staff_create(state, params),
        "staff.delete" => return staff_delete(state, params),
        _ => {}
    }

    let now = state.now_rfc3339();
    let conn = db_conn(state)?;
    match req.method.as_str() {
        "staff.list" => staff_list(conn),
        "branches.list" => Ok(json!({ "branches": store::list_branches(conn)? })),
        "branches.save" => branches_save(conn, params),
        "branches.delete" => {
            let id = required_str(params, "id")?;
            store::delete_branch(conn, &id)?;
            Ok(json!({ "deleted": id }))
        }
        "sessions.list" => {
            let branch_id = optional_str(params, "branchId");
            Ok(json!({ "sessions": store::list_sessions(conn, branch_id.as_deref())? }))
        }
        "sessions.save" => sessions_save(conn, params, &now),
        "sessions.delete" => {
            let id = required_str(params, "id")?;
            store::delete_session(conn, &id)?;
            Ok(json!({ "deleted": id }))
        }
        "academy.seedDefaults" => {
            let seeded = store::seed_defaults(conn, &now)?;
            Ok(json!({
                "branchesCreated": seeded.branches_created,
                "sessionsCreated": seeded.sessions_created,
            }))
        }
        other => Err(HandlerErr::new("not_implemented", format!("unknown method: {}", other))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "staff.list" | "staff.create" | "staff.delete" | "branches.list" | "branches.save"
        | "branches.delete" | "sessions.list" | "sessions.save" | "sessions.delete"
        | "academy.seedDefaults" => Some(match dispatch(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
