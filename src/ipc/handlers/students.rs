use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, parse_scope, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentDraft;
use crate::store;
use crate::validate;

fn checked_draft(params: &serde_json::Value) -> Result<StudentDraft, HandlerErr> {
    let draft: StudentDraft = required_obj(params, "student")?;
    let errors = validate::validate_student(&draft);
    if !errors.is_empty() {
        return Err(
            HandlerErr::new("validation_failed", "Please fix the highlighted fields")
                .with_details(json!({ "fields": errors })),
        );
    }
    Ok(draft)
}

fn students_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let scope = parse_scope(params)?;
    let students = store::list_students(conn, &scope)?;
    Ok(json!({ "scope": scope.label(), "students": students }))
}

fn students_get(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = required_str(params, "id")?;
    let student = store::get_student(conn, &id)?.ok_or(store::StoreError::NotFound("student"))?;
    Ok(json!({ "student": student }))
}

fn students_search(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let query = params
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let students = store::search_students(conn, query)?;
    Ok(json!({ "students": students }))
}

fn dispatch(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let params = &req.params;
    let now = state.now_rfc3339();
    let conn = db_conn(state)?;
    match req.method.as_str() {
        "students.list" => students_list(conn, params),
        "students.get" => students_get(conn, params),
        "students.search" => students_search(conn, params),
        "students.create" => {
            let draft = checked_draft(params)?;
            let id = store::create_student(conn, &draft, &now)?;
            Ok(json!({ "id": id }))
        }
        "students.update" => {
            let id = required_str(params, "id")?;
            let draft = checked_draft(params)?;
            store::update_student(conn, &id, &draft, &now)?;
            Ok(json!({ "id": id }))
        }
        "students.delete" => {
            let id = required_str(params, "id")?;
            store::delete_student(conn, &id)?;
            Ok(json!({ "deleted": id }))
        }
        other => Err(HandlerErr::new("not_implemented", format!("unknown method: {}", other))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" | "students.get" | "students.search" | "students.create"
        | "students.update" | "students.delete" => Some(match dispatch(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
