use rusqlite::Connection;
use serde_json::json;

use crate::calc;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, parse_scope};
use crate::ipc::types::{AppState, Request};
use crate::store;

/// Distinct session names across all branches, in session display order.
pub(super) fn session_names(conn: &Connection) -> Result<Vec<String>, HandlerErr> {
    let mut names: Vec<String> = Vec::new();
    for s in store::list_sessions(conn, None)? {
        if !names.contains(&s.name) {
            names.push(s.name);
        }
    }
    Ok(names)
}

fn analytics_summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let scope = parse_scope(params)?;
    let students = store::list_students(conn, &scope)?;
    let stats = calc::academy_stats(&students, &session_names(conn)?, state.today());
    Ok(json!({ "scope": scope.label(), "stats": stats }))
}

fn analytics_dashboard(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let scope = parse_scope(params)?;
    let students = store::list_students(conn, &scope)?;
    Ok(json!({ "scope": scope.label(), "dashboard": calc::dashboard_summary(students) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "analytics.summary" => analytics_summary(state, &req.params),
        "analytics.dashboard" => analytics_dashboard(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
