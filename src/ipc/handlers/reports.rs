use std::path::PathBuf;

use serde_json::json;

use crate::dates;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, optional_str, parse_scope, required_str};
use crate::ipc::types::{AppState, Request};
use crate::report::{self, ContextExport, ReportMode, WorkbookModel};
use crate::store;

use super::analytics::session_names;

fn context_workbook(state: &AppState, params: &serde_json::Value) -> Result<WorkbookModel, HandlerErr> {
    let conn = db_conn(state)?;
    let mode = ReportMode::parse(&required_str(params, "mode")?)?;
    let scope = parse_scope(params)?;
    let context = optional_str(params, "context").unwrap_or_else(|| scope.label());
    let today = state.today();
    let date_key = optional_str(params, "dateKey").unwrap_or_else(|| dates::date_key(today));

    let students = store::list_students(conn, &scope)?;
    let sessions = session_names(conn)?;
    let req = ContextExport {
        mode,
        context: &context,
        date_key: &date_key,
        today,
        session_names: &sessions,
    };
    Ok(report::build_context_workbook(&req, &students)?)
}

fn master_workbook(state: &AppState) -> Result<WorkbookModel, HandlerErr> {
    let students = store::list_students(db_conn(state)?, &Default::default())?;
    Ok(report::build_master_workbook(&students, state.today())?)
}

/// `params.outDir`, else the configured export dir, else `<workspace>/exports`.
fn export_dir(state: &AppState, params: &serde_json::Value) -> Result<PathBuf, HandlerErr> {
    if let Some(dir) = optional_str(params, "outDir") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = &state.config.export_dir {
        return Ok(dir.clone());
    }
    state
        .workspace
        .as_ref()
        .map(|w| w.join("exports"))
        .ok_or_else(|| HandlerErr::friendly("no_workspace"))
}

fn export(state: &AppState, params: &serde_json::Value, model: WorkbookModel) -> Result<serde_json::Value, HandlerErr> {
    let dir = export_dir(state, params)?;
    let path = report::write_workbook(&model, &dir)?;
    let rows: usize = model.sheets.iter().map(|s| s.rows.len()).sum();
    Ok(json!({
        "path": path.to_string_lossy(),
        "fileName": model.file_name,
        "sheets": model.sheets.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
        "rows": rows,
    }))
}

fn dispatch(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let params = &req.params;
    match req.method.as_str() {
        "reports.contextModel" => Ok(json!({ "workbook": context_workbook(state, params)? })),
        "reports.masterModel" => Ok(json!({ "workbook": master_workbook(state)? })),
        "reports.exportContext" => export(state, params, context_workbook(state, params)?),
        "reports.exportMaster" => export(state, params, master_workbook(state)?),
        other => Err(HandlerErr::new("not_implemented", format!("unknown method: {}", other))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.contextModel" | "reports.masterModel" | "reports.exportContext"
        | "reports.exportMaster" => Some(match dispatch(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
