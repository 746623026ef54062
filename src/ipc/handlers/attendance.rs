use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::dates;
use crate::heatmap;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, require_actor, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, AttendanceUpdate};
use crate::store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceInput {
    student_id: String,
    status: String,
    date: String,
}

fn to_updates(
    inputs: Vec<AttendanceInput>,
    marked_by: &str,
    marked_by_name: &str,
) -> Result<Vec<AttendanceUpdate>, HandlerErr> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let status = AttendanceStatus::parse(&input.status).ok_or_else(|| {
                HandlerErr::bad_params("status must be Present or Absent")
                    .with_details(json!({ "index": i, "status": input.status }))
            })?;
            let date = dates::normalize_date_key(&input.date).to_string();
            if !dates::is_date_key(&date) {
                return Err(HandlerErr::bad_params("date must be YYYY-MM-DD")
                    .with_details(json!({ "index": i, "date": input.date })));
            }
            Ok(AttendanceUpdate {
                student_id: input.student_id,
                status,
                date,
                marked_by: marked_by.to_string(),
                marked_by_name: Some(marked_by_name.to_string()),
            })
        })
        .collect()
}

fn attendance_save(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = require_actor(state)?;
    let inputs: Vec<AttendanceInput> = required_obj(params, "records")?;
    let requested = inputs.len();
    let updates = to_updates(inputs, &actor.uid, &actor.name)?;

    let written = store::save_attendance(db_conn(state)?, &updates)?;
    info!(requested, written, by = %actor.uid, "attendance saved");
    Ok(json!({ "requested": requested, "written": written }))
}

fn attendance_heatmap(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = required_str(params, "studentId")?;
    let student = store::get_student(db_conn(state)?, &id)?
        .ok_or(store::StoreError::NotFound("student"))?;
    let grid = heatmap::build_heatmap(&student.attendance_history, &student.joining_date, state.today());
    Ok(json!({
        "studentId": student.id,
        "fullName": student.full_name,
        "heatmap": grid,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.save" => attendance_save(state, &req.params),
        "attendance.heatmap" => attendance_heatmap(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
