use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::dates::MonthKey;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, require_actor, required_obj};
use crate::ipc::types::{AppState, Request};
use crate::model::{FeeStatus, FeeUpdate};
use crate::store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeInput {
    student_id: String,
    status: String,
    month: String,
    year: String,
    #[serde(default)]
    amount: Option<f64>,
}

fn to_updates(
    inputs: Vec<FeeInput>,
    marked_by: &str,
    marked_by_name: &str,
) -> Result<Vec<FeeUpdate>, HandlerErr> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let status = FeeStatus::parse(&input.status).ok_or_else(|| {
                HandlerErr::bad_params("status must be Paid or Pending")
                    .with_details(json!({ "index": i, "status": input.status }))
            })?;
            let month = MonthKey::from_parts(&input.month, &input.year).ok_or_else(|| {
                HandlerErr::bad_params("month must be MM and year YYYY")
                    .with_details(json!({ "index": i, "month": input.month, "year": input.year }))
            })?;
            if let Some(a) = input.amount {
                if !a.is_finite() || a < 0.0 {
                    return Err(HandlerErr::bad_params("amount must be a non-negative number")
                        .with_details(json!({ "index": i })));
                }
            }
            Ok(FeeUpdate {
                student_id: input.student_id,
                status,
                month: month.month_str(),
                year: month.year_str(),
                amount: input.amount,
                marked_by: Some(marked_by.to_string()),
                marked_by_name: Some(marked_by_name.to_string()),
            })
        })
        .collect()
}

fn fees_save(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = require_actor(state)?;
    let inputs: Vec<FeeInput> = required_obj(params, "records")?;
    let requested = inputs.len();
    let updates = to_updates(inputs, &actor.uid, &actor.name)?;

    let written = store::save_fee_payments(db_conn(state)?, &updates, state.now())?;
    info!(requested, written, by = %actor.uid, "fee payments saved");
    Ok(json!({ "requested": requested, "written": written }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "fees.save" => Some(match fees_save(state, &req.params) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
