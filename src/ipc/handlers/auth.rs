use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, optional_str, require_actor, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{StaffProfile, UserRole};
use crate::store::{self, ProfileField, DEFAULT_ACADEMY_NAME};

/// Display name for a first sign-in: the provider's name, else the part of
/// the email before `@`.
fn default_name(display_name: Option<&str>, email: &str) -> String {
    match display_name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    }
}

fn load_or_create_profile(
    conn: &Connection,
    uid: &str,
    email: &str,
    display_name: Option<&str>,
    now: &str,
) -> Result<(StaffProfile, bool), HandlerErr> {
    if let Some(existing) = store::get_staff(conn, uid)? {
        let missing_academy = existing
            .academy_name
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true);
        if !missing_academy {
            return Ok((existing, false));
        }
        store::update_staff_field(conn, uid, ProfileField::AcademyName, DEFAULT_ACADEMY_NAME)?;
        info!(uid, "backfilled academy name");
        let refreshed = store::get_staff(conn, uid)?.ok_or(store::StoreError::NotFound("staff member"))?;
        return Ok((refreshed, false));
    }

    let profile = StaffProfile {
        uid: uid.to_string(),
        email: email.to_string(),
        role: UserRole::Coach,
        name: default_name(display_name, email),
        phone_number: None,
        academy_name: Some(DEFAULT_ACADEMY_NAME.to_string()),
        branch_ids: Vec::new(),
        profile_url: None,
    };
    store::insert_staff(conn, &profile, now)?;
    info!(uid, "created default coach profile");
    Ok((profile, true))
}

fn auth_attach(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let uid = required_str(params, "uid")?;
    let email = required_str(params, "email")?;
    let display_name = optional_str(params, "displayName");
    let now = state.now_rfc3339();

    let conn = db_conn(state)?;
    let (profile, created) = load_or_create_profile(conn, &uid, &email, display_name.as_deref(), &now)?;
    let seeded = store::seed_defaults(conn, &now)?;

    info!(uid = %profile.uid, role = profile.role.as_str(), "actor attached");
    state.actor = Some(profile.clone());
    Ok(json!({
        "profile": profile,
        "created": created,
        "seeded": {
            "branchesCreated": seeded.branches_created,
            "sessionsCreated": seeded.sessions_created,
        }
    }))
}

fn handle_auth_attach(state: &mut AppState, req: &Request) -> serde_json::Value {
    match auth_attach(state, &req.params) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_auth_detach(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was = state.actor.take().map(|a| a.uid);
    if let Some(uid) = &was {
        info!(uid = %uid, "actor detached");
    }
    ok(&req.id, json!({ "detached": was.is_some() }))
}

fn handle_auth_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    match require_actor(state) {
        Ok(actor) => ok(&req.id, json!({ "profile": actor })),
        Err(e) => e.response(&req.id),
    }
}

fn update_profile(
    state: &mut AppState,
    params: &serde_json::Value,
    key: &str,
    field: ProfileField,
) -> Result<serde_json::Value, HandlerErr> {
    let value = required_str(params, key)?;
    let uid = require_actor(state)?.uid.clone();
    let conn = db_conn(state)?;
    store::update_staff_field(conn, &uid, field, &value)?;
    let profile = store::get_staff(conn, &uid)?.ok_or(store::StoreError::NotFound("staff member"))?;
    state.actor = Some(profile.clone());
    Ok(json!({ "profile": profile }))
}

fn handle_profile_update(
    state: &mut AppState,
    req: &Request,
    key: &str,
    field: ProfileField,
) -> serde_json::Value {
    match update_profile(state, &req.params, key, field) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.attach" => Some(handle_auth_attach(state, req)),
        "auth.detach" => Some(handle_auth_detach(state, req)),
        "auth.profile" => Some(handle_auth_profile(state, req)),
        "profile.updateName" => Some(handle_profile_update(state, req, "name", ProfileField::Name)),
        "profile.updateAcademyName" => Some(handle_profile_update(
            state,
            req,
            "academyName",
            ProfileField::AcademyName,
        )),
        "profile.updateImage" => Some(handle_profile_update(
            state,
            req,
            "profileUrl",
            ProfileField::ProfileUrl,
        )),
        _ => None,
    }
}
