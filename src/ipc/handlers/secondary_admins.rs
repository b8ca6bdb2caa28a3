use serde_json::{json, Value};

use crate::api::{ApiRequest, Part};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    optional_str, require_main_faculty, required_str, section_scope, str_list, str_or_empty,
};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};

const ADMIN_FIELDS: [&str; 9] = [
    "name",
    "userId",
    "password",
    "email",
    "phone",
    "fatherName",
    "fatherPhone",
    "motherName",
    "motherPhone",
];

pub fn list(state: &mut AppState) -> Result<Value, HandlerErr> {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    Ok(state.api.call(ApiRequest::get([
        "get_secondary_admins",
        c.as_str(),
        y.as_str(),
        s.as_str(),
    ]))?)
}

/// `subjects` may come as a list or as the raw comma separated text.
fn subjects(params: &Value) -> Result<String, HandlerErr> {
    let joined = match params.get("subjects") {
        Some(Value::Array(_)) => str_list(params, "subjects").join(","),
        _ => str_or_empty(params, "subjects"),
    };
    if joined.is_empty() {
        return Err(HandlerErr::bad_params("Please enter at least one subject."));
    }
    Ok(joined)
}

fn admin_parts(params: &Value) -> Result<Vec<Part>, HandlerErr> {
    required_str(params, "name")?;
    required_str(params, "userId")?;
    let mut parts: Vec<Part> = ADMIN_FIELDS
        .iter()
        .map(|f| Part::text(f, str_or_empty(params, f)))
        .collect();
    if let Some(photo) = optional_str(params, "photoPath") {
        parts.push(Part::file("profPhoto", photo));
    }
    parts.push(Part::text("subjects", subjects(params)?));
    Ok(parts)
}

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "secondaryAdmins": list(state)? }))
}

fn handle_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let parts = admin_parts(&req.params)?;
    let result = state.api.call(
        ApiRequest::post(["add_secondary_admin", c.as_str(), y.as_str(), s.as_str()])
            .multipart(parts),
    )?;
    Ok(json!({ "result": result, "secondaryAdmins": list(state)? }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let parts = admin_parts(&req.params)?;
    let result = state.api.call(
        ApiRequest::put([
            "edit_secondary_admin",
            c.as_str(),
            y.as_str(),
            s.as_str(),
            id.as_str(),
        ])
        .multipart(parts),
    )?;
    Ok(json!({ "result": result, "secondaryAdmins": list(state)? }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let result = state.api.call(ApiRequest::delete([
        "delete_secondary_admin",
        c.as_str(),
        y.as_str(),
        s.as_str(),
        id.as_str(),
    ]))?;
    Ok(json!({ "result": result, "secondaryAdmins": list(state)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "secondaryAdmins.list" => Some(handle_list(state, req)),
        "secondaryAdmins.add" => Some(handle_add(state, req)),
        "secondaryAdmins.edit" => Some(handle_edit(state, req)),
        "secondaryAdmins.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
