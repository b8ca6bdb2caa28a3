use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::api::{ApiRequest, Part};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_str, require_admin, required_str, section_scope, str_or_empty};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};
use crate::nav::Event;

const STUDENT_FIELDS: [&str; 9] = [
    "name",
    "rollNumber",
    "email",
    "phone",
    "fatherName",
    "fatherPhone",
    "motherName",
    "motherPhone",
    "secretPassword",
];

/// `createdAt` stamp in the same shape browsers produce.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let (c, y, s) = section_scope(state)?;
    Ok(state.api.call(ApiRequest::get([
        "get_students",
        c.as_str(),
        y.as_str(),
        s.as_str(),
    ]))?)
}

fn student_parts(params: &Value) -> Result<Vec<Part>, HandlerErr> {
    required_str(params, "name")?;
    required_str(params, "rollNumber")?;
    let mut parts: Vec<Part> = STUDENT_FIELDS
        .iter()
        .map(|f| Part::text(f, str_or_empty(params, f)))
        .collect();
    if let Some(photo) = optional_str(params, "photoPath") {
        parts.push(Part::file("studentPhoto", photo));
    }
    Ok(parts)
}

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "students": list(state)? }))
}

fn handle_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let mut parts = student_parts(&req.params)?;
    parts.insert(STUDENT_FIELDS.len(), Part::text("createdAt", now_iso()));
    let result = state.api.call(
        ApiRequest::post(["add_student", c.as_str(), y.as_str(), s.as_str()]).multipart(parts),
    )?;
    Ok(json!({ "result": result, "students": list(state)? }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let parts = student_parts(&req.params)?;
    let result = state.api.call(
        ApiRequest::put(["edit_student", c.as_str(), y.as_str(), s.as_str(), id.as_str()])
            .multipart(parts),
    )?;
    Ok(json!({ "result": result, "students": list(state)? }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let result = state.api.call(ApiRequest::delete([
        "delete_student",
        c.as_str(),
        y.as_str(),
        s.as_str(),
        id.as_str(),
    ]))?;
    Ok(json!({ "result": result, "students": list(state)? }))
}

fn handle_select(state: &mut AppState, req: &Request) -> HandlerResult {
    let student = optional_str(&req.params, "studentId");
    state.fire(Event::SelectStudent(student))?;
    Ok(Value::Null)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.add" => Some(handle_add(state, req)),
        "students.edit" => Some(handle_edit(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        "students.select" => Some(handle_select(state, req)),
        _ => None,
    }
}
