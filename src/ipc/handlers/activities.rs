use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    optional_str, require_admin, required_str, section_scope, str_list, str_or_empty,
};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};
use crate::nav::Event;

use super::students::now_iso;

pub fn list(state: &mut AppState) -> Result<Value, HandlerErr> {
    let (c, y, s) = section_scope(state)?;
    Ok(state.api.call(ApiRequest::get([
        "get_activities",
        c.as_str(),
        y.as_str(),
        s.as_str(),
    ]))?)
}

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "activities": list(state)? }))
}

fn handle_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let name = required_str(&req.params, "name")?;
    let details = str_or_empty(&req.params, "details");
    let result = state.api.call(
        ApiRequest::post(["add_activity", c.as_str(), y.as_str(), s.as_str()]).json(json!({
            "name": name,
            "details": details,
            "createdAt": now_iso(),
        })),
    )?;
    Ok(json!({ "result": result, "activities": list(state)? }))
}

fn handle_edit(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let name = required_str(&req.params, "name")?;
    let details = str_or_empty(&req.params, "details");
    let result = state.api.call(
        ApiRequest::put(["edit_activity", c.as_str(), y.as_str(), s.as_str(), id.as_str()])
            .json(json!({ "name": name, "details": details })),
    )?;
    Ok(json!({ "result": result, "activities": list(state)? }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let result = state.api.call(ApiRequest::delete([
        "delete_activity",
        c.as_str(),
        y.as_str(),
        s.as_str(),
        id.as_str(),
    ]))?;
    Ok(json!({ "result": result, "activities": list(state)? }))
}

/// Opening the assign form selects the student it is for.
fn handle_open_assign(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let student = required_str(&req.params, "studentId")?;
    let activities = list(state)?;
    state.fire(Event::SelectStudent(Some(student)))?;
    Ok(json!({ "activities": activities }))
}

fn handle_assign(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let student = state
        .view
        .selection
        .selected_student
        .clone()
        .ok_or_else(|| HandlerErr::no_selection("no student selected"))?;
    let activities = str_list(&req.params, "activities");
    let remarks = optional_str(&req.params, "remarks").unwrap_or_default();
    let result = state.api.call(
        ApiRequest::post([
            "assign_activities",
            c.as_str(),
            y.as_str(),
            s.as_str(),
            student.as_str(),
        ])
        .json(json!({ "activities": activities, "remarks": remarks })),
    )?;
    state.fire(Event::SelectStudent(None))?;
    Ok(json!({ "result": result }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "activities.list" => Some(handle_list(state, req)),
        "activities.add" => Some(handle_add(state, req)),
        "activities.edit" => Some(handle_edit(state, req)),
        "activities.delete" => Some(handle_delete(state, req)),
        "activities.openAssign" => Some(handle_open_assign(state, req)),
        "activities.assign" => Some(handle_assign(state, req)),
        _ => None,
    }
}
