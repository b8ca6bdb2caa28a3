use serde_json::json;

use crate::api::{ApiRequest, Part};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    optional_str, require_admin, require_student, required_str, section_scope,
};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};

fn handle_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let requests = state
        .api
        .call(ApiRequest::get(["scrutiny", c.as_str(), y.as_str(), s.as_str()]))?;
    Ok(json!({ "requests": requests }))
}

fn handle_review(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let status = optional_str(&req.params, "status").unwrap_or_else(|| "verified".to_string());
    let remark = optional_str(&req.params, "remark").unwrap_or_default();
    let result = state.api.call(
        ApiRequest::put(["scrutiny", c.as_str(), y.as_str(), s.as_str(), id.as_str()])
            .json(json!({ "status": status, "remark": remark })),
    )?;
    Ok(json!({ "result": result }))
}

fn handle_student_submit(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let (Some(file), Some(description)) = (
        optional_str(&req.params, "filePath"),
        optional_str(&req.params, "description"),
    ) else {
        return Err(HandlerErr::bad_params(
            "a document and a description are both required",
        ));
    };
    let result = state.api.call(
        ApiRequest::post(["scrutiny", "student_submit"]).multipart(vec![
            Part::file("file", file),
            Part::text("description", description),
        ]),
    )?;
    Ok(json!({ "result": result }))
}

fn handle_student_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let requests = state.api.call(ApiRequest::get(["student_scrutiny"]))?;
    Ok(json!({ "requests": requests }))
}

fn handle_student_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let id = required_str(&req.params, "id")?;
    let result = state
        .api
        .call(ApiRequest::delete(["scrutiny", "student", id.as_str()]))?;
    let requests = state.api.call(ApiRequest::get(["student_scrutiny"]))?;
    Ok(json!({ "result": result, "requests": requests }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "scrutiny.list" => Some(handle_list(state, req)),
        "scrutiny.review" => Some(handle_review(state, req)),
        "studentScrutiny.submit" => Some(handle_student_submit(state, req)),
        "studentScrutiny.list" => Some(handle_student_list(state, req)),
        "studentScrutiny.delete" => Some(handle_student_delete(state, req)),
        _ => None,
    }
}
