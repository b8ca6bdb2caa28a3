//! Faculty side of attendance: subjects, per-student records and the
//! disputes students raise against them.

use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::calendar::{count_of, AttendanceDetail, Summary};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    optional_str, require_admin, require_main_faculty, required_str, section_scope, str_list,
};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};

const ISSUE_STATUSES: [&str; 4] = ["open", "accepted", "resolved", "rejected"];
const MARK_STATUSES: [&str; 2] = ["present", "absent"];
const MARK_OPERATIONS: [&str; 3] = ["increment", "decrement", "set"];

fn subjects(state: &mut AppState) -> Result<Value, HandlerErr> {
    let (c, y, s) = section_scope(state)?;
    Ok(state.api.call(ApiRequest::get([
        "attendance",
        "subjects",
        c.as_str(),
        y.as_str(),
        s.as_str(),
    ]))?)
}

fn handle_subjects_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_admin(state)?;
    Ok(json!({ "subjects": subjects(state)? }))
}

fn handle_subjects_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let name = required_str(&req.params, "name")?;
    let result = state.api.call(
        ApiRequest::post(["attendance", "subjects", c.as_str(), y.as_str(), s.as_str()])
            .json(json!({ "name": name })),
    )?;
    Ok(json!({ "result": result, "subjects": subjects(state)? }))
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let name = required_str(&req.params, "name")?;
    let result = state.api.call(ApiRequest::delete([
        "attendance",
        "subjects",
        c.as_str(),
        y.as_str(),
        s.as_str(),
        name.as_str(),
    ]))?;
    Ok(json!({ "result": result, "subjects": subjects(state)? }))
}

fn handle_records_get(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let subject = required_str(&req.params, "subject")?;
    let student_id = required_str(&req.params, "studentId")?;
    let detail: AttendanceDetail = state.api.call_as(
        ApiRequest::get(["attendance", "records", c.as_str(), y.as_str(), s.as_str()])
            .query("subject", subject)
            .query("studentId", student_id)
            .query("detailed", "1"),
    )?;
    Ok(json!({ "summary": Summary::of(&detail), "records": detail }))
}

fn handle_records_mark(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let subject = required_str(&req.params, "subject")?;
    let student_id = required_str(&req.params, "studentId")?;
    let dates: Vec<String> = str_list(&req.params, "dates")
        .into_iter()
        .map(|d| d.chars().take(10).collect())
        .collect();
    if dates.is_empty() {
        return Err(HandlerErr::bad_params("select at least one date"));
    }
    let status = optional_str(&req.params, "status")
        .map(|v| v.to_lowercase())
        .unwrap_or_else(|| "present".to_string());
    if !MARK_STATUSES.contains(&status.as_str()) {
        return Err(HandlerErr::bad_params(format!("invalid status: {}", status)));
    }
    let operation = optional_str(&req.params, "operation")
        .map(|v| v.to_lowercase())
        .unwrap_or_else(|| "increment".to_string());
    if !MARK_OPERATIONS.contains(&operation.as_str()) {
        return Err(HandlerErr::bad_params(format!(
            "invalid operation: {}",
            operation
        )));
    }
    // `set` without a count clears the dates; the other operations step by one.
    let default_count = if operation == "set" { 0 } else { 1 };
    let count = req
        .params
        .get("count")
        .map(count_of)
        .unwrap_or(default_count);

    let result = state.api.call(
        ApiRequest::post(["attendance", "records", c.as_str(), y.as_str(), s.as_str()]).json(
            json!({
                "subject": subject,
                "studentId": student_id,
                "dates": dates,
                "status": status,
                "operation": operation,
                "count": count,
            }),
        ),
    )?;
    Ok(json!({ "result": result }))
}

fn handle_issues_list(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let mut call = ApiRequest::get(["attendance_issues", c.as_str(), y.as_str(), s.as_str()]);
    if let Some(subject) = optional_str(&req.params, "subject") {
        call = call.query("subject", subject);
    }
    let issues = state.api.call(call)?;
    Ok(json!({ "issues": issues }))
}

fn handle_issues_update(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let status = required_str(&req.params, "status")?.to_lowercase();
    if !ISSUE_STATUSES.contains(&status.as_str()) {
        return Err(HandlerErr::bad_params(format!("invalid status: {}", status)));
    }
    let mut body = json!({ "status": status });
    if let Some(note) = req.params.get("note").and_then(Value::as_str) {
        body["note"] = json!(note.trim());
    }
    let result = state.api.call(
        ApiRequest::put(["attendance_issues", c.as_str(), y.as_str(), s.as_str(), id.as_str()])
            .json(body),
    )?;
    Ok(json!({ "result": result }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "attendance.subjects.list" => Some(handle_subjects_list(state, req)),
        "attendance.subjects.add" => Some(handle_subjects_add(state, req)),
        "attendance.subjects.delete" => Some(handle_subjects_delete(state, req)),
        "attendance.records.get" => Some(handle_records_get(state, req)),
        "attendance.records.mark" => Some(handle_records_mark(state, req)),
        "attendance.issues.list" => Some(handle_issues_list(state, req)),
        "attendance.issues.update" => Some(handle_issues_update(state, req)),
        _ => None,
    }
}
