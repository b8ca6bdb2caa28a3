use serde_json::{json, Value};

use crate::api::{ApiRequest, Part};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{require_admin, require_student, required_str, section_scope};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};

fn list_for(state: &mut AppState, student_id: &str) -> Result<Value, HandlerErr> {
    let (c, y, s) = section_scope(state)?;
    Ok(state.api.call(
        ApiRequest::get(["certificates", c.as_str(), y.as_str(), s.as_str()])
            .query("studentId", student_id),
    )?)
}

fn handle_list(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let student_id = required_str(&req.params, "studentId")?;
    Ok(json!({ "certificates": list_for(state, &student_id)? }))
}

fn handle_upload(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let student_id = required_str(&req.params, "studentId")?;
    let name = required_str(&req.params, "name")?;
    let file = required_str(&req.params, "filePath")?;
    let result = state.api.call(
        ApiRequest::post(["certificates", c.as_str(), y.as_str(), s.as_str()]).multipart(vec![
            Part::text("studentId", student_id.clone()),
            Part::text("name", name),
            Part::file("certFile", file),
        ]),
    )?;
    Ok(json!({ "result": result, "certificates": list_for(state, &student_id)? }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (c, y, s) = section_scope(state)?;
    let student_id = required_str(&req.params, "studentId")?;
    let cert_id = required_str(&req.params, "certId")?;
    let result = state.api.call(
        ApiRequest::delete([
            "certificates",
            c.as_str(),
            y.as_str(),
            s.as_str(),
            cert_id.as_str(),
        ])
        .query("studentId", student_id.as_str()),
    )?;
    Ok(json!({ "result": result, "certificates": list_for(state, &student_id)? }))
}

fn handle_student_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let certs = state.api.call(ApiRequest::get(["student_certificates"]))?;
    Ok(json!({ "certificates": certs }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "certificates.list" => Some(handle_list(state, req)),
        "certificates.upload" => Some(handle_upload(state, req)),
        "certificates.delete" => Some(handle_delete(state, req)),
        "studentCertificates.list" => Some(handle_student_list(state, req)),
        _ => None,
    }
}
