//! Courses, years and sections. Each mutation answers with the refreshed list
//! for the level it touched.

use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_str, require_admin, required_str};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};

fn current_course(state: &AppState, req: &Request) -> Result<String, HandlerErr> {
    optional_str(&req.params, "course")
        .or_else(|| state.view.selection.course.clone())
        .ok_or_else(|| HandlerErr::no_selection("select a course first"))
}

fn current_year(state: &AppState, req: &Request) -> Result<(String, String), HandlerErr> {
    let course = current_course(state, req)?;
    let year = optional_str(&req.params, "year")
        .or_else(|| state.view.selection.year.clone())
        .ok_or_else(|| HandlerErr::no_selection("select a year first"))?;
    Ok((course, year))
}

fn list_courses(state: &mut AppState) -> Result<Value, HandlerErr> {
    Ok(state.api.call(ApiRequest::get(["get_courses"]))?)
}

fn list_years(state: &mut AppState, course: &str) -> Result<Value, HandlerErr> {
    Ok(state.api.call(ApiRequest::get(["get_years", course]))?)
}

fn list_sections(state: &mut AppState, course: &str, year: &str) -> Result<Value, HandlerErr> {
    Ok(state
        .api
        .call(ApiRequest::get(["get_sections", course, year]))?)
}

fn handle_courses_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "courses": list_courses(state)? }))
}

fn handle_courses_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let name = required_str(&req.params, "name")?;
    let result = state
        .api
        .call(ApiRequest::post(["add_course"]).json(json!({ "name": name })))?;
    Ok(json!({ "result": result, "courses": list_courses(state)? }))
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let name = required_str(&req.params, "name")?;
    let result = state
        .api
        .call(ApiRequest::get(["delete_course", name.as_str()]))?;
    Ok(json!({ "result": result, "courses": list_courses(state)? }))
}

fn handle_years_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let course = current_course(state, req)?;
    Ok(json!({ "years": list_years(state, &course)? }))
}

fn handle_years_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let course = current_course(state, req)?;
    let name = required_str(&req.params, "name")?;
    let result = state.api.call(
        ApiRequest::post(["add_year", course.as_str()]).json(json!({ "name": name })),
    )?;
    Ok(json!({ "result": result, "years": list_years(state, &course)? }))
}

fn handle_years_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let course = current_course(state, req)?;
    let name = required_str(&req.params, "name")?;
    let result = state
        .api
        .call(ApiRequest::get(["delete_year", course.as_str(), name.as_str()]))?;
    Ok(json!({ "result": result, "years": list_years(state, &course)? }))
}

fn handle_sections_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let (course, year) = current_year(state, req)?;
    Ok(json!({ "sections": list_sections(state, &course, &year)? }))
}

fn handle_sections_add(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (course, year) = current_year(state, req)?;
    let name = required_str(&req.params, "name")?;
    let result = state.api.call(
        ApiRequest::post(["add_section", course.as_str(), year.as_str()])
            .json(json!({ "name": name })),
    )?;
    Ok(json!({ "result": result, "sections": list_sections(state, &course, &year)? }))
}

fn handle_sections_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_admin(state)?;
    let (course, year) = current_year(state, req)?;
    let name = required_str(&req.params, "name")?;
    let result = state.api.call(ApiRequest::get([
        "delete_section",
        course.as_str(),
        year.as_str(),
        name.as_str(),
    ]))?;
    Ok(json!({ "result": result, "sections": list_sections(state, &course, &year)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.add" => Some(handle_courses_add(state, req)),
        "courses.delete" => Some(handle_courses_delete(state, req)),
        "years.list" => Some(handle_years_list(state, req)),
        "years.add" => Some(handle_years_add(state, req)),
        "years.delete" => Some(handle_years_delete(state, req)),
        "sections.list" => Some(handle_sections_list(state, req)),
        "sections.add" => Some(handle_sections_add(state, req)),
        "sections.delete" => Some(handle_sections_delete(state, req)),
        _ => None,
    }
}
