//! Student dashboard: profile, self service, attendance calendar and disputes.

use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api::{ApiRequest, Part};
use crate::calendar::{AttendanceDetail, AttendanceView, DisputeDraft, Summary};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_str, require_student, required_str};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};
use crate::model::{upload_url, StudentData};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn student_data(state: &mut AppState) -> Result<StudentData, HandlerErr> {
    Ok(state.api.call_as(ApiRequest::get(["student_data"]))?)
}

pub fn profile(state: &mut AppState) -> HandlerResult {
    let data = student_data(state)?;
    Ok(json!({
        "student": data.student,
        "photoUrl": upload_url(data.photo()),
        "activities": data.activities,
        "course": data.course,
        "year": data.year,
        "section": data.section,
    }))
}

fn handle_profile(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    profile(state)
}

fn handle_activities(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let data = student_data(state)?;
    Ok(json!({ "activities": data.activities }))
}

/// Photo and password changes. A new password needs the current one.
fn handle_self_update(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let photo = optional_str(&req.params, "photoPath");
    let new_password = optional_str(&req.params, "newPassword");
    let current_password = optional_str(&req.params, "currentPassword");

    if photo.is_none() && new_password.is_none() {
        return Err(HandlerErr::bad_params("nothing to update"));
    }
    let mut parts = Vec::new();
    if let Some(photo) = photo {
        parts.push(Part::file("studentPhoto", photo));
    }
    if let Some(new_password) = new_password {
        let Some(current) = current_password else {
            return Err(HandlerErr::bad_params(
                "enter your current password to set a new one",
            ));
        };
        parts.push(Part::text("currentPassword", current));
        parts.push(Part::text("newPassword", new_password));
    }
    let result = state
        .api
        .call(ApiRequest::post(["student_self_update"]).multipart(parts))?;
    let photo_url = result
        .get("student")
        .and_then(|s| s.get("photo"))
        .and_then(Value::as_str)
        .and_then(|p| upload_url(Some(p)));
    Ok(json!({ "result": result, "photoUrl": photo_url }))
}

fn handle_teachers(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let teachers = state.api.call(ApiRequest::get(["student_teachers"]))?;
    Ok(json!({ "teachers": teachers }))
}

fn attendance_subjects(state: &mut AppState) -> Result<Vec<String>, HandlerErr> {
    let raw: Option<Vec<String>> = state
        .api
        .call_as(ApiRequest::get(["student_attendance_subjects"]))?;
    Ok(raw.unwrap_or_default())
}

fn attendance_detail(state: &mut AppState, subject: &str) -> Result<AttendanceDetail, HandlerErr> {
    Ok(state.api.call_as(
        ApiRequest::get(["student_attendance_records"])
            .query("subject", subject)
            .query("detailed", "1"),
    )?)
}

/// One row per subject. A subject whose records fail to load counts as zero.
fn handle_attendance_summary(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let subjects = attendance_subjects(state)?;
    let mut rows = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let summary = match attendance_detail(state, &subject) {
            Ok(detail) => Summary::of(&detail),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!(%subject, code = e.code, "attendance records failed to load");
                Summary::zero()
            }
        };
        rows.push(json!({ "subject": subject, "summary": summary }));
    }
    Ok(json!({ "rows": rows }))
}

fn calendar_json(view: &AttendanceView) -> Value {
    json!({
        "subject": view.subject,
        "grid": view.grid(),
        "hasAny": !view.detail.present.is_empty() || !view.detail.absent.is_empty(),
    })
}

fn handle_attendance_open(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let subjects = attendance_subjects(state)?;
    let chosen = optional_str(&req.params, "subject").or_else(|| subjects.first().cloned());
    let Some(subject) = chosen else {
        state.attendance = None;
        return Ok(json!({ "subjects": subjects, "calendar": null }));
    };
    let detail = attendance_detail(state, &subject)?;
    let view = AttendanceView::open(subject, detail, today());
    debug!(subject = %view.subject, month = ?view.month, "attendance calendar opened");
    let calendar = calendar_json(&view);
    state.attendance = Some(view);
    Ok(json!({ "subjects": subjects, "calendar": calendar }))
}

fn handle_attendance_month(state: &mut AppState, forward: bool) -> HandlerResult {
    let view = state
        .attendance
        .as_mut()
        .ok_or_else(|| HandlerErr::no_selection("attendance calendar is not open"))?;
    view.month = if forward {
        view.month.next()
    } else {
        view.month.prev()
    };
    Ok(json!({ "calendar": calendar_json(view) }))
}

fn dispute_json(draft: &DisputeDraft) -> Value {
    json!({
        "subject": draft.subject,
        "grid": draft.grid(),
        "dates": draft.dates,
    })
}

fn handle_dispute_open(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let subjects = attendance_subjects(state)?;
    let mut draft = DisputeDraft::new(today());
    draft.subject = optional_str(&req.params, "subject").or_else(|| subjects.first().cloned());
    let out = dispute_json(&draft);
    state.dispute = Some(draft);
    Ok(json!({ "subjects": subjects, "dispute": out }))
}

fn with_draft(
    state: &mut AppState,
    f: impl FnOnce(&mut DisputeDraft) -> Result<(), HandlerErr>,
) -> HandlerResult {
    let draft = state
        .dispute
        .as_mut()
        .ok_or_else(|| HandlerErr::no_selection("dispute form is not open"))?;
    f(draft)?;
    Ok(json!({ "dispute": dispute_json(draft) }))
}

fn handle_dispute_submit(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let description = req
        .params
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let submission = state
        .dispute
        .as_ref()
        .and_then(|d| d.submission(description))
        .ok_or_else(|| {
            HandlerErr::bad_params(
                "Please select subject, at least one date and enter a description.",
            )
        })?;
    let body = serde_json::to_value(&submission)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    let result = state
        .api
        .call(ApiRequest::post(["student_attendance_issue"]).json(body))?;
    state.dispute = None;
    Ok(json!({ "result": result }))
}

fn handle_dispute_list(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let subject = required_str(&req.params, "subject")?;
    let issues = state
        .api
        .call(ApiRequest::get(["student_attendance_issues"]).query("subject", subject))?;
    Ok(json!({ "issues": issues }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "student.profile" => Some(handle_profile(state, req)),
        "student.activities" => Some(handle_activities(state, req)),
        "student.selfUpdate" => Some(handle_self_update(state, req)),
        "student.teachers" => Some(handle_teachers(state, req)),
        "studentAttendance.summary" => Some(handle_attendance_summary(state, req)),
        "studentAttendance.open" => Some(handle_attendance_open(state, req)),
        "studentAttendance.prevMonth" => Some(handle_attendance_month(state, false)),
        "studentAttendance.nextMonth" => Some(handle_attendance_month(state, true)),
        "dispute.open" => Some(handle_dispute_open(state, req)),
        "dispute.setSubject" => {
            let subject = optional_str(&req.params, "subject");
            Some(with_draft(state, |d| {
                d.subject = subject;
                Ok(())
            }))
        }
        "dispute.toggleDate" => {
            let date = required_str(&req.params, "date");
            Some(with_draft(state, |d| {
                d.toggle(&date?);
                Ok(())
            }))
        }
        "dispute.prevMonth" => Some(with_draft(state, |d| {
            d.month = d.month.prev();
            Ok(())
        })),
        "dispute.nextMonth" => Some(with_draft(state, |d| {
            d.month = d.month.next();
            Ok(())
        })),
        "dispute.submit" => Some(handle_dispute_submit(state, req)),
        "dispute.list" => Some(handle_dispute_list(state, req)),
        _ => None,
    }
}
