use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiError, ApiRequest};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_str, str_or_empty};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request, Role, User};
use crate::model::LoginReply;
use crate::nav::{Event, Page, Selectors, Step};

use super::navigation::go;

const FACULTY_LOGIN_ERROR: &str = "facultyLoginError";
const STUDENT_LOGIN_ERROR: &str = "studentLoginError";
const STUDENT_LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

fn handle_faculty_login(state: &mut AppState, req: &Request) -> HandlerResult {
    let user_id = str_or_empty(&req.params, "userId");
    let password = str_or_empty(&req.params, "password");
    let account_type = optional_str(&req.params, "accountType")
        .unwrap_or_else(|| "main".to_string())
        .to_lowercase();

    let reply: LoginReply = state
        .api
        .call_as(ApiRequest::post(["faculty_login"]).json(json!({
            "userId": user_id,
            "password": password,
            "accountType": account_type,
        })))
        .map_err(|e| HandlerErr::from(e).with_target(FACULTY_LOGIN_ERROR))?;
    if !reply.success {
        return Err(HandlerErr::app("Login failed", FACULTY_LOGIN_ERROR));
    }

    // The server's role wins over the requested account type.
    let role = match reply.role.as_deref() {
        Some("secondary") => Role::Secondary,
        Some(_) => Role::Faculty,
        None if account_type == "secondary" => Role::Secondary,
        None => Role::Faculty,
    };
    info!(user = %user_id, ?role, "faculty logged in");
    state.user = Some(User { role, user_id });
    go(state, Page::FacultyDashboard, Some(Step::Course), Selectors::default())
}

fn handle_student_login(state: &mut AppState, req: &Request) -> HandlerResult {
    let roll_number = str_or_empty(&req.params, "rollNumber");
    let email = str_or_empty(&req.params, "email");
    let password = str_or_empty(&req.params, "password");

    let reply = state.api.call_as::<LoginReply>(
        ApiRequest::post(["student_login"]).json(json!({
            "rollNumber": roll_number,
            "email": email,
            "password": password,
        })),
    );
    match reply {
        Ok(r) if r.success => {}
        Ok(_) => return Err(HandlerErr::app(STUDENT_LOGIN_FAILED, STUDENT_LOGIN_ERROR)),
        Err(ApiError::Application(message)) => {
            return Err(HandlerErr::app(message, STUDENT_LOGIN_ERROR))
        }
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            let mut err = HandlerErr::app(STUDENT_LOGIN_FAILED, STUDENT_LOGIN_ERROR);
            err.details = Some(json!({ "target": STUDENT_LOGIN_ERROR, "cause": e.to_string() }));
            return Err(err);
        }
    }

    info!(roll = %roll_number, "student logged in");
    state.user = Some(User {
        role: Role::Student,
        user_id: roll_number,
    });
    go(state, Page::StudentDashboard, None, Selectors::default())
}

/// Best effort on the server side; the local reset always happens.
fn handle_logout(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.api.logout();
    if let Some(user) = &state.user {
        info!(user = %user.user_id, "logged out");
    }
    state.fire(Event::Logout)?;
    state.clear_session();
    Ok(Value::Null)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "auth.facultyLogin" => Some(handle_faculty_login(state, req)),
        "auth.studentLogin" => Some(handle_student_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        _ => None,
    }
}
