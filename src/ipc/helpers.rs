use serde_json::Value;

use super::error::HandlerErr;
use super::types::{AppState, Role, User};

/// Trimmed string param; blank counts as missing.
pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    optional_str(params, key).ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn str_or_empty(params: &Value, key: &str) -> String {
    optional_str(params, key).unwrap_or_default()
}

pub fn str_list(params: &Value, key: &str) -> Vec<String> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Course, year and section of the open section.
pub fn section_scope(state: &AppState) -> Result<(String, String, String), HandlerErr> {
    state
        .view
        .selection
        .section_scope()
        .map(|(c, y, s)| (c.to_string(), y.to_string(), s.to_string()))
        .ok_or_else(|| HandlerErr::no_selection("select a course, year and section first"))
}

pub fn require_user(state: &AppState) -> Result<&User, HandlerErr> {
    state
        .user
        .as_ref()
        .ok_or_else(|| HandlerErr::forbidden("not logged in"))
}

pub fn require_admin(state: &AppState) -> Result<&User, HandlerErr> {
    let user = require_user(state)?;
    if !user.is_admin() {
        return Err(HandlerErr::forbidden("faculty only"));
    }
    Ok(user)
}

pub fn require_main_faculty(state: &AppState) -> Result<&User, HandlerErr> {
    let user = require_user(state)?;
    if !user.is_main_faculty() {
        return Err(HandlerErr::forbidden("main faculty only"));
    }
    Ok(user)
}

pub fn require_student(state: &AppState) -> Result<&User, HandlerErr> {
    let user = require_user(state)?;
    if user.role != Role::Student {
        return Err(HandlerErr::forbidden("students only"));
    }
    Ok(user)
}
