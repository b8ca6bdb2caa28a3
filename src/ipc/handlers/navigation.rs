use serde_json::{json, Value};
use tracing::warn;

use crate::api::ApiRequest;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};
use crate::nav::{self, Event, HistoryEntry, Page, Selectors, Step, Tab};

use super::{activities, secondary_admins, student_portal, students};

/// Data the current view renders. Faculty steps list the next level down;
/// the students step loads whatever its tab shows.
pub fn load_for_view(state: &mut AppState) -> HandlerResult {
    let sel = state.view.selection.clone();
    match (state.view.page, state.view.step) {
        (Page::FacultyDashboard, Some(Step::Course)) | (Page::FacultyDashboard, None) => {
            let courses = state.api.call(ApiRequest::get(["get_courses"]))?;
            Ok(json!({ "courses": courses }))
        }
        (Page::FacultyDashboard, Some(Step::Year)) => {
            let course = sel.course.unwrap_or_default();
            let years = state.api.call(ApiRequest::get(["get_years", course.as_str()]))?;
            Ok(json!({ "years": years }))
        }
        (Page::FacultyDashboard, Some(Step::Section)) => {
            let course = sel.course.unwrap_or_default();
            let year = sel.year.unwrap_or_default();
            let sections = state.api.call(ApiRequest::get([
                "get_sections",
                course.as_str(),
                year.as_str(),
            ]))?;
            Ok(json!({ "sections": sections }))
        }
        (Page::FacultyDashboard, Some(Step::Students)) => load_tab(state),
        (Page::StudentDashboard, _) => student_portal::profile(state),
        _ => Ok(Value::Null),
    }
}

fn load_tab(state: &mut AppState) -> HandlerResult {
    match state.view.tab.unwrap_or(Tab::Students) {
        Tab::Students | Tab::Messages => Ok(json!({ "students": students::list(state)? })),
        Tab::Activities => Ok(json!({ "activities": activities::list(state)? })),
        Tab::SecondaryAdmins => Ok(json!({ "secondaryAdmins": secondary_admins::list(state)? })),
    }
}

/// Loads the new view's data. The navigation itself stands even when the
/// load fails; only a rejected session is escalated.
pub fn after_navigation(state: &mut AppState) -> HandlerResult {
    match load_for_view(state) {
        Ok(data) => Ok(data),
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            warn!(
                page = ?state.view.page,
                step = ?state.view.step,
                code = e.code,
                "view data failed to load"
            );
            Ok(json!({
                "loadError": { "code": e.code, "message": e.message, "details": e.details }
            }))
        }
    }
}

pub fn go(
    state: &mut AppState,
    page: Page,
    step: Option<Step>,
    selectors: Selectors,
) -> HandlerResult {
    let t = nav::navigate_to(&state.view, page, step, selectors)?;
    state.apply(t);
    after_navigation(state)
}

fn parse_enum<T: serde::de::DeserializeOwned>(
    params: &Value,
    key: &str,
) -> Result<Option<T>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|_| HandlerErr::bad_params(format!("invalid {}: {}", key, v))),
    }
}

/// History state handed back by the host. Anything unreadable is treated as
/// no state at all.
pub fn parse_entry(v: Option<&Value>) -> Option<HistoryEntry> {
    let v = v.filter(|v| !v.is_null())?;
    match serde_json::from_value(v.clone()) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(error = %e, "unreadable history state");
            None
        }
    }
}

fn handle_navigate_to(state: &mut AppState, req: &Request) -> HandlerResult {
    let page: Page = parse_enum(&req.params, "page")?
        .ok_or_else(|| HandlerErr::bad_params("missing page"))?;
    let step: Option<Step> = parse_enum(&req.params, "step")?;
    let selectors = Selectors {
        course: optional_str(&req.params, "course"),
        year: optional_str(&req.params, "year"),
        section: optional_str(&req.params, "section"),
    };
    go(state, page, step, selectors)
}

fn handle_select_course(state: &mut AppState, req: &Request) -> HandlerResult {
    let course = required_str(&req.params, "course")?;
    go(state, Page::FacultyDashboard, Some(Step::Year), Selectors::course(course))
}

fn handle_select_year(state: &mut AppState, req: &Request) -> HandlerResult {
    let year = required_str(&req.params, "year")?;
    go(state, Page::FacultyDashboard, Some(Step::Section), Selectors::year(year))
}

fn handle_select_section(state: &mut AppState, req: &Request) -> HandlerResult {
    let section = required_str(&req.params, "section")?;
    go(
        state,
        Page::FacultyDashboard,
        Some(Step::Students),
        Selectors::section(section),
    )
}

fn handle_switch_tab(state: &mut AppState, req: &Request) -> HandlerResult {
    let tab: Tab = parse_enum(&req.params, "tab")?
        .ok_or_else(|| HandlerErr::bad_params("missing tab"))?;
    let main_faculty = state.user.as_ref().is_some_and(|u| u.is_main_faculty());
    if tab == Tab::SecondaryAdmins && !main_faculty {
        return Err(HandlerErr::forbidden(
            "secondary admins are managed by the main faculty account",
        ));
    }
    state.fire(Event::SwitchTab(tab))?;
    after_navigation(state)
}

fn handle_back(state: &mut AppState) -> HandlerResult {
    state.fire(Event::Back)?;
    Ok(Value::Null)
}

fn handle_history_pop(state: &mut AppState, req: &Request) -> HandlerResult {
    let entry = parse_entry(req.params.get("state"));
    state.fire(Event::Replay(entry))?;
    after_navigation(state)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    let none = Selectors::default;
    match req.method.as_str() {
        "nav.navigateTo" => Some(handle_navigate_to(state, req)),
        "nav.showLanding" => Some(go(state, Page::Landing, None, none())),
        "nav.showFacultyLogin" => Some(go(state, Page::FacultyLogin, None, none())),
        "nav.showStudentLogin" => Some(go(state, Page::StudentLogin, None, none())),
        "nav.showFacultyDashboard" => Some(go(
            state,
            Page::FacultyDashboard,
            Some(Step::Course),
            none(),
        )),
        "nav.showStudentDashboard" => Some(go(state, Page::StudentDashboard, None, none())),
        "nav.selectCourse" => Some(handle_select_course(state, req)),
        "nav.selectYear" => Some(handle_select_year(state, req)),
        "nav.selectSection" => Some(handle_select_section(state, req)),
        "nav.switchTab" => Some(handle_switch_tab(state, req)),
        "nav.back" | "nav.backToCourses" | "nav.backToYears" | "nav.backToSections" => {
            Some(handle_back(state))
        }
        "nav.refresh" => Some(load_for_view(state)),
        "history.pop" => Some(handle_history_pop(state, req)),
        _ => None,
    }
}
