use serde_json::{json, Value};
use tracing::info;

use crate::api::ApiRequest;
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, Request};
use crate::model::Whoami;
use crate::nav::{Event, Page};

use super::navigation::{after_navigation, parse_entry};

fn handle_health(_state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// First call from the host after it loads. Adopts the host's current
/// history state, or replaces it with one for the page it shows.
fn handle_app_init(state: &mut AppState, req: &Request) -> HandlerResult {
    let existing = parse_entry(req.params.get("state"));
    let active = req
        .params
        .get("activePage")
        .and_then(Value::as_str)
        .and_then(Page::from_container_id);
    info!(has_state = existing.is_some(), ?active, "host initialized");
    state.fire(Event::Init { existing, active })?;
    after_navigation(state)
}

fn handle_session_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "user": state.user,
        "chat": state.chat,
    }))
}

fn handle_whoami(state: &mut AppState, _req: &Request) -> HandlerResult {
    let who: Whoami = state.api.call_as(ApiRequest::get(["whoami"]))?;
    Ok(serde_json::to_value(who).unwrap_or(Value::Null))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "app.init" => Some(handle_app_init(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        "session.whoami" => Some(handle_whoami(state, req)),
        _ => None,
    }
}
