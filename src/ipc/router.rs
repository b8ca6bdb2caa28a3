use serde_json::{json, Value};
use tracing::{debug, warn};

use super::error::{err, ok, HandlerErr};
use super::handlers;
use super::types::{AppState, Request};

pub type HandlerResult = Result<Value, HandlerErr>;

fn dispatch(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::navigation::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::auth::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::hierarchy::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::students::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::activities::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::secondary_admins::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::certificates::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::scrutiny::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::attendance::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::student_portal::try_handle(state, req) {
        return Some(resp);
    }
    if let Some(resp) = handlers::messaging::try_handle(state, req) {
        return Some(resp);
    }
    None
}

pub fn handle_request(state: &mut AppState, req: Request) -> Value {
    debug!(id = %req.id, method = %req.method, "request");
    let Some(outcome) = dispatch(state, &req) else {
        return err(
            &req.id,
            "not_implemented",
            format!("unknown method: {}", req.method),
            None,
        );
    };

    match outcome {
        Ok(data) => ok(
            &req.id,
            json!({
                "data": data,
                "view": state.view_json(),
                "history": state.take_history(),
            }),
        ),
        Err(e) => {
            if e.is_unauthorized() {
                warn!(method = %req.method, "backend rejected session; logging out");
                state.api.logout();
                state.reset_session();
            } else {
                debug!(method = %req.method, code = e.code, message = %e.message, "request failed");
            }
            let extra = json!({
                "view": state.view_json(),
                "history": state.take_history(),
            });
            e.response(&req.id, extra)
        }
    }
}
