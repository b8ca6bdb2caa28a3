use serde_json::{json, Value};

use crate::api::ApiError;
use crate::nav::NavError;

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn no_selection(message: impl Into<String>) -> Self {
        Self::new("no_selection", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("forbidden", message)
    }

    /// Failure the host shows inline in a form's error element.
    pub fn app(message: impl Into<String>, target: &str) -> Self {
        Self {
            code: "app_error",
            message: message.into(),
            details: Some(json!({ "target": target })),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == "unauthorized"
    }

    /// Points an application error at a form's error element.
    pub fn with_target(mut self, target: &str) -> Self {
        if self.code == "app_error" {
            self.details = Some(json!({ "target": target }));
        }
        self
    }

    pub fn response(self, id: &str, extra: Value) -> Value {
        let mut details = self.details.unwrap_or_else(|| json!({}));
        if let (Some(d), Value::Object(extra)) = (details.as_object_mut(), extra) {
            d.extend(extra);
        }
        err(id, self.code, self.message, Some(details))
    }
}

impl From<ApiError> for HandlerErr {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized => HandlerErr::new("unauthorized", e.to_string()),
            ApiError::Application(message) => HandlerErr {
                code: "app_error",
                message,
                details: Some(json!({ "target": null })),
            },
            ApiError::Transport(_) | ApiError::NonJson { .. } | ApiError::Parse(_) => HandlerErr {
                code: "api_error",
                message: e.to_string(),
                details: Some(json!({ "title": "API Error" })),
            },
        }
    }
}

impl From<NavError> for HandlerErr {
    fn from(e: NavError) -> Self {
        match e {
            NavError::MissingSelector { .. } => HandlerErr::no_selection(e.to_string()),
            NavError::StepOutsideDashboard(_) | NavError::NoTabs => {
                HandlerErr::bad_params(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_codes() {
        let e = HandlerErr::from(ApiError::NonJson { status: 502 });
        assert_eq!(e.code, "api_error");
        assert_eq!(e.details, Some(json!({ "title": "API Error" })));

        let e = HandlerErr::from(ApiError::Application("Course already exists".into()))
            .with_target("facultyLoginError");
        assert_eq!(e.details, Some(json!({ "target": "facultyLoginError" })));

        assert!(HandlerErr::from(ApiError::Unauthorized).is_unauthorized());
    }

    #[test]
    fn response_merges_view_into_details() {
        let resp = HandlerErr::bad_params("missing name")
            .response("7", json!({ "view": { "page": "landing" }, "history": [] }));
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("bad_params"));
        assert_eq!(resp["error"]["details"]["view"]["page"], json!("landing"));
    }
}
