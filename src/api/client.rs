use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ApiError;
use super::request::{ApiRequest, RawResponse, Transport, JSON_CONTENT_TYPE};

/// Backend client enforcing the response contract on top of a [`Transport`].
pub struct ApiClient {
    transport: Box<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn call(&self, req: ApiRequest) -> Result<Value, ApiError> {
        debug!(method = ?req.method, path = %req.path(), "api call");
        let raw = self.transport.send(&req)?;
        let result = interpret(raw);
        if let Err(e) = &result {
            debug!(path = %req.path(), error = %e, "api call failed");
        }
        result
    }

    pub fn call_as<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.call(req)?)?)
    }

    /// `GET /logout` answers with a redirect to HTML, so only transport
    /// failures are worth a log line.
    pub fn logout(&self) {
        if let Err(e) = self.transport.send(&ApiRequest::get(["logout"])) {
            warn!(error = %e, "logout request failed");
        }
    }
}

/// Order matters: content type, then 401, then body, then the `error` field.
pub fn interpret(raw: RawResponse) -> Result<Value, ApiError> {
    let is_json = raw
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));
    if !is_json {
        return Err(ApiError::NonJson { status: raw.status });
    }
    if raw.status == 401 {
        return Err(ApiError::Unauthorized);
    }
    let data: Value = serde_json::from_slice(&raw.body)?;
    if let Some(error) = data.get("error").filter(|e| truthy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ApiError::Application(message));
    }
    Ok(data)
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeTransport;
    use super::*;
    use serde_json::json;

    fn client() -> (ApiClient, FakeTransport) {
        let fake = FakeTransport::default();
        (ApiClient::new(Box::new(fake.clone())), fake)
    }

    #[test]
    fn non_json_is_rejected_before_status() {
        let (api, fake) = client();
        fake.reply_html(401);
        let err = api.call(ApiRequest::get(["get_courses"])).unwrap_err();
        assert!(matches!(err, ApiError::NonJson { status: 401 }));
        assert_eq!(err.to_string(), "Server returned non-JSON response (status 401)");
    }

    #[test]
    fn unauthorized_and_error_payloads() {
        let (api, fake) = client();
        fake.reply_json(401, json!({ "error": "Unauthorized" }));
        fake.reply_json(200, json!({ "success": false, "error": "Invalid credentials" }));
        fake.reply_json(200, json!({ "success": true, "error": "" }));

        assert!(matches!(
            api.call(ApiRequest::get(["get_courses"])),
            Err(ApiError::Unauthorized)
        ));
        match api.call(ApiRequest::post(["faculty_login"])) {
            Err(ApiError::Application(m)) => assert_eq!(m, "Invalid credentials"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            api.call(ApiRequest::get(["x"])).unwrap()["success"],
            json!(true)
        );
    }

    #[test]
    fn error_status_with_clean_body_is_success() {
        let (api, fake) = client();
        fake.reply_json(500, json!(["BSc"]));
        let courses: Vec<String> = api.call_as(ApiRequest::get(["get_courses"])).unwrap();
        assert_eq!(courses, vec!["BSc".to_string()]);
    }

    #[test]
    fn logout_ignores_html_redirect() {
        let (api, fake) = client();
        fake.reply_html(200);
        api.logout();
        assert_eq!(fake.paths(), vec!["/logout".to_string()]);
    }

    #[test]
    fn falsy_error_values_pass() {
        for v in [json!(null), json!(false), json!(0), json!("")] {
            assert!(!truthy(&v));
        }
        for v in [json!(true), json!(1), json!("x"), json!({}), json!([])] {
            assert!(truthy(&v));
        }
    }
}
