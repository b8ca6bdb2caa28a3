use std::time::Duration;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tracing::debug;

use super::error::ApiError;
use super::request::{ApiRequest, Body, Method, Part, RawResponse, Transport};

/// Blocking HTTP transport. Keeps the backend's session cookie and never
/// times out a request.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

fn transport_err(e: impl std::fmt::Display) -> ApiError {
    ApiError::Transport(e.to_string())
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url {base_url}: {e}")))?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(None::<Duration>)
            .build()
            .map_err(transport_err)?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

fn form(parts: &[Part]) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name.clone(), value.clone()),
            Part::File { name, path } => form.file(name.clone(), path).map_err(|e| {
                ApiError::Transport(format!("cannot attach {}: {e}", path.display()))
            })?,
        };
    }
    Ok(form)
}

impl Transport for HttpTransport {
    fn send(&self, req: &ApiRequest) -> Result<RawResponse, ApiError> {
        let url = req.url(&self.base)?;
        debug!(%url, "http request");
        let mut builder = match req.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(ct) = req.content_type() {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder = match &req.body {
            Body::Empty => builder,
            Body::Json(v) => builder.body(serde_json::to_vec(v)?),
            Body::Multipart(parts) => builder.multipart(form(parts)?),
        };

        let resp = builder.send().map_err(transport_err)?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().map_err(transport_err)?.to_vec();
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
