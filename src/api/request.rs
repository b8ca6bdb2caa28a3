use std::path::PathBuf;

use reqwest::Url;
use serde_json::Value;

use super::error::ApiError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

impl Part {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Part::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn file(name: &str, path: impl Into<PathBuf>) -> Self {
        Part::File {
            name: name.to_string(),
            path: path.into(),
        }
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<Part>),
}

/// One backend call. Path segments are kept raw and percent-encoded when the
/// URL is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Post, segments)
    }

    pub fn put<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Put, segments)
    }

    pub fn delete<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Delete, segments)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<Part>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    /// Multipart bodies get their boundary header from the HTTP client.
    pub fn content_type(&self) -> Option<&'static str> {
        match self.body {
            Body::Multipart(_) => None,
            Body::Empty | Body::Json(_) => Some(JSON_CONTENT_TYPE),
        }
    }

    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("base url cannot carry a path: {base}")))?
            .pop_if_empty()
            .extend(&self.segments);
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Encoded path and query, for logs and assertions.
    pub fn path(&self) -> String {
        Url::parse("http://localhost/")
            .ok()
            .and_then(|base| self.url(&base).ok())
            .map(|u| match u.query() {
                Some(q) => format!("{}?{}", u.path(), q),
                None => u.path().to_string(),
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub trait Transport {
    fn send(&self, req: &ApiRequest) -> Result<RawResponse, ApiError>;
}
