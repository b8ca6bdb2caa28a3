#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

/// One request as the backend saw it. Header names are lowercased.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is json")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
    set_cookie: Option<String>,
}

impl Reply {
    fn empty_list() -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: "[]".to_string(),
            set_cookie: None,
        }
    }
}

#[derive(Default)]
struct Shared {
    routes: HashMap<String, Reply>,
    requests: Vec<Recorded>,
}

type SharedState = Arc<Mutex<Shared>>;

/// Backend on a random local port, served by axum from its own runtime.
/// Routes are keyed by `METHOD target`, where the target may include the
/// query string; a route without a query matches any query. Unknown routes
/// answer `200 []`.
pub struct FakeBackend {
    pub base: String,
    shared: SharedState,
    _rt: Runtime,
}

/// Catch-all handler: records the request, then answers with the matching
/// route.
async fn record(
    State(shared): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let method = method.as_str().to_string();
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();

    let reply = {
        let mut shared = shared.lock().expect("backend lock");
        let reply = shared
            .routes
            .get(&format!("{} {}", method, target))
            .or_else(|| shared.routes.get(&format!("{} {}", method, uri.path())))
            .cloned();
        shared.requests.push(Recorded {
            method,
            target,
            headers,
            body: body.to_vec(),
        });
        reply.unwrap_or_else(Reply::empty_list)
    };

    let mut builder = Response::builder()
        .status(reply.status)
        .header(header::CONTENT_TYPE, reply.content_type);
    if let Some(cookie) = &reply.set_cookie {
        builder = builder.header(header::SET_COOKIE, cookie.as_str());
    }
    builder
        .body(Body::from(reply.body))
        .expect("fake backend response")
}

impl FakeBackend {
    pub fn start() -> Self {
        let shared: SharedState = Arc::new(Mutex::new(Shared::default()));
        let app = Router::new()
            .fallback(record)
            .with_state(Arc::clone(&shared));
        let rt = Runtime::new().expect("tokio runtime");
        let addr = rt.block_on(async {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind fake backend");
            let addr = listener.local_addr().expect("fake backend addr");
            tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });
            addr
        });
        Self {
            base: format!("http://{addr}/"),
            shared,
            _rt: rt,
        }
    }

    fn route(&self, method: &str, target: &str, reply: Reply) {
        self.shared
            .lock()
            .expect("backend lock")
            .routes
            .insert(format!("{} {}", method, target), reply);
    }

    pub fn json(&self, method: &str, target: &str, status: u16, body: Value) {
        self.route(
            method,
            target,
            Reply {
                status,
                content_type: "application/json",
                body: body.to_string(),
                set_cookie: None,
            },
        );
    }

    pub fn json_with_cookie(&self, method: &str, target: &str, body: Value, cookie: &str) {
        self.route(
            method,
            target,
            Reply {
                status: 200,
                content_type: "application/json",
                body: body.to_string(),
                set_cookie: Some(cookie.to_string()),
            },
        );
    }

    pub fn html(&self, method: &str, target: &str, status: u16) {
        self.route(
            method,
            target,
            Reply {
                status,
                content_type: "text/html; charset=utf-8",
                body: "<!doctype html><title>error</title>".to_string(),
                set_cookie: None,
            },
        );
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.lock().expect("backend lock").requests.clone()
    }

    /// `METHOD target` of every request so far.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.target))
            .collect()
    }

    pub fn last(&self, method: &str, path: &str) -> Recorded {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method && r.path() == path)
            .unwrap_or_else(|| panic!("no {} {} in {:?}", method, path, self.calls()))
    }

    pub fn clear(&self) {
        self.shared.lock().expect("backend lock").requests.clear();
    }
}

pub struct Sidecar {
    pub child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

pub fn spawn_sidecar(base_url: &str) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_trackd");
    let mut child = Command::new(exe)
        .args(["--base-url", base_url, "--log", "warn"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn trackd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

impl Sidecar {
    pub fn send_line(&mut self, line: &str) -> Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    /// Any response except an unknown method.
    pub fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        let value = self.send_line(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let code = value
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            assert_ne!(
                code, "not_implemented",
                "unexpected unknown method for {}",
                method
            );
        }
        value
    }

    /// Successful response; returns its `result`.
    pub fn request_ok(&mut self, method: &str, params: Value) -> Value {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
        value["result"].clone()
    }

    /// Failed response; returns its `error`.
    pub fn request_err(&mut self, method: &str, params: Value) -> Value {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value["error"].clone()
    }

    pub fn shutdown(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}

pub fn login_faculty(sidecar: &mut Sidecar, backend: &FakeBackend) -> Value {
    backend.json_with_cookie(
        "POST",
        "/faculty_login",
        json!({ "success": true, "role": "faculty" }),
        "session=fac-1; Path=/; HttpOnly",
    );
    sidecar.request_ok(
        "auth.facultyLogin",
        json!({ "userId": "faculty", "password": "secret" }),
    )
}

/// Logs in as the main faculty account and opens `BSc > 1 > A`.
pub fn open_section(sidecar: &mut Sidecar, backend: &FakeBackend) -> Value {
    login_faculty(sidecar, backend);
    sidecar.request_ok("nav.selectCourse", json!({ "course": "BSc" }));
    sidecar.request_ok("nav.selectYear", json!({ "year": "1" }));
    sidecar.request_ok("nav.selectSection", json!({ "section": "A" }))
}
