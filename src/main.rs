mod api;
mod calendar;
mod config;
mod ipc;
mod model;
mod nav;

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let config = config::Config::parse();
    config::init_logging(&config);

    let transport = api::HttpTransport::new(&config.base_url)
        .with_context(|| format!("cannot use backend {}", config.base_url))?;
    info!(base = %transport.base(), "trackd ready");
    let mut state = ipc::AppState::new(api::ApiClient::new(Box::new(transport)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                let id = serde_json::from_str::<serde_json::Value>(&line)
                    .ok()
                    .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
                    .unwrap_or_default();
                ipc::err(&id, "bad_json", e.to_string(), None)
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed, exiting");
    Ok(())
}
