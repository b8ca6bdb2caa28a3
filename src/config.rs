//! Command line and environment configuration.

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "trackd",
    version,
    about = "Student Track Recorder portal controller (JSON lines on stdin/stdout)"
)]
pub struct Config {
    /// Backend the portal talks to.
    #[arg(
        long = "base-url",
        env = "TRACKD_BASE_URL",
        default_value = "http://127.0.0.1:5000/"
    )]
    pub base_url: String,

    /// Log filter directives, e.g. `info` or `trackd=debug`.
    #[arg(long = "log", env = "TRACKD_LOG", default_value = "info")]
    pub log: String,
}

/// Logs go to stderr; stdout carries responses.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
