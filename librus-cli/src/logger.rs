//! Tracing subscriber setup

use std::env;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG`, else by `LOG_LEVEL` (default `warn`)
pub fn init_logging() {
    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => {
            let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
            EnvFilter::new(level.to_lowercase())
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
