//! Tracing configuration and log routing.
//!
//! The server logs to stdout with a compact formatter and, when possible, to a
//! file as well. `RINGKAS_LOG_FILE` selects an explicit log path; otherwise a
//! rolling file is created under `logs/ringkas.log`. File output goes through a
//! non-blocking writer so request handlers never stall on log I/O.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// Respects `RUST_LOG` for filtering (defaults to `info`). The non-blocking
/// writer guard lives in a global so the file layer stays alive for the whole
/// process.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match configure_file_writer() {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when neither the explicit log file nor the default logs
/// directory can be opened.
fn configure_file_writer() -> Option<NonBlocking> {
    let (non_blocking, guard) = if let Ok(path) = std::env::var("RINGKAS_LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| eprintln!("Failed to open log file {path}: {err}"))
            .ok()?;
        tracing_appender::non_blocking(file)
    } else {
        std::fs::create_dir_all("logs")
            .map_err(|err| eprintln!("Failed to create logs directory: {err}"))
            .ok()?;
        let appender = tracing_appender::rolling::never("logs", "ringkas.log");
        tracing_appender::non_blocking(appender)
    };

    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
