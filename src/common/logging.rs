//! Logging and tracing configuration
//!
//! Human-readable progress goes to stdout through the runner; tracing carries
//! diagnostics (including raw WebSocket traffic at debug level) to stderr and,
//! optionally, to a log file.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "meetcheck=info,warn";

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable. When
/// `log_file` is given, a second non-ANSI layer with full details is written
/// there. The returned guard must be held until exit so buffered lines are
/// flushed.
pub fn init_cli(log_file: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("meetcheck=debug,warn")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "meetcheck.log".into());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
    }

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Some(guard)
}

/// Default log file location used by `--log-file` without a value
pub fn default_log_path() -> Option<PathBuf> {
    paths::ensure_log_dir()
        .ok()
        .flatten()
        .map(|d| d.join("meetcheck.log"))
}
