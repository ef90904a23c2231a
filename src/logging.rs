use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt};

/// Routes `tracing` output to a daily-rotated `airpulse.log` under `dir`.
///
/// Level comes from `RUST_LOG` (default `info`). Keep the returned guard
/// alive until exit or buffered lines are lost.
pub fn setup_logging(dir: &Path) -> WorkerGuard {
    let file_appender = rolling::daily(dir, "airpulse.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_level(true)
        .init();

    guard
}
