//! Tracing initialization shared by the two binaries.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Log level comes from `RUST_LOG` (default `info`). When `MOSAIC_LOG_DIR`
/// is set, logs additionally roll daily into `{dir}/{binary}.log`; the
/// returned guard must stay alive for the life of the process or buffered
/// lines are lost on exit.
pub fn init_tracing(binary: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var("MOSAIC_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", binary));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
