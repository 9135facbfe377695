// Logger initialization
// Console output always; a daily rolling file when LOG_DIR is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub const DEFAULT_LOG_FILTER: &str = "doc_sorter=debug,tower_http=debug,axum=debug";

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logger(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let mut guard = None;
    let file_layer = match &config.log_dir {
        Some(log_dir) => match std::fs::create_dir_all(log_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(log_dir, "doc-sorter.log");
                let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
                guard = Some(file_guard);
                Some(fmt::layer().with_writer(file_writer).with_ansi(false))
            }
            Err(err) => {
                eprintln!("Warning: failed to create log directory {}: {}", log_dir.display(), err);
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}
