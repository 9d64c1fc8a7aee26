use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "scorehawk.log";

/// `<local data dir>/scorehawk/logs`.
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("scorehawk").join("logs"))
}

/// Installs the global subscriber: stdout plus a daily rolling file when the
/// log directory is usable. `RUST_LOG` overrides the default `info` level.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init() -> Option<WorkerGuard> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let file_dir = log_dir().filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match file_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(stdout_layer)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();

            tracing::debug!("Logging to {}", dir.display());
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(stdout_layer)
                .init();

            tracing::warn!("Log directory unavailable, logging to stdout only");
            None
        }
    }
}
