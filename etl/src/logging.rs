use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EtlConfig;

/// Initializes logging with console output and a JSON log file.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the whole run.
pub fn init_logging(config: &EtlConfig) -> std::io::Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir)?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_writer);

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("retail_etl=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Logging initialized successfully!");
    Ok(guard)
}
