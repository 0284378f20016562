use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";

/// Initializes the logging system with both console and file output.
pub fn init_logging() {
    let _ = fs::create_dir_all(LOG_DIR);

    // Daily rolling JSON log next to the console output
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "sourcerer.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sourcerer=info"));

    // try_init so a second call (tests, embedding) does not panic
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the guard alive for the whole process so buffered lines are flushed
    std::mem::forget(guard);
}
