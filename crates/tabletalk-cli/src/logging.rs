//! Structured logging for the tabletalk binary
//!
//! Features:
//! - Human-readable console logging for development
//! - Structured JSON logging for production
//! - File rotation with daily log files
//! - Configurable log levels per module

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// JSON format for production (structured logging)
    Json,
    /// Compact format for testing
    Compact,
}

impl LogFormat {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            Ok("pretty") | Ok(_) => LogFormat::Pretty,
            Err(_) => LogFormat::Pretty,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stdout only
    Stdout,
    /// Log to file only
    File,
    /// Log to both stdout and file
    Both,
}

impl LogOutput {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        match std::env::var("LOG_OUTPUT").as_deref() {
            Ok("file") => LogOutput::File,
            Ok("both") => LogOutput::Both,
            Ok("stdout") | Ok(_) => LogOutput::Stdout,
            Err(_) => LogOutput::Stdout,
        }
    }
}

/// Initialize the logging system.
///
/// Environment variables (normally seeded from the config file by
/// `Config::apply_logging_env`):
/// - `RUST_LOG`: Log level (e.g., "debug", "info", "tabletalk=debug")
/// - `LOG_FORMAT`: Output format ("pretty", "json", "compact")
/// - `LOG_OUTPUT`: Where to write logs ("stdout", "file", "both")
/// - `LOG_DIR`: Directory for log files (default: "./logs")
pub fn init() {
    let format = LogFormat::from_env();
    let output = LogOutput::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap()
        // Filter out noisy third-party crates
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap())
        .add_directive("h2=warn".parse().unwrap());

    match (output, format) {
        // Stdout only
        (LogOutput::Stdout, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Compact) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .init();
        }
        // File only
        (LogOutput::File, _) => {
            let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "tabletalk.log");

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(file_appender).with_ansi(false))
                .init();
        }
        // Both stdout and file - use boxed layers for dynamic dispatch
        (LogOutput::Both, format) => {
            let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "tabletalk.log");

            let stdout_layer = match format {
                LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
                LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
                LogFormat::Compact => fmt::layer().compact().boxed(),
            };

            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .boxed();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
    }

    tracing::debug!(format = ?format, output = ?output, "Logging initialized");
}
