//! Structured logging configuration
//!
//! - Environment-based log level configuration
//! - JSON, pretty or compact output
//! - Optional daily-rolling log file (needed while the TUI owns the terminal)

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Logging configuration for different environments
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level or full filter directive (e.g. `promptdesk=debug`)
    pub level: String,
    pub format: LogFormat,
    /// Write to a daily-rolling file in this directory instead of stderr
    pub file_dir: Option<PathBuf>,
    pub colored: bool,
    pub with_location: bool,
    pub with_spans: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging for production
    Json,
    /// Pretty human-readable for development
    Pretty,
    /// Compact single-line format
    Compact,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.to_lowercase() == "true")
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Pretty,
            file_dir: None,
            colored: is_terminal::IsTerminal::is_terminal(&std::io::stderr()),
            with_location: false,
            with_spans: false,
        }
    }
}

impl LogConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let level = env::var("PROMPTDESK_LOG_LEVEL")
            .or_else(|_| env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| "error".to_string());

        let format = match env::var("PROMPTDESK_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let file_dir = env::var("PROMPTDESK_LOG_DIR").ok().map(PathBuf::from);

        let colored = env_flag("PROMPTDESK_LOG_COLOR")
            .unwrap_or_else(|| is_terminal::IsTerminal::is_terminal(&std::io::stderr()));

        Self {
            level,
            format,
            colored: colored && file_dir.is_none(),
            file_dir,
            with_location: env_flag("PROMPTDESK_LOG_LOCATION").unwrap_or(false),
            with_spans: env_flag("PROMPTDESK_LOG_SPANS").unwrap_or(false),
        }
    }

    /// True when logging was asked for in the environment
    pub fn requested() -> bool {
        env::var("PROMPTDESK_LOG_LEVEL").is_ok() || env::var("PROMPTDESK_LOG_DIR").is_ok()
    }
}

/// Initialize the global tracing subscriber
///
/// Keep the returned guard alive for the life of the program when logging
/// to a file; dropping it flushes and stops the writer thread.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("error"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    let span_events = if config.with_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, guard) = match &config.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "promptdesk.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(config.colored)
        .with_span_events(span_events)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    match config.format {
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logging: {}", e))?,
        LogFormat::Pretty => subscriber
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logging: {}", e))?,
        LogFormat::Compact => subscriber
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize compact logging: {}", e))?,
    }

    info!(
        level = %config.level,
        format = ?config.format,
        file = config.file_dir.is_some(),
        "Logging initialized"
    );

    Ok(guard)
}

/// Log a CLI command with timing
pub fn log_command_execution<T>(command_name: &str, duration_ms: u64, result: &Result<T>) {
    let span = tracing::info_span!(
        "command_execution",
        command = command_name,
        duration_ms = duration_ms
    );
    let _enter = span.enter();

    match result {
        Ok(_) => info!(
            command = command_name,
            duration_ms = duration_ms,
            "Command completed successfully"
        ),
        Err(e) => error!(
            command = command_name,
            duration_ms = duration_ms,
            error = %e,
            "Command failed"
        ),
    }
}

/// Log the outcome of a backend call made on behalf of a UI action
pub fn log_api_call(operation: &str, target: Option<&str>, success: bool, duration_ms: u64) {
    if success {
        debug!(
            operation = operation,
            target = target,
            duration_ms = duration_ms,
            "API call completed"
        );
    } else {
        warn!(
            operation = operation,
            target = target,
            duration_ms = duration_ms,
            "API call failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn init_test_logging() {
        INIT.call_once(|| {
            let config = LogConfig {
                level: "debug".to_string(),
                format: LogFormat::Compact,
                file_dir: None,
                colored: false,
                with_location: false,
                with_spans: false,
            };
            let _ = init_logging(config);
        });
    }

    #[test]
    fn test_log_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("PROMPTDESK_LOG_LEVEL", "debug");
        env::set_var("PROMPTDESK_LOG_FORMAT", "json");
        env::set_var("PROMPTDESK_LOG_COLOR", "false");

        let config = LogConfig::from_env();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.colored);
        assert!(LogConfig::requested());

        env::remove_var("PROMPTDESK_LOG_LEVEL");
        env::remove_var("PROMPTDESK_LOG_FORMAT");
        env::remove_var("PROMPTDESK_LOG_COLOR");
    }

    #[test]
    fn test_file_logging_disables_color() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("PROMPTDESK_LOG_DIR", "/tmp/promptdesk-logs");
        env::set_var("PROMPTDESK_LOG_COLOR", "true");

        let config = LogConfig::from_env();
        assert!(!config.colored);
        assert_eq!(config.file_dir, Some(PathBuf::from("/tmp/promptdesk-logs")));

        env::remove_var("PROMPTDESK_LOG_DIR");
        env::remove_var("PROMPTDESK_LOG_COLOR");
    }

    #[test]
    fn test_command_and_api_logging() {
        init_test_logging();

        let result: Result<()> = Ok(());
        log_command_execution("list", 12, &result);
        let result: Result<()> = Err(anyhow::anyhow!("backend down"));
        log_command_execution("delete", 40, &result);

        log_api_call("delete_prompt", Some("p1"), true, 20);
        log_api_call("fetch_tags", None, false, 5000);
    }
}
