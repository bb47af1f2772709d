//! Unified logging system
//!
//! Provides structured logging with configurable output format and filtering

use crate::error::{ErrorContext, SmartzoneError, SmartzoneResult};
use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Whether to log to file
    pub log_to_file: bool,
    /// Log file path (if log_to_file is true)
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            include_thread: false,
            log_to_file: false,
            log_file_path: None,
            filter_directives: vec![
                "smartzone_core=debug".to_string(),
                "smartzone_access=debug".to_string(),
            ],
        }
    }
}

/// Initialize the logging system
pub fn init_logging(config: &LoggingConfig) -> SmartzoneResult<()> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Add custom filter directives
    for directive in &config.filter_directives {
        let parsed = directive.parse().map_err(|e| SmartzoneError::Config {
            message: format!("Invalid filter directive: {directive}"),
            source: Some(Box::new(e)),
            context: ErrorContext::new("logging")
                .with_operation("init_logging")
                .with_suggestion("Check logging.filter_directives in the configuration file"),
        })?;
        filter = filter.add_directive(parsed);
    }

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            if config.log_to_file {
                let log_path = config.log_file_path.as_ref().ok_or_else(missing_log_path)?;
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_path)?;

                registry.with(fmt_layer.with_writer(file)).init();
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            if config.log_to_file {
                let log_path = config.log_file_path.as_ref().ok_or_else(missing_log_path)?;
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_path)?;

                registry.with(fmt_layer.with_writer(file)).init();
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread)
                .with_thread_names(config.include_thread);

            if config.log_to_file {
                let log_path = config.log_file_path.as_ref().ok_or_else(missing_log_path)?;
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_path)?;

                registry.with(fmt_layer.with_writer(file)).init();
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
    }

    Ok(())
}

fn missing_log_path() -> SmartzoneError {
    SmartzoneError::Config {
        message: "log_file_path must be specified when log_to_file is true".to_string(),
        source: None,
        context: ErrorContext::new("logging")
            .with_operation("init_logging")
            .with_suggestion("Set logging.log_file_path or disable logging.log_to_file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this binary that installs the global subscriber.
    #[test]
    fn json_format_emits_machine_readable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartzone.log");

        let config = LoggingConfig {
            format: LogFormat::Json,
            log_to_file: true,
            log_file_path: Some(path.display().to_string()),
            ..LoggingConfig::default()
        };
        init_logging(&config).unwrap();
        tracing::info!(component = "logging-test", "structured output check");

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed["fields"]["component"], "logging-test");
        assert_eq!(parsed["fields"]["message"], "structured output check");
    }
}
