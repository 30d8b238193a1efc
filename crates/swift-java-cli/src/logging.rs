//! Logging initialization.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber described by `config`.
///
/// `level_override` replaces the configured filter, e.g. from `--log-level`.
pub fn init(config: &LoggingConfig, level_override: Option<&str>) -> Result<(), LoggingError> {
    let level = level_override.unwrap_or(&config.level);
    let filter = EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    match config.output.as_str() {
        "stdout" => install(config, filter, io::stdout, config.color && io::stdout().is_terminal()),
        "stderr" => install(config, filter, io::stderr, config.color && io::stderr().is_terminal()),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoggingError::FileOpen(path.to_string(), e))?;
            install(config, filter, file, false)
        }
    }
    Ok(())
}

fn install<W>(config: &LoggingConfig, filter: EnvFilter, writer: W, ansi: bool)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(ansi)
                .with_target(config.target)
                .with_span_events(FmtSpan::NONE)
                .with_writer(writer);
            if config.timestamps {
                registry.with(layer).init();
            } else {
                registry.with(layer.without_time()).init();
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(config.target)
                .with_span_events(FmtSpan::NONE)
                .with_writer(writer);
            if config.timestamps {
                registry.with(layer).init();
            } else {
                registry.with(layer.without_time()).init();
            }
        }
    }
}

/// Errors from logging initialization.
#[derive(Debug)]
pub enum LoggingError {
    InvalidFilter(String),
    FileOpen(String, io::Error),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFilter(msg) => write!(f, "Invalid log filter: {}", msg),
            LoggingError::FileOpen(path, e) => write!(f, "Failed to open log file '{}': {}", path, e),
        }
    }
}

impl std::error::Error for LoggingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_reported() {
        let config = LoggingConfig {
            level: "swift_java_bindgen=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config, None), Err(LoggingError::InvalidFilter(_))));
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let config = LoggingConfig {
            output: "/nonexistent-directory/swift-java.log".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config, None), Err(LoggingError::FileOpen(..))));
    }
}
