//! The `swift-java.toml` file read by the CLI: the generator settings plus
//! a `[logging]` table.
//!
//! ```toml
//! java_package = "com.example.swift"
//! mode = "jni"
//!
//! [class_mappings]
//! JavaLong = "java.lang.Long"
//!
//! [logging]
//! level = "swift_java_bindgen=debug"
//! format = "json"
//! output = "swift-java.log"
//! ```

use std::path::Path;

use serde::Deserialize;
use swift_java_bindgen::{ConfigError, Configuration};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `swift_java_bindgen=trace`.
    pub level: String,
    pub format: LogFormat,
    /// `stdout`, `stderr` or a file path.
    pub output: String,
    pub color: bool,
    /// Include the event target (module path).
    pub target: bool,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            // stdout carries command output
            output: "stderr".to_string(),
            color: true,
            target: false,
            timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub generator: Configuration,
    pub logging: LoggingConfig,
}

impl CliConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use swift_java_bindgen::GenerationMode;

    #[test]
    fn test_generator_and_logging_tables() {
        let config = CliConfig::from_toml(
            r#"
            java_package = "org.example"
            mode = "jni"

            [class_mappings]
            JavaLong = "java.lang.Long"

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.java_package, "org.example");
        assert_eq!(config.generator.mode, GenerationMode::Jni);
        assert_eq!(
            config.generator.class_mappings.get("JavaLong").map(String::as_str),
            Some("java.lang.Long")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(CliConfig::from_toml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let err = CliConfig::from_toml("[logging]\nformat = \"xml\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }
}
