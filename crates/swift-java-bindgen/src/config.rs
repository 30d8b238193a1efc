//! Generator configuration.
//!
//! Read from a `swift-java.toml` file; every field has a default so an
//! empty file is a valid configuration.
//!
//! ```toml
//! swift_module = "MySwiftLibrary"
//! java_package = "com.example.swift"
//! mode = "jni"
//! unsigned_numbers_mode = "wrap_guava"
//!
//! [class_mappings]
//! JavaLong = "java.lang.Long"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which interop backend to generate for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// `java.lang.foreign` downcalls into `@_cdecl` thunks.
    #[default]
    Ffm,
    /// `native` methods implemented by `Java_…` Swift functions.
    Jni,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffm => f.write_str("ffm"),
            Self::Jni => f.write_str("jni"),
        }
    }
}

impl FromStr for GenerationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ffm" => Ok(Self::Ffm),
            "jni" => Ok(Self::Jni),
            other => Err(ConfigError::InvalidValue {
                key: "mode",
                value: other.to_string(),
            }),
        }
    }
}

/// How unsigned Swift integers appear in Java.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsignedNumbersMode {
    /// Same-width signed primitive, marked `@Unsigned`.
    #[default]
    Annotate,
    /// Guava's `UnsignedInteger` and `UnsignedLong` for 32 and 64 bits.
    WrapGuava,
}

/// Which arenas generated APIs accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryManagementMode {
    /// Callers always pass an arena explicitly.
    #[default]
    Explicit,
    /// Also emit overloads that use the global automatic arena.
    AllowGlobalAutomatic,
}

/// The Java future type returned by `async` functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncFuncMode {
    #[default]
    CompletableFuture,
    /// `java.util.concurrent.Future`, for platforms without
    /// `CompletableFuture`.
    LegacyFuture,
}

/// Swift access levels, least to most visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Private,
    Fileprivate,
    Internal,
    Package,
    #[default]
    Public,
    Open,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Private => "private",
            Self::Fileprivate => "fileprivate",
            Self::Internal => "internal",
            Self::Package => "package",
            Self::Public => "public",
            Self::Open => "open",
        };
        f.write_str(name)
    }
}

/// Configuration of one generator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Overrides the module name from the declaration model.
    pub swift_module: Option<String>,
    pub java_package: String,
    pub mode: GenerationMode,
    pub unsigned_numbers_mode: UnsignedNumbersMode,
    pub memory_management_mode: MemoryManagementMode,
    pub async_func_mode: AsyncFuncMode,
    /// Declarations less visible than this are not extracted.
    pub minimum_input_access_level: AccessLevel,
    /// Swift type name to fully qualified Java class, for external types.
    pub class_mappings: BTreeMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            swift_module: None,
            java_package: "com.example.swift".to_string(),
            mode: GenerationMode::default(),
            unsigned_numbers_mode: UnsignedNumbersMode::default(),
            memory_management_mode: MemoryManagementMode::default(),
            async_func_mode: AsyncFuncMode::default(),
            minimum_input_access_level: AccessLevel::default(),
            class_mappings: BTreeMap::new(),
        }
    }
}

impl Configuration {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// The Java package as a relative directory, e.g. `com/example/swift`.
    pub fn java_package_path(&self) -> String {
        self.java_package.replace('.', "/")
    }

    pub fn allows_global_automatic_arena(&self) -> bool {
        self.memory_management_mode == MemoryManagementMode::AllowGlobalAutomatic
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
swift_module = "MySwiftLibrary"
java_package = "org.example"
mode = "jni"
unsigned_numbers_mode = "wrap_guava"
memory_management_mode = "allow_global_automatic"
minimum_input_access_level = "package"

[class_mappings]
JavaLong = "java.lang.Long"
"#;
        let config = Configuration::from_toml(toml).unwrap();
        assert_eq!(config.swift_module.as_deref(), Some("MySwiftLibrary"));
        assert_eq!(config.java_package_path(), "org/example");
        assert_eq!(config.mode, GenerationMode::Jni);
        assert_eq!(config.unsigned_numbers_mode, UnsignedNumbersMode::WrapGuava);
        assert!(config.allows_global_automatic_arena());
        assert_eq!(config.minimum_input_access_level, AccessLevel::Package);
        assert_eq!(config.class_mappings.get("JavaLong").map(String::as_str), Some("java.lang.Long"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Configuration::from_toml("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.mode, GenerationMode::Ffm);
        assert_eq!(config.async_func_mode, AsyncFuncMode::CompletableFuture);
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        assert!(Configuration::from_toml("mode = \"wasm\"").is_err());
        assert!("wasm".parse::<GenerationMode>().is_err());
        assert_eq!("jni".parse::<GenerationMode>().unwrap(), GenerationMode::Jni);
    }

    #[test]
    fn test_access_levels_are_ordered() {
        assert!(AccessLevel::Internal < AccessLevel::Package);
        assert!(AccessLevel::Public < AccessLevel::Open);
    }
}
