//! Java bindings for Swift modules.
//!
//! swift-java-bindgen reads the declarations of a Swift module, translates
//! each function, initializer, property accessor and enum case into a Java
//! method, and prints the Java classes together with the Swift entry
//! points they call. Two backends share the translation model:
//!
//! - FFM: Java calls `@_cdecl` thunks through `java.lang.foreign`
//! - JNI: Java declares `native` methods bound to mangled `@_cdecl` symbols
//!
//! Declarations whose types have no translation are skipped and reported,
//! never fatal.
//!
//! # Module Organization
//!
//! - [`model`]: The declaration model and its JSON form
//! - [`config`]: Generation settings, loaded from TOML
//! - [`context`]: Per-run state and inclusion rules
//! - [`naming`]: Thunk names and JNI symbol mangling
//! - [`java`]: Java types and [`JavaConversionStep`] programs
//! - [`ffm`]: The FFM backend
//! - [`jni`]: The JNI backend
//! - [`generator`]: [`Generator`], the entry point
//! - [`error`]: Unified error types
//! - `logging`: Conditional logging macros (internal)
//!
//! # Features
//!
//! - `logging`: Enable tracing-based logging
//!
//! # Example
//!
//! ```rust
//! use swift_java_bindgen::{Configuration, GenerationMode, Generator, ModuleDeclarations};
//!
//! let module = ModuleDeclarations::from_json(
//!     r#"{ "module": "MyLib", "functions": [{ "name": "greet", "parameters": [{ "name": "name", "type": "String" }] }] }"#,
//! )?
//! .resolve(None)?;
//! let config = Configuration {
//!     mode: GenerationMode::Jni,
//!     ..Configuration::default()
//! };
//! let output = Generator::new(&module, &config).generate()?;
//! assert!(output.java_files[0].contents.contains("private static native void $greet(java.lang.String name);"));
//! # Ok::<(), swift_java_bindgen::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod ffm;
pub mod generator;
pub mod java;
pub mod jni;
#[macro_use]
pub(crate) mod logging;
pub mod model;
pub mod naming;

pub use config::{
    AccessLevel, AsyncFuncMode, ConfigError, Configuration, GenerationMode, MemoryManagementMode, UnsignedNumbersMode,
};
pub use context::{GenerationContext, SkippedDeclaration};
pub use error::{Error, ModelError, Result, TranslationError};
pub use generator::{BackendOutput, GeneratedFile, GeneratedOutput, Generator};
pub use java::{JavaConversionStep, JavaType};
pub use model::{ImportedFunc, ImportedModule, ImportedNominalType, ModuleDeclarations};

// Re-export the Swift model for callers building declarations by hand
pub use swift_java_abi::{CodePrinter, SwiftType, SymbolTable};
