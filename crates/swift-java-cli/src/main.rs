//! swift-java: generate Java bindings for a Swift module.

mod config;
mod logging;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;

use swift_java_abi::{CdeclLowering, CodePrinter, LoweringError};
use swift_java_bindgen::jni::{JniTranslator, printing::print_thunk};
use swift_java_bindgen::naming::{ThunkNameRegistry, jni_symbol};
use swift_java_bindgen::{
    ConfigError, GenerationMode, Generator, ImportedFunc, ImportedModule, ModelError, ModuleDeclarations,
    TranslationError,
};

use config::CliConfig;
use logging::LoggingError;

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Library error (wraps all swift_java_bindgen errors)
    #[error(transparent)]
    Library(#[from] swift_java_bindgen::Error),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("No declaration named '{0}'")]
    DeclarationNotFound(String),

    #[error("Could not translate '{name}': {source}")]
    Untranslatable {
        name: String,
        #[source]
        source: TranslationError,
    },
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        Self::Library(e.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Library(e.into())
    }
}

#[derive(Parser)]
#[command(name = "swift-java")]
#[command(about = "Generate Java bindings (FFM or JNI) for a Swift module")]
struct Cli {
    /// Configuration file with generator settings and a [logging] table
    #[arg(short, long, global = true, env = "SWIFT_JAVA_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter overriding the configured level, e.g. `debug`
    #[arg(long, global = true, env = "SWIFT_JAVA_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Swift thunks and Java classes for every declaration
    Generate {
        /// Declaration model (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Interop backend, overriding the configuration
        #[arg(long)]
        mode: Option<GenerationMode>,

        /// Java package, overriding the configuration
        #[arg(long)]
        package: Option<String>,

        /// Swift module name, overriding the model
        #[arg(long)]
        swift_module: Option<String>,

        /// Directory for generated Swift sources
        #[arg(long)]
        swift_out: PathBuf,

        /// Root directory for generated Java sources
        #[arg(long)]
        java_out: PathBuf,
    },

    /// Show how one declaration crosses the boundary
    Lower {
        /// Declaration model (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Qualified declaration name, e.g. `MyClass.update`
        name: String,

        /// Interop backend, overriding the configuration
        #[arg(long)]
        mode: Option<GenerationMode>,
    },

    /// Print the JNI symbol of a native method
    Mangle {
        /// Java package, e.g. `com.example.swift`
        #[arg(long, default_value = "")]
        package: String,

        /// Binary class name, nested classes joined with `$`
        class: String,

        /// Method name
        method: String,

        /// Descriptor of the parameter list, e.g. `JLjava/lang/String;`
        #[arg(default_value = "")]
        descriptor: String,
    },
}

/// Format an error for user-friendly display
fn format_error(err: &AppError) -> String {
    use std::io::IsTerminal;

    let use_colors = std::io::stderr().is_terminal();

    let (red, yellow, reset) = if use_colors {
        ("\x1b[0;31m", "\x1b[0;33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut output = format!("{}Error:{} {}\n", red, reset, err);
    if let Some(hint) = get_error_hint(err) {
        output.push_str(&format!("{}Hint:{} {}\n", yellow, reset, hint));
    }
    output
}

/// Get a helpful hint for common errors
fn get_error_hint(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::Library(swift_java_bindgen::Error::Model(ModelError::Json(_))) => {
            Some("The model is a JSON object with 'module', 'types', 'functions' and 'variables'")
        }
        AppError::Library(swift_java_bindgen::Error::Config(ConfigError::Parse(_))) => {
            Some("Valid modes are 'ffm' and 'jni'; every key is optional")
        }
        AppError::DeclarationNotFound(_) => Some("Qualify members with their type, e.g. 'MyClass.update'"),
        AppError::Untranslatable {
            source: TranslationError::MissingExternalMapping(_),
            ..
        } => Some("Map the type to a Java class under [class_mappings] in the configuration file"),
        AppError::Logging(LoggingError::InvalidFilter(_)) => {
            Some("Use a level such as 'info' or a directive such as 'swift_java_bindgen=debug'")
        }
        _ => None,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprint!("{}", format_error(&err));
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<CliConfig, AppError> {
    match path {
        Some(path) => Ok(CliConfig::from_file(path)?),
        None => Ok(CliConfig::default()),
    }
}

fn load_module(model: &Path, swift_module: Option<&str>) -> Result<ImportedModule, AppError> {
    Ok(ModuleDeclarations::from_file(model)?.resolve(swift_module)?)
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = load_config(cli.config.as_deref())?;
    logging::init(&config.logging, cli.log_level.as_deref())?;
    if let Some(path) = &cli.config {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    match cli.command {
        Commands::Generate {
            model,
            mode,
            package,
            swift_module,
            swift_out,
            java_out,
        } => {
            let generator = &mut config.generator;
            if let Some(mode) = mode {
                generator.mode = mode;
            }
            if let Some(package) = package {
                generator.java_package = package;
            }
            if swift_module.is_some() {
                generator.swift_module = swift_module;
            }

            let module = load_module(&model, generator.swift_module.as_deref())?;
            let output = Generator::new(&module, generator).generate()?;
            let written = output.write_to(&swift_out, &java_out)?;
            for path in &written {
                println!("{}", path.display());
            }
            for skipped in &output.skipped {
                eprintln!("Skipped '{}': {}", skipped.qualified_name, skipped.reason);
            }
            eprintln!(
                "Generated {} files for module '{}', skipped {} declarations",
                written.len(),
                module.module_name,
                output.skipped.len()
            );
            Ok(())
        }

        Commands::Lower { model, name, mode } => {
            let generator = &config.generator;
            let module = load_module(&model, generator.swift_module.as_deref())?;
            let mode = mode.unwrap_or(generator.mode);

            // Overloads are numbered in declaration order.
            let mut registry = ThunkNameRegistry::new();
            let matches: Vec<(&ImportedFunc, String)> = module
                .functions
                .iter()
                .map(|decl| (decl, registry.function_thunk_name(decl)))
                .filter(|(decl, _)| decl.qualified_name() == name)
                .collect();
            if matches.is_empty() {
                return Err(AppError::DeclarationNotFound(name));
            }

            let untranslatable = |source: TranslationError| AppError::Untranslatable {
                name: name.clone(),
                source,
            };
            let mut printer = CodePrinter::new();
            for (decl, thunk_name) in matches {
                printer.print(format!("// {}", decl.signature_string));
                match mode {
                    GenerationMode::Ffm => {
                        let lowered = CdeclLowering::new()
                            .lower_function_signature(&decl.signature)
                            .map_err(|e| untranslatable(e.into()))?;
                        let function = lowered
                            .c_function(&thunk_name)
                            .map_err(|e: LoweringError| untranslatable(e.into()))?;
                        printer.print(format!("// {function};"));
                        lowered
                            .cdecl_thunk(&mut printer, &thunk_name, &decl.name, decl.api_kind)
                            .map_err(|e| untranslatable(e.into()))?;
                    }
                    GenerationMode::Jni => {
                        let translated = JniTranslator::new(generator)
                            .translate(decl)
                            .map_err(untranslatable)?;
                        print_thunk(&mut printer, decl, &translated, generator.async_func_mode);
                    }
                }
                printer.print_empty_line();
            }
            print!("{}", printer.finalize());
            Ok(())
        }

        Commands::Mangle {
            package,
            class,
            method,
            descriptor,
        } => {
            println!("{}", jni_symbol(&package, &class, &method, &descriptor));
            Ok(())
        }
    }
}
