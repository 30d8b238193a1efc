//! One generator run: pick the backend, collect its files and the
//! declarations it skipped.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Configuration, GenerationMode};
use crate::context::{GenerationContext, SkippedDeclaration};
use crate::error::{Error, Result};
use crate::logging::{debug, info};
use crate::model::ImportedModule;
use crate::{ffm, jni};

/// A generated source file. `path` is relative to the Swift or Java output
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    fn write_under(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join(&self.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Io(parent.display().to_string(), e))?;
        }
        fs::write(&path, &self.contents).map_err(|e| Error::Io(path.display().to_string(), e))?;
        debug!(path = %path.display(), bytes = self.contents.len(), "wrote file");
        Ok(path)
    }
}

/// What a backend produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutput {
    pub swift_files: Vec<GeneratedFile>,
    pub java_files: Vec<GeneratedFile>,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub swift_files: Vec<GeneratedFile>,
    pub java_files: Vec<GeneratedFile>,
    /// Declarations left out, with the reason.
    pub skipped: Vec<SkippedDeclaration>,
}

impl GeneratedOutput {
    /// Write Swift files under `swift_dir` and Java files under `java_dir`,
    /// creating directories as needed. Returns the written paths.
    pub fn write_to(&self, swift_dir: impl AsRef<Path>, java_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.swift_files.len() + self.java_files.len());
        for file in &self.swift_files {
            written.push(file.write_under(swift_dir.as_ref())?);
        }
        for file in &self.java_files {
            written.push(file.write_under(java_dir.as_ref())?);
        }
        Ok(written)
    }
}

/// Generates bindings for one module with one configuration.
///
/// # Example
///
/// ```rust
/// use swift_java_bindgen::{Configuration, Generator, ModuleDeclarations};
///
/// let module = ModuleDeclarations::from_json(
///     r#"{ "module": "MyLib", "functions": [{ "name": "answer", "result": "Int32" }] }"#,
/// )?
/// .resolve(None)?;
/// let output = Generator::new(&module, &Configuration::default()).generate()?;
/// assert!(output.skipped.is_empty());
/// assert!(output.java_files[0].contents.contains("public static int answer()"));
/// # Ok::<(), swift_java_bindgen::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
    module: &'a ImportedModule,
    config: &'a Configuration,
}

impl<'a> Generator<'a> {
    pub fn new(module: &'a ImportedModule, config: &'a Configuration) -> Self {
        Self { module, config }
    }

    pub fn generate(&self) -> Result<GeneratedOutput> {
        info!(
            module = %self.module.module_name,
            mode = %self.config.mode,
            package = %self.config.java_package,
            "generating bindings"
        );
        let mut context = GenerationContext::new(self.module, self.config);
        let output = match self.config.mode {
            GenerationMode::Ffm => ffm::generate(&mut context)?,
            GenerationMode::Jni => jni::generate(&mut context)?,
        };
        let skipped = context.into_skipped();
        info!(
            swift_files = output.swift_files.len(),
            java_files = output.java_files.len(),
            skipped = skipped.len(),
            "generated bindings"
        );
        Ok(GeneratedOutput {
            swift_files: output.swift_files,
            java_files: output.java_files,
            skipped,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::ModuleDeclarations;

    fn module() -> ImportedModule {
        ModuleDeclarations::from_json(
            r#"{ "module": "SwiftModule", "functions": [
                { "name": "helloWorld" },
                { "name": "pair", "result": "(Int, Int)" }
            ] }"#,
        )
        .unwrap()
        .resolve(None)
        .unwrap()
    }

    #[test]
    fn test_dispatches_on_mode() {
        let module = module();
        let ffm = Generator::new(&module, &Configuration::default()).generate().unwrap();
        assert!(ffm.java_files[0].contents.contains("FunctionDescriptor"));

        let config = Configuration {
            mode: GenerationMode::Jni,
            ..Configuration::default()
        };
        let jni = Generator::new(&module, &config).generate().unwrap();
        assert!(jni.java_files[0].contents.contains("private static native void $helloWorld();"));
        assert_eq!(jni.skipped.len(), 1);
        assert_eq!(jni.skipped[0].qualified_name, "pair");
    }

    #[test]
    fn test_write_to_creates_package_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = Generator::new(&module(), &Configuration::default()).generate().unwrap();
        let written = output
            .write_to(dir.path().join("swift"), dir.path().join("java"))
            .unwrap();
        assert_eq!(written.len(), 2);
        let java = dir.path().join("java/com/example/swift/SwiftModule.java");
        assert!(fs::read_to_string(java).unwrap().starts_with("// Generated by jextract-swift"));
        assert!(dir.path().join("swift/SwiftModuleModule+SwiftJava.swift").exists());
    }
}
