//! The FFM backend.
//!
//! Java calls `@_cdecl` thunks through `java.lang.foreign` downcall
//! handles. Every declaration produces a thunk in the Swift output and, in
//! Java, a private descriptor class named after the thunk plus a public
//! wrapper method.
//!
//! - [`translation`]: lowered signatures to Java signatures
//! - [`printing`]: Java and Swift source text
//! - [`layout`]: value layouts and carrier types

pub mod layout;
pub mod printing;
pub mod translation;

use std::collections::BTreeMap;

use swift_java_abi::{CdeclLowering, CodePrinter, KnownTypeKind, NominalTypeDecl};

pub use translation::{FfmClosure, FfmTranslatedDecl, FfmTranslator};

use crate::context::{GenerationContext, mentions_data};
use crate::error::{Error, TranslationError};
use crate::generator::{BackendOutput, GeneratedFile};
use crate::logging::{debug, info};
use crate::model::{DeclId, ImportedFunc, ImportedNominalType};

type Translations = BTreeMap<DeclId, FfmTranslatedDecl>;

/// Generate the Swift thunks and Java bindings of a module.
pub fn generate(context: &mut GenerationContext<'_>) -> Result<BackendOutput, Error> {
    let translator = FfmTranslator::new(context.config);
    let translated = context.translate_all(|context, decl| {
        let lowered = CdeclLowering::new().lower_function_signature(&decl.signature)?;
        let thunk_name = context.thunk_name(decl);
        debug!(decl = %decl.qualified_name(), c = ?lowered.c_function(&thunk_name).ok(), "lowered");
        translator.translate(decl, &lowered, thunk_name)
    })?;
    info!(
        module = %context.module_name(),
        translated = translated.len(),
        skipped = context.skipped().len(),
        "translated declarations for FFM"
    );

    let printer = FfmPrinter {
        context,
        translated: &translated,
    };
    Ok(BackendOutput {
        swift_files: vec![printer.swift_file()?],
        java_files: printer.java_files()?,
    })
}

struct FfmPrinter<'c, 'a> {
    context: &'c GenerationContext<'a>,
    translated: &'c Translations,
}

impl<'c, 'a> FfmPrinter<'c, 'a> {
    fn module_name(&self) -> &'a str {
        self.context.module_name()
    }

    fn translated_decls(&self) -> impl Iterator<Item = (&'a ImportedFunc, &'c FfmTranslatedDecl)> + '_ {
        let module = self.context.module;
        self.translated
            .iter()
            .filter_map(move |(id, translated)| module.function(*id).map(|decl| (decl, translated)))
    }

    /// Foundation's `Data` gets a binding class when a declaration uses it
    /// and the module does not declare its own.
    fn foundation_data(&self) -> Option<NominalTypeDecl> {
        let used = self.translated_decls().any(|(decl, _)| mentions_data(decl));
        let declared = self.context.module.nominal_type("Data").is_some();
        (used && !declared).then(|| NominalTypeDecl {
            module_name: self.module_name().to_string(),
            ..NominalTypeDecl::known(KnownTypeKind::Data)
        })
    }

    fn all_included_types(&self, parent: Option<&str>, types: &mut Vec<&'a ImportedNominalType>) {
        for ty in self.context.included_types(parent) {
            types.push(ty);
            self.all_included_types(Some(&ty.qualified_name()), types);
        }
    }

    fn swift_file(&self) -> Result<GeneratedFile, Error> {
        let data = self.foundation_data();
        let mut printer = CodePrinter::new();
        printing::print_swift_header(&mut printer, data.is_some());

        let mut types = Vec::new();
        self.all_included_types(None, &mut types);
        for ty in types {
            printing::print_type_metadata_thunk(&mut printer, &ty.decl);
            printer.print_empty_line();
        }
        if let Some(data) = &data {
            printing::print_type_metadata_thunk(&mut printer, data);
            printer.print_empty_line();
        }

        for (decl, translated) in self.translated_decls() {
            translated
                .lowered
                .cdecl_thunk(&mut printer, &translated.thunk_name, &decl.name, decl.api_kind)
                .map_err(TranslationError::from)?;
            printer.print_empty_line();
        }

        Ok(GeneratedFile {
            path: format!("{}Module+SwiftJava.swift", self.module_name()).into(),
            contents: printer.finalize(),
        })
    }

    fn java_file(
        &self,
        class_name: &str,
        print: impl FnOnce(&mut CodePrinter) -> Result<(), Error>,
    ) -> Result<GeneratedFile, Error> {
        let config = self.context.config;
        let mut printer = CodePrinter::new();
        printing::print_java_header(&mut printer, self.module_name(), &config.java_package);
        print(&mut printer)?;
        Ok(GeneratedFile {
            path: format!("{}/{class_name}.java", config.java_package_path()).into(),
            contents: printer.finalize(),
        })
    }

    fn java_files(&self) -> Result<Vec<GeneratedFile>, Error> {
        let module_name = self.module_name();
        let mut files = vec![self.java_file(module_name, |printer| {
            printing::print_module_class(printer, module_name, |printer| {
                for (decl, translated) in self.translated_decls().filter(|(decl, _)| decl.parent.is_none()) {
                    self.print_function(printer, decl, translated)?;
                }
                Ok(())
            })
        })?];

        for ty in self.context.included_types(None) {
            files.push(self.java_file(&ty.decl.name, |printer| self.print_type(printer, &ty.decl, false))?);
        }
        if let Some(data) = self.foundation_data() {
            files.push(self.java_file(&data.name, |printer| self.print_type(printer, &data, false))?);
        }
        Ok(files)
    }

    fn print_type(&self, printer: &mut CodePrinter, decl: &NominalTypeDecl, nested: bool) -> Result<(), Error> {
        let qualified_name = decl.qualified_name();
        printing::print_type_class(printer, self.module_name(), decl, nested, |printer| {
            for (member, translated) in self.translated_decls().filter(|(member, _)| {
                member
                    .parent
                    .as_ref()
                    .is_some_and(|parent| parent.qualified_name() == qualified_name)
            }) {
                self.print_function(printer, member, translated)?;
            }
            for nested in self.context.included_types(Some(&qualified_name)) {
                printer.print_empty_line();
                self.print_type(printer, &nested.decl, true)?;
            }
            Ok(())
        })
    }

    fn print_function(
        &self,
        printer: &mut CodePrinter,
        decl: &ImportedFunc,
        translated: &FfmTranslatedDecl,
    ) -> Result<(), Error> {
        printing::print_function(
            printer,
            self.module_name(),
            decl,
            translated,
            self.context.config.allows_global_automatic_arena(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::model::{ImportedModule, ModuleDeclarations};

    fn module(json: &str) -> ImportedModule {
        ModuleDeclarations::from_json(json).unwrap().resolve(None).unwrap()
    }

    fn generate_for(module: &ImportedModule, config: &Configuration) -> BackendOutput {
        let mut context = GenerationContext::new(module, config);
        generate(&mut context).unwrap()
    }

    fn java<'o>(output: &'o BackendOutput, name: &str) -> &'o str {
        output
            .java_files
            .iter()
            .find(|file| file.path.ends_with(format!("{name}.java")))
            .map(|file| file.contents.as_str())
            .unwrap()
    }

    #[test]
    fn test_zero_parameter_void_function() {
        let module = module(r#"{ "module": "SwiftModule", "functions": [{ "name": "helloWorld" }] }"#);
        let output = generate_for(&module, &Configuration::default());

        let swift = &output.swift_files[0];
        assert_eq!(swift.path.to_str(), Some("SwiftModuleModule+SwiftJava.swift"));
        assert!(swift.contents.contains(
            "@_cdecl(\"swiftjava_SwiftModule_helloWorld\")\npublic func swiftjava_SwiftModule_helloWorld() {\n  helloWorld()\n}\n"
        ));

        let java = java(&output, "SwiftModule");
        assert!(java.contains("private static final FunctionDescriptor DESC = FunctionDescriptor.ofVoid();"));
        assert!(java.contains(
            "public static void helloWorld() {\n    swiftjava_SwiftModule_helloWorld.call();\n  }"
        ));
    }

    #[test]
    fn test_data_round_trip_uses_swift_arena() {
        let module = module(
            r#"{ "module": "SwiftModule", "functions": [
                { "name": "receiveData", "parameters": [{ "name": "dat", "type": "Data" }] },
                { "name": "returnData", "result": "Data" }
            ] }"#,
        );
        let output = generate_for(&module, &Configuration::default());
        let java_module = java(&output, "SwiftModule");
        assert!(java_module.contains("swiftjava_SwiftModule_receiveData_dat.call(dat.$memorySegment());"));
        assert!(java_module.contains("public static Data returnData(AllocatingSwiftArena swiftArena$) {"));
        assert!(java_module.contains("MemorySegment _result = swiftArena$.allocate(Data.$LAYOUT);"));
        assert!(java_module.contains("return new Data(_result, swiftArena$);"));

        assert!(java(&output, "Data").contains("public final class Data extends FFMSwiftInstance implements SwiftValue {"));
        let swift = &output.swift_files[0].contents;
        assert!(swift.contains("import Foundation"));
        assert!(swift.contains("@_cdecl(\"swiftjava_getType_SwiftModule_Data\")"));
    }

    #[test]
    fn test_members_and_nested_types() {
        let module = module(
            r#"{ "module": "SwiftModule",
                 "types": [
                    { "name": "MySwiftClass", "kind": "class" },
                    { "name": "Inner", "kind": "struct", "parent": "MySwiftClass" }
                 ],
                 "functions": [{ "name": "init", "kind": "initializer", "parent": "MySwiftClass",
                                 "parameters": [{ "name": "len", "type": "Int" }] }],
                 "variables": [{ "name": "counter", "parent": "MySwiftClass", "type": "Int32", "settable": true }] }"#,
        );
        let output = generate_for(&module, &Configuration::default());
        assert_eq!(output.java_files.len(), 2);
        let class = java(&output, "MySwiftClass");
        assert!(class.contains("public final class MySwiftClass extends FFMSwiftInstance implements SwiftHeapObject {"));
        assert!(class.contains("public static MySwiftClass init(long len, AllocatingSwiftArena swiftArena$) {"));
        assert!(class.contains("public int getCounter() {\n    $ensureAlive();"));
        assert!(class.contains("public void setCounter(int newValue) {"));
        assert!(class.contains("public static final class Inner extends FFMSwiftInstance implements SwiftValue {"));
    }

    #[test]
    fn test_global_automatic_overload() {
        let module = module(r#"{ "module": "SwiftModule", "functions": [{ "name": "returnData", "result": "Data" }] }"#);
        let config = Configuration {
            memory_management_mode: crate::config::MemoryManagementMode::AllowGlobalAutomatic,
            ..Configuration::default()
        };
        let output = generate_for(&module, &config);
        assert!(java(&output, "SwiftModule").contains(
            "public static Data returnData() {\n    return returnData(SwiftMemoryManagement.GLOBAL_SWIFT_JAVA_ARENA);\n  }"
        ));
    }

    #[test]
    fn test_unsupported_declarations_are_skipped() {
        let module = module(
            r#"{ "module": "SwiftModule", "functions": [
                { "name": "pair", "result": "(Int, Int)" },
                { "name": "run", "effects": ["async"] },
                { "name": "fine", "result": "Int" }
            ] }"#,
        );
        let config = Configuration::default();
        let mut context = GenerationContext::new(&module, &config);
        let output = generate(&mut context).unwrap();
        let skipped: Vec<&str> = context.skipped().iter().map(|s| s.qualified_name.as_str()).collect();
        assert_eq!(skipped, ["pair", "run"]);
        assert!(java(&output, "SwiftModule").contains("public static long fine()"));
    }
}
