//! The JNI backend.
//!
//! Every declaration becomes a public Java wrapper calling a
//! `private static native` method, and a Swift `@_cdecl` entry point named
//! after the JNI mangling of that native method. Swift values live in heap
//! allocations owned by Java objects through their `selfPointer`.
//!
//! - [`translation`]: Swift signatures to Java and native signatures
//! - [`native`]: conversion programs run inside the Swift entry points
//! - [`printing`]: Java and Swift source text
//! - [`types`]: JNI carrier types

pub mod native;
pub mod printing;
pub mod translation;
pub mod types;

use std::collections::BTreeMap;

use swift_java_abi::{CodePrinter, KnownTypeKind, NominalKind, NominalTypeDecl};

pub use translation::{JniTranslatedDecl, JniTranslator, NativeFunctionSignature};

use crate::context::{GenerationContext, mentions_data, mentions_uuid};
use crate::error::Error;
use crate::generator::{BackendOutput, GeneratedFile};
use crate::logging::{debug, info};
use crate::model::{DeclId, ImportedFunc, ImportedNominalType};

type Translations = BTreeMap<DeclId, JniTranslatedDecl>;

/// Generate the Swift entry points and Java bindings of a module.
pub fn generate(context: &mut GenerationContext<'_>) -> Result<BackendOutput, Error> {
    let translator = JniTranslator::new(context.config);
    let translated = context.translate_all(|_, decl| {
        let translated = translator.translate(decl)?;
        debug!(decl = %decl.qualified_name(), native = %translated.native_name, "translated");
        Ok(translated)
    })?;
    info!(
        module = %context.module_name(),
        translated = translated.len(),
        skipped = context.skipped().len(),
        "translated declarations for JNI"
    );

    let printer = JniPrinter {
        context,
        translated: &translated,
    };
    Ok(BackendOutput {
        swift_files: vec![printer.swift_file()],
        java_files: printer.java_files(),
    })
}

struct JniPrinter<'c, 'a> {
    context: &'c GenerationContext<'a>,
    translated: &'c Translations,
}

impl<'c, 'a> JniPrinter<'c, 'a> {
    fn module_name(&self) -> &'a str {
        self.context.module_name()
    }

    fn package(&self) -> &'a str {
        &self.context.config.java_package
    }

    fn translated_decls(&self) -> impl Iterator<Item = (&'a ImportedFunc, &'c JniTranslatedDecl)> + '_ {
        let module = self.context.module;
        self.translated
            .iter()
            .filter_map(move |(id, translated)| module.function(*id).map(|decl| (decl, translated)))
    }

    fn members_of(&self, qualified_name: &str) -> impl Iterator<Item = (&'a ImportedFunc, &'c JniTranslatedDecl)> + '_ {
        let qualified_name = qualified_name.to_string();
        self.translated_decls().filter(move |(decl, _)| {
            decl.parent
                .as_ref()
                .is_some_and(|parent| parent.qualified_name() == qualified_name)
        })
    }

    /// Foundation's `Data` gets a wrapper class when a declaration uses it
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

    /// Conformances that have a generated Java interface.
    fn java_interfaces(&self, ty: &ImportedNominalType) -> Vec<String> {
        ty.conforms_to
            .iter()
            .filter(|protocol| {
                self.context
                    .module
                    .nominal_type(protocol)
                    .is_some_and(|decl| decl.decl.kind == NominalKind::Protocol && self.context.is_type_included(decl))
            })
            .cloned()
            .collect()
    }

    fn swift_file(&self) -> GeneratedFile {
        let package = self.package();
        let data = self.foundation_data();
        let imports_foundation =
            data.is_some() || self.translated_decls().any(|(decl, _)| mentions_uuid(decl));
        let mut printer = CodePrinter::new();
        printing::print_swift_header(&mut printer, imports_foundation);

        let mut types = Vec::new();
        self.all_included_types(None, &mut types);
        let decls = types
            .into_iter()
            .map(|ty| &*ty.decl)
            .filter(|decl| decl.kind != NominalKind::Protocol)
            .chain(&data);
        for decl in decls {
            printing::print_type_metadata_thunk(&mut printer, package, decl);
            printer.print_empty_line();
            printing::print_destroy_thunk(&mut printer, package, decl);
            printer.print_empty_line();
            printing::print_description_thunks(&mut printer, package, decl);
        }

        for (decl, translated) in self.translated_decls().filter(|(decl, _)| !decl.is_protocol_member()) {
            printing::print_thunk(&mut printer, decl, translated, self.context.config.async_func_mode);
            printer.print_empty_line();
        }

        GeneratedFile {
            path: format!("{}Module+SwiftJava.swift", self.module_name()).into(),
            contents: printer.finalize(),
        }
    }

    fn java_file(&self, class_name: &str, print: impl FnOnce(&mut CodePrinter)) -> GeneratedFile {
        let config = self.context.config;
        let mut printer = CodePrinter::new();
        printing::print_java_header(&mut printer, self.module_name(), &config.java_package);
        print(&mut printer);
        GeneratedFile {
            path: format!("{}/{class_name}.java", config.java_package_path()).into(),
            contents: printer.finalize(),
        }
    }

    fn java_files(&self) -> Vec<GeneratedFile> {
        let module_name = self.module_name();
        let mut files = vec![self.java_file(module_name, |printer| {
            printing::print_module_class(printer, module_name, |printer| {
                for (decl, translated) in self.translated_decls().filter(|(decl, _)| decl.parent.is_none()) {
                    self.print_function(printer, decl, translated);
                }
            });
        })];

        for ty in self.context.included_types(None) {
            files.push(self.java_file(&ty.decl.name, |printer| self.print_type(printer, Some(ty), &ty.decl, false)));
        }
        if let Some(data) = self.foundation_data() {
            files.push(self.java_file(&data.name, |printer| self.print_type(printer, None, &data, false)));
        }
        files
    }

    fn print_type(
        &self,
        printer: &mut CodePrinter,
        ty: Option<&ImportedNominalType>,
        decl: &NominalTypeDecl,
        nested: bool,
    ) {
        let qualified_name = decl.qualified_name();
        let print_nested = |printer: &mut CodePrinter| {
            for nested in self.context.included_types(Some(&qualified_name)) {
                printer.print_empty_line();
                self.print_type(printer, Some(nested), &nested.decl, true);
            }
        };

        if decl.kind == NominalKind::Protocol {
            printing::print_protocol_interface(printer, decl, nested, |printer| {
                for (member, translated) in self.members_of(&qualified_name) {
                    printing::print_interface_method(printer, member, translated);
                }
                print_nested(printer);
            });
            return;
        }

        let interfaces = ty.map(|ty| self.java_interfaces(ty)).unwrap_or_default();
        printing::print_type_class(printer, self.module_name(), decl, &interfaces, nested, |printer| {
            for (member, translated) in self.members_of(&qualified_name) {
                self.print_function(printer, member, translated);
            }
            print_nested(printer);
        });
    }

    fn print_function(&self, printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
        printing::print_function(
            printer,
            decl,
            translated,
            self.context.config.allows_global_automatic_arena(),
        );
    }
}
