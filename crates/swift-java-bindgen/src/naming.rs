//! Symbol naming: FFM thunk names and JNI native symbols.

use std::collections::HashMap;
use std::fmt::Write as _;

use swift_java_abi::{NominalTypeDecl, SwiftApiKind};

use crate::logging::trace;
use crate::model::{DeclId, ImportedFunc};

/// Prefix of every FFM `@_cdecl` thunk.
pub const THUNK_PREFIX: &str = "swiftjava";

/// Assigns unique `@_cdecl` names to declarations for one run.
///
/// Names are `swiftjava_<module>[_<parent>]_<name><suffix>`. When two
/// declarations produce the same base name (overloads differing only in
/// types), later ones get `$1`, `$2`, ... in the order they are first
/// asked for. Asking again for a declaration returns its first name.
#[derive(Debug, Default)]
pub struct ThunkNameRegistry {
    registry: HashMap<DeclId, String>,
    duplicates: HashMap<String, usize>,
}

impl ThunkNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function_thunk_name(&mut self, decl: &ImportedFunc) -> String {
        if let Some(name) = self.registry.get(&decl.id) {
            return name.clone();
        }

        let suffix = match decl.api_kind {
            SwiftApiKind::Getter | SwiftApiKind::SubscriptGetter | SwiftApiKind::EnumCase => "$get".to_string(),
            SwiftApiKind::Setter | SwiftApiKind::SubscriptSetter => "$set".to_string(),
            SwiftApiKind::Function | SwiftApiKind::Initializer => {
                decl.signature
                    .parameters
                    .iter()
                    .fold(String::new(), |mut suffix, parameter| {
                        suffix.push('_');
                        suffix.push_str(parameter.argument_label.as_deref().unwrap_or("_"));
                        suffix
                    })
            }
        };

        let base = match &decl.parent {
            Some(parent) => format!(
                "{THUNK_PREFIX}_{}_{}_{}{suffix}",
                decl.module_name,
                parent.qualified_name().replace('.', "_"),
                decl.name
            ),
            None => format!("{THUNK_PREFIX}_{}_{}{suffix}", decl.module_name, decl.name),
        };

        let name = self.deduplicate(base);
        trace!(decl = %decl.qualified_name(), thunk = %name, "assigned thunk name");
        self.registry.insert(decl.id, name.clone());
        name
    }

    fn deduplicate(&mut self, base: String) -> String {
        match self.duplicates.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{base}${count}")
            }
            None => {
                self.duplicates.insert(base.clone(), 0);
                base
            }
        }
    }
}

/// The FFM thunk returning a type's metadata pointer.
pub fn type_metadata_thunk_name(decl: &NominalTypeDecl) -> String {
    format!(
        "{THUNK_PREFIX}_getType_{}_{}",
        decl.module_name,
        decl.qualified_name().replace('.', "_")
    )
}

/// Escape a name for use in a JNI native symbol.
///
/// `_` becomes `_1`, `;` becomes `_2`, `[` becomes `_3`, `/` and `.`
/// become `_`, and any other non-alphanumeric UTF-16 unit becomes `_0xxxx`.
pub fn jni_escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '_' => escaped.push_str("_1"),
            ';' => escaped.push_str("_2"),
            '[' => escaped.push_str("_3"),
            '/' | '.' => escaped.push('_'),
            ch if ch.is_ascii_alphanumeric() => escaped.push(ch),
            ch => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    // Writing to a String cannot fail.
                    let _ = write!(escaped, "_0{unit:04x}");
                }
            }
        }
    }
    escaped
}

/// The symbol the JVM resolves for a native method.
///
/// `owner` is the binary class name without the package (`Outer$Inner`)
/// and `parameters_descriptor` is the descriptor of the parameter list,
/// without parentheses.
pub fn jni_symbol(package: &str, owner: &str, member: &str, parameters_descriptor: &str) -> String {
    let mut symbol = String::from("Java_");
    if !package.is_empty() {
        symbol.push_str(&jni_escape(package));
        symbol.push('_');
    }
    symbol.push_str(&jni_escape(owner));
    symbol.push('_');
    symbol.push_str(&jni_escape(member));
    symbol.push_str("__");
    symbol.push_str(&jni_escape(parameters_descriptor));
    symbol
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::model::ModuleDeclarations;

    fn module(json: &str) -> crate::model::ImportedModule {
        ModuleDeclarations::from_json(json).unwrap().resolve(None).unwrap()
    }

    #[test]
    fn test_labels_and_accessor_suffixes() {
        let module = module(
            r#"{
                "module": "SwiftModule",
                "types": [{ "name": "MySwiftClass", "kind": "class" }],
                "functions": [
                    { "name": "f", "parameters": [{ "label": "_", "name": "x", "type": "Int" }, { "name": "y", "type": "Int" }] },
                    { "name": "init", "kind": "initializer", "parent": "MySwiftClass", "parameters": [{ "name": "len", "type": "Int" }] }
                ],
                "variables": [{ "name": "len", "parent": "MySwiftClass", "type": "Int", "settable": true }]
            }"#,
        );
        let mut registry = ThunkNameRegistry::new();
        let names: Vec<String> = module
            .functions
            .iter()
            .map(|func| registry.function_thunk_name(func))
            .collect();
        assert_eq!(
            names,
            [
                "swiftjava_SwiftModule_f___y",
                "swiftjava_SwiftModule_MySwiftClass_init_len",
                "swiftjava_SwiftModule_MySwiftClass_len$get",
                "swiftjava_SwiftModule_MySwiftClass_len$set",
            ]
        );
    }

    #[test]
    fn test_overloads_are_numbered_and_stable() {
        let module = module(
            r#"{
                "module": "SwiftModule",
                "functions": [
                    { "name": "f", "parameters": [{ "name": "x", "type": "Int" }] },
                    { "name": "f", "parameters": [{ "name": "x", "type": "String" }] },
                    { "name": "f", "parameters": [{ "name": "x", "type": "Double" }] }
                ]
            }"#,
        );
        let mut registry = ThunkNameRegistry::new();
        let first: Vec<String> = module
            .functions
            .iter()
            .map(|func| registry.function_thunk_name(func))
            .collect();
        assert_eq!(
            first,
            [
                "swiftjava_SwiftModule_f_x",
                "swiftjava_SwiftModule_f_x$1",
                "swiftjava_SwiftModule_f_x$2"
            ]
        );
        let again: Vec<String> = module
            .functions
            .iter()
            .rev()
            .map(|func| registry.function_thunk_name(func))
            .collect();
        assert_eq!(again, first.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_nested_parent_and_metadata_name() {
        let module = module(
            r#"{
                "module": "M",
                "types": [{ "name": "Outer", "kind": "struct" }, { "name": "Inner", "kind": "struct", "parent": "Outer" }],
                "functions": [{ "name": "g", "parent": "Outer.Inner" }]
            }"#,
        );
        let mut registry = ThunkNameRegistry::new();
        assert_eq!(
            registry.function_thunk_name(&module.functions[0]),
            "swiftjava_M_Outer_Inner_g"
        );
        assert_eq!(
            type_metadata_thunk_name(&module.types[1].decl),
            "swiftjava_getType_M_Outer_Inner"
        );
    }

    #[test]
    fn test_jni_escape_table() {
        assert_eq!(jni_escape("my_func"), "my_1func");
        assert_eq!(jni_escape("Ljava/lang/String;"), "Ljava_lang_String_2");
        assert_eq!(jni_escape("[B"), "_3B");
        assert_eq!(jni_escape("$init"), "_00024init");
        assert_eq!(jni_escape("com.example"), "com_example");
        assert_eq!(jni_escape("é"), "_000e9");
    }

    #[test]
    fn test_jni_symbol() {
        assert_eq!(
            jni_symbol("com.example.swift", "SwiftModule", "copy", "Ljava/lang/String;"),
            "Java_com_example_swift_SwiftModule_copy__Ljava_lang_String_2"
        );
        assert_eq!(
            jni_symbol("com.example.swift", "MySwiftClass", "$destroy", "J"),
            "Java_com_example_swift_MySwiftClass__00024destroy__J"
        );
        assert_eq!(jni_symbol("", "Outer$Inner", "f", ""), "Java_Outer_00024Inner_f__");
    }
}
