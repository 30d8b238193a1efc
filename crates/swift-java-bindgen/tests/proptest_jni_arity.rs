//! Property-based tests for JNI native parameter lists.
//!
//! Whatever mix of parameter types a function takes, every Swift parameter
//! must read exactly the JNI parameters the native method declares for it.

use proptest::prelude::*;
use swift_java_bindgen::jni::translation::JniTranslator;
use swift_java_bindgen::{Configuration, ModuleDeclarations, UnsignedNumbersMode};

const PARAMETER_TYPES: &[&str] = &[
    "Bool",
    "Int8",
    "UInt8",
    "Int32",
    "UInt32",
    "Int64",
    "UInt64",
    "Double",
    "Float",
    "String",
    "UUID",
    "MyClass",
    "Bool?",
    "UInt8?",
    "Int32?",
    "UInt32?",
    "Int64?",
    "Double?",
    "String?",
    "MyClass?",
    "any Shape",
    "(Int64, Bool) -> Int64",
];

fn function_json(types: &[&str], instance: bool) -> String {
    let parameters: Vec<String> = types
        .iter()
        .enumerate()
        .map(|(index, ty)| format!(r#"{{ "name": "p{index}", "type": "{ty}" }}"#))
        .collect();
    let parent = if instance { r#""parent": "MyClass","# } else { "" };
    format!(
        r#"{{ "module": "SwiftModule",
             "types": [{{ "name": "MyClass", "kind": "class" }}, {{ "name": "Shape", "kind": "protocol" }}],
             "functions": [{{ "name": "f", {parent} "parameters": [{}] }}] }}"#,
        parameters.join(", ")
    )
}

proptest! {
    #[test]
    fn native_parameters_match_conversion_arity(
        types in prop::collection::vec(prop::sample::select(PARAMETER_TYPES), 0..6),
        instance in any::<bool>(),
        wrap_guava in any::<bool>(),
    ) {
        let module = ModuleDeclarations::from_json(&function_json(&types, instance))
            .map_err(|err| TestCaseError::fail(err.to_string()))?
            .resolve(None)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let config = Configuration {
            unsigned_numbers_mode: if wrap_guava {
                UnsignedNumbersMode::WrapGuava
            } else {
                UnsignedNumbersMode::Annotate
            },
            ..Configuration::default()
        };
        let function = module.functions.first().ok_or_else(|| TestCaseError::fail("no function"))?;
        let translated = JniTranslator::new(&config)
            .translate(function)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert_eq!(translated.native.parameters.len(), types.len());
        prop_assert_eq!(translated.native.self_parameter.is_some(), instance);
        for parameter in translated.native.parameters.iter().chain(&translated.native.self_parameter) {
            prop_assert_eq!(parameter.conversion.placeholder_count(), parameter.parameters.len());
        }
    }
}
