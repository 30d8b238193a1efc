//! Property-based tests for JNI symbol mangling.
//!
//! Escaped names must be valid C identifiers, and distinct Java names must
//! never collapse onto the same native symbol.

use proptest::prelude::*;
use swift_java_bindgen::naming::{jni_escape, jni_symbol};

/// Java member names and descriptors: identifiers with `$` and `_`, type
/// descriptors and the occasional non-ASCII letter.
fn java_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_$;\\[é]{0,16}"
}

fn is_c_identifier_part(s: &str) -> bool {
    s.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

proptest! {
    #[test]
    fn escaped_names_are_c_identifiers(name in java_name()) {
        let escaped = jni_escape(&name);
        prop_assert!(is_c_identifier_part(&escaped), "{}", escaped);
    }

    #[test]
    fn alphanumeric_names_are_unchanged(name in "[A-Za-z0-9]{0,16}") {
        prop_assert_eq!(jni_escape(&name), name);
    }

    #[test]
    fn escaping_is_injective(a in java_name(), b in java_name()) {
        prop_assume!(a != b);
        prop_assert_ne!(jni_escape(&a), jni_escape(&b));
    }

    #[test]
    fn symbols_are_c_identifiers(
        member in java_name(),
        descriptor in "(J|Z|I|\\[B|Ljava/lang/String;){0,4}",
    ) {
        let symbol = jni_symbol("com.example.swift", "SwiftModule", &member, &descriptor);
        prop_assert!(symbol.starts_with("Java_com_example_swift_SwiftModule_"));
        prop_assert!(is_c_identifier_part(&symbol), "{}", symbol);
    }
}
