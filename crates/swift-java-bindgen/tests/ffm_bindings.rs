//! FFM bindings generated from declaration models: thunk naming across
//! overloads, subscripts and the unsigned integer modes.

use swift_java_bindgen::{Configuration, GeneratedOutput, Generator, ModuleDeclarations, UnsignedNumbersMode};

fn generate(json: &str, config: &Configuration) -> Result<GeneratedOutput, anyhow::Error> {
    let module = ModuleDeclarations::from_json(json)?.resolve(None)?;
    Ok(Generator::new(&module, config).generate()?)
}

fn module_class(output: &GeneratedOutput) -> Result<&str, anyhow::Error> {
    java_class(output, "SwiftModule")
}

fn java_class<'o>(output: &'o GeneratedOutput, class: &str) -> Result<&'o str, anyhow::Error> {
    output
        .java_files
        .iter()
        .find(|file| file.path.ends_with(format!("{class}.java")))
        .map(|file| file.contents.as_str())
        .ok_or_else(|| anyhow::anyhow!("no class {class}"))
}

const OVERLOADS: &str = r#"{
    "module": "SwiftModule",
    "functions": [
        { "name": "f", "parameters": [{ "name": "x", "type": "Int" }] },
        { "name": "f", "parameters": [{ "name": "x", "type": "Double" }] },
        { "name": "f", "parameters": [{ "name": "y", "type": "Int" }] }
    ]
}"#;

const UNSIGNED: &str = r#"{
    "module": "SwiftModule",
    "functions": [
        { "name": "next", "parameters": [{ "label": "_", "name": "value", "type": "UInt32" }], "result": "UInt32" }
    ]
}"#;

#[test]
fn test_overloads_get_distinct_thunks() -> Result<(), anyhow::Error> {
    let output = generate(OVERLOADS, &Configuration::default())?;
    let swift = output
        .swift_files
        .first()
        .map(|file| file.contents.as_str())
        .unwrap_or_default();
    for thunk in ["swiftjava_SwiftModule_f_x", "swiftjava_SwiftModule_f_x$1", "swiftjava_SwiftModule_f_y"] {
        assert!(swift.contains(&format!("@_cdecl(\"{thunk}\")\npublic func {thunk}(")), "{thunk}");
    }

    let java = module_class(&output)?;
    assert!(java.contains("private static class swiftjava_SwiftModule_f_x$1 {"));
    assert!(java.contains("public static void f(double x) {"));
    assert!(java.contains("swiftjava_SwiftModule_f_x$1.call(x);"));
    assert!(java.contains("swiftjava_SwiftModule_f_y.call(y);"));
    Ok(())
}

#[test]
fn test_subscripts_get_accessor_thunks() -> Result<(), anyhow::Error> {
    let output = generate(
        r#"{ "module": "SwiftModule",
             "types": [{ "name": "MyStruct", "kind": "struct" }],
             "subscripts": [{ "parent": "MyStruct", "parameters": [{ "name": "index", "type": "Int" }],
                              "result": "Int", "settable": true }] }"#,
        &Configuration::default(),
    )?;
    let swift = output
        .swift_files
        .iter()
        .map(|file| file.contents.as_str())
        .collect::<String>();
    assert!(swift.contains("@_cdecl(\"swiftjava_SwiftModule_MyStruct_subscript$get\")"));
    assert!(swift.contains("return self.assumingMemoryBound(to: MyStruct.self).pointee[index]"));
    assert!(swift.contains("@_cdecl(\"swiftjava_SwiftModule_MyStruct_subscript$set\")"));
    assert!(swift.contains("self.assumingMemoryBound(to: MyStruct.self).pointee[index] = newValue"));

    let java = java_class(&output, "MyStruct")?;
    assert!(java.contains("public long getSubscript(long index) {"));
    assert!(java.contains("public void setSubscript(long index, long newValue) {"));
    Ok(())
}

#[test]
fn test_uuid_is_skipped() -> Result<(), anyhow::Error> {
    let output = generate(
        r#"{ "module": "SwiftModule", "functions": [
            { "name": "acceptUUID", "parameters": [{ "name": "uuid", "type": "UUID" }] }
        ] }"#,
        &Configuration::default(),
    )?;
    let [skipped] = output.skipped.as_slice() else {
        anyhow::bail!("expected one skipped declaration, got {:?}", output.skipped);
    };
    assert_eq!(skipped.qualified_name, "acceptUUID");
    assert!(skipped.reason.to_string().contains("'UUID'"));
    Ok(())
}

#[test]
fn test_thunk_names_do_not_depend_on_backend_run() -> Result<(), anyhow::Error> {
    let first = generate(OVERLOADS, &Configuration::default())?;
    let second = generate(OVERLOADS, &Configuration::default())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_unsigned_values_are_annotated_by_default() -> Result<(), anyhow::Error> {
    let output = generate(UNSIGNED, &Configuration::default())?;
    let java = module_class(&output)?;
    assert!(java.contains("  @Unsigned\n  public static int next(@Unsigned int value) {"));
    assert!(java.contains("return swiftjava_SwiftModule_next__.call(value);"));
    Ok(())
}

#[test]
fn test_unsigned_values_wrap_in_guava() -> Result<(), anyhow::Error> {
    let config = Configuration {
        unsigned_numbers_mode: UnsignedNumbersMode::WrapGuava,
        ..Configuration::default()
    };
    let output = generate(UNSIGNED, &config)?;
    let java = module_class(&output)?;
    assert!(java.contains(
        "public static com.google.common.primitives.UnsignedInteger next(com.google.common.primitives.UnsignedInteger value) {"
    ));
    assert!(java.contains(
        "return com.google.common.primitives.UnsignedInteger.fromIntBits(swiftjava_SwiftModule_next__.call(value.intValue()));"
    ));
    Ok(())
}
