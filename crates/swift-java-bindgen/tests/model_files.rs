//! End-to-end runs over model and configuration files on disk.

use std::fs;

use swift_java_bindgen::{
    Configuration, Error, GenerationMode, Generator, ModelError, ModuleDeclarations, TranslationError,
};

const MODEL: &str = r#"{
    "module": "MySwiftLibrary",
    "types": [
        { "name": "JavaLong", "kind": "class", "external": true },
        { "name": "JavaInteger", "kind": "class", "external": true },
        { "name": "Counter", "kind": "class" },
        { "name": "Hidden", "kind": "struct", "access": "internal" }
    ],
    "functions": [
        { "name": "increment", "parameters": [{ "label": "_", "name": "value", "type": "JavaLong" }], "result": "JavaLong" },
        { "name": "widen", "parameters": [{ "label": "_", "name": "value", "type": "JavaInteger" }] },
        { "name": "init", "kind": "initializer", "parent": "Counter" },
        { "name": "reveal", "parent": "Hidden", "static": true }
    ],
    "variables": [{ "name": "count", "parent": "Counter", "type": "Int64", "settable": true }]
}"#;

const CONFIG: &str = r#"
java_package = "com.example.lib"
mode = "jni"

[class_mappings]
JavaLong = "java.lang.Long"
"#;

#[test]
fn test_generate_from_files() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let model_path = dir.path().join("MySwiftLibrary.swiftinterface.json");
    let config_path = dir.path().join("swift-java.toml");
    fs::write(&model_path, MODEL)?;
    fs::write(&config_path, CONFIG)?;

    let config = Configuration::from_file(&config_path)?;
    assert_eq!(config.mode, GenerationMode::Jni);
    let module = ModuleDeclarations::from_file(&model_path)?.resolve(config.swift_module.as_deref())?;
    let output = Generator::new(&module, &config).generate()?;

    // JavaInteger has no mapping; the rest is generated.
    assert_eq!(output.skipped.len(), 1);
    let skipped = output.skipped.first().ok_or_else(|| anyhow::anyhow!("nothing skipped"))?;
    assert_eq!(skipped.qualified_name, "widen");
    assert!(matches!(
        &skipped.reason,
        TranslationError::MissingExternalMapping(name) if name == "JavaInteger"
    ));

    let written = output.write_to(dir.path().join("Sources"), dir.path().join("java"))?;
    assert_eq!(written.len(), 3);

    let module_class = fs::read_to_string(dir.path().join("java/com/example/lib/MySwiftLibrary.java"))?;
    assert!(module_class.starts_with("// Generated by jextract-swift"));
    assert!(module_class.contains("package com.example.lib;"));
    assert!(module_class.contains("public static java.lang.Long increment(java.lang.Long value) {"));
    assert!(!module_class.contains("widen"));

    let counter = fs::read_to_string(dir.path().join("java/com/example/lib/Counter.java"))?;
    assert!(counter.contains("public static Counter init(SwiftArena swiftArena$) {"));
    assert!(counter.contains("public long getCount() {"));
    assert!(counter.contains("public void setCount(long newValue) {"));

    let swift = fs::read_to_string(dir.path().join("Sources/MySwiftLibraryModule+SwiftJava.swift"))?;
    assert!(swift.contains("JavaLong(javaThis: value!, environment: environment)"));
    assert!(swift.contains(".javaThis"));
    assert!(!swift.contains("Hidden"));
    Ok(())
}

#[test]
fn test_missing_model_file_is_reported() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let err = ModuleDeclarations::from_file(dir.path().join("missing.json"));
    assert!(matches!(err, Err(ModelError::Io(path, _)) if path.ends_with("missing.json")));
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("swift-java.toml");
    fs::write(&path, "mode = \"wasm\"\n")?;
    let err = Configuration::from_file(&path).map_err(Error::from);
    assert!(err.is_err_and(|err| err.is_config()));
    Ok(())
}
