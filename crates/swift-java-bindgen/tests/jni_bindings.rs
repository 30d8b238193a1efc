//! JNI bindings generated from declaration models, checked through the
//! public [`Generator`] API.

use swift_java_bindgen::{
    Configuration, GeneratedOutput, GenerationMode, Generator, ModuleDeclarations, UnsignedNumbersMode,
};

// ============================================================================
// Helpers
// ============================================================================

fn generate(json: &str, config: Configuration) -> Result<GeneratedOutput, anyhow::Error> {
    let module = ModuleDeclarations::from_json(json)?.resolve(None)?;
    Ok(Generator::new(&module, &config).generate()?)
}

fn jni(json: &str) -> Result<GeneratedOutput, anyhow::Error> {
    generate(
        json,
        Configuration {
            mode: GenerationMode::Jni,
            ..Configuration::default()
        },
    )
}

fn java<'o>(output: &'o GeneratedOutput, class: &str) -> Result<&'o str, anyhow::Error> {
    output
        .java_files
        .iter()
        .find(|file| file.path.ends_with(format!("{class}.java")))
        .map(|file| file.contents.as_str())
        .ok_or_else(|| anyhow::anyhow!("no Java file for {class}"))
}

fn swift(output: &GeneratedOutput) -> Result<&str, anyhow::Error> {
    output
        .swift_files
        .first()
        .map(|file| file.contents.as_str())
        .ok_or_else(|| anyhow::anyhow!("no Swift file"))
}

const OPTIONALS: &str = r#"{
    "module": "SwiftModule",
    "types": [{ "name": "MyClass", "kind": "class" }],
    "functions": [
        { "name": "optionalBool", "parameters": [{ "label": "_", "name": "arg", "type": "Bool?" }], "result": "Bool?" },
        { "name": "optionalInt", "parameters": [{ "label": "_", "name": "arg", "type": "Int32?" }], "result": "Int32?" },
        { "name": "optionalLong", "parameters": [{ "label": "_", "name": "arg", "type": "Int64?" }], "result": "Int64?" },
        { "name": "optionalString", "parameters": [{ "label": "_", "name": "arg", "type": "String?" }], "result": "String?" },
        { "name": "optionalClass", "parameters": [{ "label": "_", "name": "arg", "type": "MyClass?" }], "result": "MyClass?" }
    ]
}"#;

// ============================================================================
// Optionals
// ============================================================================

#[test]
fn test_optional_int_result_is_combined_into_long() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONALS)?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains("private static native long $optionalInt(byte arg_discriminator, int arg_value);"));
    assert!(java.contains(
        "    long result_combined$ = SwiftModule.$optionalInt((byte) (arg.isPresent() ? 1 : 0), arg.orElse(0));\n\
         \x20   byte result_discriminator$ = (byte) (result_combined$ & 0xFF);\n\
         \x20   int result_value$ = (int) (result_combined$ >> 32);\n\
         \x20   return result_discriminator$ == 1 ? OptionalInt.of(result_value$) : OptionalInt.empty();\n"
    ));

    let swift = swift(&output)?;
    assert!(swift.contains(
        "  let result_value$ = SwiftModule.optionalInt(arg_discriminator == 1 ? Int32(fromJNI: arg_value, in: environment) : nil).map {\n\
         \x20   Int64($0) << 32 | Int64(1)\n\
         \x20 } ?? 0\n\
         \x20 return result_value$.getJNIValue(in: environment)\n"
    ));
    Ok(())
}

#[test]
fn test_optional_bool_result_fits_in_short() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONALS)?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains("private static native short $optionalBool(byte arg_discriminator, boolean arg_value);"));
    assert!(java.contains("short result_combined$ = SwiftModule.$optionalBool("));
    assert!(java.contains("boolean result_value$ = result_combined$ >> 8 != 0;"));
    assert!(swift(&output)?.contains("Int16($0 ? 1 : 0) << 8 | Int16(1)"));
    Ok(())
}

#[test]
fn test_optional_long_result_uses_discriminator_array() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONALS)?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains(
        "private static native long $optionalLong(byte arg_discriminator, long arg_value, byte[] result_discriminator$);"
    ));
    assert!(java.contains("byte[] result$_discriminator$ = new byte[1];"));
    assert!(java.contains("return (result$_discriminator$[0] == 1) ? OptionalLong.of(result$) : OptionalLong.empty();"));

    let swift = swift(&output)?;
    assert!(swift.contains("result_discriminator$: jbyteArray?) -> jlong {"));
    assert!(swift.contains("environment.interface.SetByteArrayRegion(environment, result_discriminator$, 0, 1, &flag$)"));
    assert!(swift.contains("result$ = Int64.jniPlaceholderValue"));
    Ok(())
}

#[test]
fn test_optional_string_and_class() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONALS)?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains("public static Optional<java.lang.String> optionalString(Optional<java.lang.String> arg) {"));
    assert!(java.contains("SwiftModule.$optionalString((byte) (arg.isPresent() ? 1 : 0), arg.orElse(null), result$_discriminator$);"));
    assert!(java.contains(
        "public static Optional<MyClass> optionalClass(Optional<MyClass> arg, SwiftArena swiftArena$) {"
    ));
    assert!(java.contains("long result$ = SwiftModule.$optionalClass(arg.map(MyClass::$memoryAddress).orElse(0L), result$_discriminator$);"));

    let swift = swift(&output)?;
    assert!(swift.contains("let argBits$ = Int(Int64(fromJNI: arg, in: environment))"));
    assert!(swift.contains("arg$?.pointee"));
    Ok(())
}

const UNSIGNED_OPTIONALS: &str = r#"{
    "module": "SwiftModule",
    "functions": [
        { "name": "optionalUInt8", "parameters": [{ "label": "_", "name": "arg", "type": "UInt8?" }], "result": "UInt8?" },
        { "name": "optionalUInt32", "parameters": [{ "label": "_", "name": "arg", "type": "UInt32?" }], "result": "UInt32?" },
        { "name": "optionalUInt64", "parameters": [{ "label": "_", "name": "arg", "type": "UInt64?" }], "result": "UInt64?" }
    ]
}"#;

#[test]
fn test_unsigned_optionals_are_annotated() -> Result<(), anyhow::Error> {
    let output = jni(UNSIGNED_OPTIONALS)?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains(
        "  @Unsigned\n  public static Optional<java.lang.Byte> optionalUInt8(@Unsigned Optional<java.lang.Byte> arg) {"
    ));
    assert!(java.contains("SwiftModule.$optionalUInt8((byte) (arg.isPresent() ? 1 : 0), arg.orElse((byte) 0));"));
    assert!(java.contains("  @Unsigned\n  public static OptionalInt optionalUInt32(@Unsigned OptionalInt arg) {"));
    assert!(java.contains("SwiftModule.$optionalUInt32((byte) (arg.isPresent() ? 1 : 0), arg.orElse(0));"));
    assert!(java.contains("return result_discriminator$ == 1 ? OptionalInt.of(result_value$) : OptionalInt.empty();"));
    assert!(java.contains("  @Unsigned\n  public static OptionalLong optionalUInt64(@Unsigned OptionalLong arg) {"));
    assert!(java.contains("return (result$_discriminator$[0] == 1) ? OptionalLong.of(result$) : OptionalLong.empty();"));

    // The native side is unchanged by the annotation.
    assert!(java.contains("private static native long $optionalUInt32(byte arg_discriminator, int arg_value);"));
    assert!(swift(&output)?.contains("arg_discriminator == 1 ? UInt32(fromJNI: arg_value, in: environment) : nil"));
    Ok(())
}

#[test]
fn test_unsigned_optionals_wrap_guava() -> Result<(), anyhow::Error> {
    let output = generate(
        UNSIGNED_OPTIONALS,
        Configuration {
            mode: GenerationMode::Jni,
            unsigned_numbers_mode: UnsignedNumbersMode::WrapGuava,
            ..Configuration::default()
        },
    )?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains(
        "public static Optional<com.google.common.primitives.UnsignedInteger> optionalUInt32(Optional<com.google.common.primitives.UnsignedInteger> arg) {"
    ));
    assert!(java.contains(
        "SwiftModule.$optionalUInt32((byte) (arg.isPresent() ? 1 : 0), arg.map(com.google.common.primitives.UnsignedInteger::intValue).orElse(0));"
    ));
    assert!(java.contains(
        "return result_discriminator$ == 1 ? Optional.of(com.google.common.primitives.UnsignedInteger.fromIntBits(result_value$)) : Optional.empty();"
    ));
    assert!(java.contains(
        "public static Optional<com.google.common.primitives.UnsignedLong> optionalUInt64(Optional<com.google.common.primitives.UnsignedLong> arg) {"
    ));
    assert!(java.contains("arg.map(com.google.common.primitives.UnsignedLong::longValue).orElse(0L)"));
    assert!(java.contains(
        "return (result$_discriminator$[0] == 1) ? Optional.of(com.google.common.primitives.UnsignedLong.fromLongBits(result$)) : Optional.empty();"
    ));

    // UInt8 has no Guava wrapper and keeps the annotation.
    assert!(java.contains(
        "  @Unsigned\n  public static Optional<java.lang.Byte> optionalUInt8(@Unsigned Optional<java.lang.Byte> arg) {"
    ));
    assert!(!java.contains("@Unsigned\n  public static Optional<com.google"));
    Ok(())
}

// ============================================================================
// Variables
// ============================================================================

const OPTIONAL_VARIABLES: &str = r#"{
    "module": "SwiftModule",
    "types": [{ "name": "Counter", "kind": "class" }],
    "variables": [
        { "name": "count", "parent": "Counter", "type": "Int32?", "settable": true },
        { "name": "total", "parent": "Counter", "type": "Int64?", "settable": true },
        { "name": "label", "parent": "Counter", "type": "String?", "settable": true }
    ]
}"#;

#[test]
fn test_optional_variable_combined_into_long() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONAL_VARIABLES)?;
    let java = java(&output, "Counter")?;
    assert!(java.contains("public OptionalInt getCount() {"));
    assert!(java.contains(
        "    long self$ = this.$memoryAddress();\n\
         \x20   long result_combined$ = Counter.$getCount(self$);\n"
    ));
    assert!(java.contains("private static native long $getCount(long selfPointer);"));
    assert!(java.contains("public void setCount(OptionalInt newValue) {"));
    assert!(java.contains("Counter.$setCount((byte) (newValue.isPresent() ? 1 : 0), newValue.orElse(0), self$);"));
    assert!(java.contains(
        "private static native void $setCount(byte newValue_discriminator, int newValue_value, long selfPointer);"
    ));

    let swift = swift(&output)?;
    assert!(swift.contains(
        "  let result_value$ = self$.pointee.count.map {\n\
         \x20   Int64($0) << 32 | Int64(1)\n\
         \x20 } ?? 0\n"
    ));
    assert!(swift.contains(
        "self$.pointee.count = newValue_discriminator == 1 ? Int32(fromJNI: newValue_value, in: environment) : nil"
    ));
    Ok(())
}

#[test]
fn test_optional_variables_use_discriminator_array() -> Result<(), anyhow::Error> {
    let output = jni(OPTIONAL_VARIABLES)?;
    let java = java(&output, "Counter")?;
    assert!(java.contains("private static native long $getTotal(long selfPointer, byte[] result_discriminator$);"));
    assert!(java.contains(
        "    byte[] result$_discriminator$ = new byte[1];\n\
         \x20   long result$ = Counter.$getTotal(self$, result$_discriminator$);\n\
         \x20   return (result$_discriminator$[0] == 1) ? OptionalLong.of(result$) : OptionalLong.empty();\n"
    ));
    assert!(java.contains("Counter.$setTotal((byte) (newValue.isPresent() ? 1 : 0), newValue.orElse(0L), self$);"));

    assert!(java.contains("public Optional<java.lang.String> getLabel() {"));
    assert!(java.contains(
        "private static native java.lang.String $getLabel(long selfPointer, byte[] result_discriminator$);"
    ));
    assert!(java.contains("return (result$_discriminator$[0] == 1) ? Optional.of(result$) : Optional.empty();"));
    assert!(java.contains("public void setLabel(Optional<java.lang.String> newValue) {"));
    assert!(java.contains("Counter.$setLabel((byte) (newValue.isPresent() ? 1 : 0), newValue.orElse(null), self$);"));

    let swift = swift(&output)?;
    assert!(swift.contains("if let innerResult$ = self$.pointee.total {"));
    assert!(swift.contains("if let innerResult$ = self$.pointee.label {"));
    assert!(swift.contains("selfPointer: jlong, result_discriminator$: jbyteArray?) -> jstring? {"));
    assert!(swift.contains(
        "self$.pointee.label = newValue_discriminator == 1 ? String(fromJNI: newValue_value, in: environment) : nil"
    ));
    Ok(())
}

const SUBSCRIPTS: &str = r#"{
    "module": "SwiftModule",
    "types": [{ "name": "MyStruct", "kind": "struct" }],
    "subscripts": [
        { "parent": "MyStruct", "parameters": [{ "name": "index", "type": "Int32" }], "result": "Int32", "settable": true }
    ]
}"#;

#[test]
fn test_subscript_accessors() -> Result<(), anyhow::Error> {
    let output = jni(SUBSCRIPTS)?;
    let java = java(&output, "MyStruct")?;
    assert!(java.contains("public int getSubscript(int index) {"));
    assert!(java.contains("return MyStruct.$getSubscript(index, self$);"));
    assert!(java.contains("private static native int $getSubscript(int index, long selfPointer);"));
    assert!(java.contains("public void setSubscript(int index, int newValue) {"));
    assert!(java.contains("MyStruct.$setSubscript(index, newValue, self$);"));
    assert!(java.contains("private static native void $setSubscript(int index, int newValue, long selfPointer);"));

    let swift = swift(&output)?;
    assert!(swift.contains(
        "return self$.pointee[Int32(fromJNI: index, in: environment)].getJNIValue(in: environment)"
    ));
    assert!(swift.contains(
        "self$.pointee[Int32(fromJNI: index, in: environment)] = Int32(fromJNI: newValue, in: environment)"
    ));
    Ok(())
}

// ============================================================================
// Foundation
// ============================================================================

#[test]
fn test_uuid_crosses_as_string() -> Result<(), anyhow::Error> {
    let output = jni(
        r#"{ "module": "SwiftModule", "functions": [
            { "name": "acceptUUID", "parameters": [{ "name": "uuid", "type": "UUID" }] },
            { "name": "returnUUID", "result": "UUID" }
        ] }"#,
    )?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains("public static void acceptUUID(java.util.UUID uuid) {\n    SwiftModule.$acceptUUID(uuid.toString());\n  }"));
    assert!(java.contains("public static java.util.UUID returnUUID() {\n    return java.util.UUID.fromString(SwiftModule.$returnUUID());\n  }"));

    let swift = swift(&output)?;
    assert!(swift.contains("import Foundation\n"));
    assert!(swift.contains(
        "public func Java_com_example_swift_SwiftModule__00024acceptUUID__Ljava_lang_String_2(environment: UnsafeMutablePointer<JNIEnv?>!, thisClass: jclass, uuid: jstring?) {\n\
         \x20 guard let uuid_unwrapped$ = UUID(uuidString: String(fromJNI: uuid, in: environment)) else {\n\
         \x20   fatalError(\"Invalid UUID passed from Java\")\n\
         \x20 }\n\
         \x20 SwiftModule.acceptUUID(uuid: uuid_unwrapped$)\n"
    ));
    assert!(swift.contains("return SwiftModule.returnUUID().uuidString.getJNIValue(in: environment)"));
    Ok(())
}

// ============================================================================
// Effects
// ============================================================================

#[test]
fn test_async_throwing_class_result() -> Result<(), anyhow::Error> {
    let output = jni(
        r#"{ "module": "SwiftModule", "types": [{ "name": "MyClass", "kind": "class" }],
             "functions": [{ "name": "make", "result": "MyClass", "effects": ["async", "throws"] }] }"#,
    )?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains(
        "public static java.util.concurrent.CompletableFuture<MyClass> make(SwiftArena swiftArena$) {"
    ));
    assert!(java.contains("return MyClass.wrapMemoryAddressUnsafe(futureResult$, swiftArena$);"));

    let swift = swift(&output)?;
    assert!(swift.contains("let swiftResult$ = try await SwiftModule.make()"));
    assert!(swift.contains("UnsafeMutablePointer<MyClass>.allocate(capacity: 1)"));
    assert!(swift.contains("completeExceptionally"));
    Ok(())
}

#[test]
fn test_async_pins_object_arguments_across_the_task() -> Result<(), anyhow::Error> {
    let output = jni(
        r#"{ "module": "SwiftModule", "functions": [
            { "name": "fetch", "parameters": [{ "name": "s", "type": "String" }, { "name": "n", "type": "Int32" }], "result": "String", "effects": ["async"] }
        ] }"#,
    )?;
    let swift = swift(&output)?;
    assert!(swift.contains(
        "thisClass: jclass, s: jstring?, n: jint, result_future: jobject?) {\n\
         \x20 let s = environment.interface.NewGlobalRef(environment, s)\n\
         \x20 let globalFuture = environment.interface.NewGlobalRef(environment, result_future)\n\
         \x20 var task: Task<Void, Never>? = nil\n\
         \x20 #if swift(>=6.2)\n\
         \x20   if #available(macOS 26.0, iOS 26.0, watchOS 26.0, tvOS 26.0, *) {\n\
         \x20     task = Task.immediate {\n\
         \x20       var environment = environment!\n\
         \x20       defer {\n"
    ));
    assert!(swift.contains(
        "  #endif\n\
         \x20 if task == nil {\n\
         \x20   task = Task {\n\
         \x20     var environment = try! JavaVirtualMachine.shared().environment()\n"
    ));
    assert!(!swift.contains("NewGlobalRef(environment, n)"));
    assert_eq!(
        swift
            .matches("deferEnvironment.interface.DeleteGlobalRef(deferEnvironment, s)")
            .count(),
        2
    );
    assert_eq!(
        swift
            .matches("let swiftResult$ = await SwiftModule.fetch(s: String(fromJNI: s, in: environment), n: Int32(fromJNI: n, in: environment))")
            .count(),
        2
    );
    Ok(())
}

// ============================================================================
// Closures
// ============================================================================

#[test]
fn test_closure_gets_functional_interface_and_upcall() -> Result<(), anyhow::Error> {
    let output = jni(
        r#"{ "module": "SwiftModule", "functions": [
            { "name": "emit", "parameters": [{ "name": "callback", "type": "@escaping (Int64, Bool) -> Int64" }] }
        ] }"#,
    )?;
    let java = java(&output, "SwiftModule")?;
    assert!(java.contains(
        "  public static class emit {\n    @FunctionalInterface\n    public interface callback {\n      long apply(long _0, boolean _1);\n    }\n  }\n"
    ));
    assert!(java.contains("public static void emit(com.example.swift.SwiftModule.emit.callback callback) {"));

    let swift = swift(&output)?;
    assert!(swift.contains("let closureContext_callback$ = JavaObjectHolder(object: callback, environment: environment)"));
    assert!(swift.contains("let methodID$ = environment.interface.GetMethodID(environment, class$, \"apply\", \"(JZ)J\")!"));
    assert!(swift.contains("CallLongMethodA"));
    Ok(())
}

#[test]
fn test_unsupported_declarations_are_reported() -> Result<(), anyhow::Error> {
    let output = jni(
        r#"{ "module": "SwiftModule", "functions": [
            { "name": "pair", "result": "(Int, Int)" },
            { "name": "bump", "parameters": [{ "name": "x", "type": "Int", "convention": "inout" }] },
            { "name": "ok" }
        ] }"#,
    )?;
    let skipped: Vec<(&str, String)> = output
        .skipped
        .iter()
        .map(|skipped| (skipped.qualified_name.as_str(), skipped.reason.to_string()))
        .collect();
    assert_eq!(
        skipped,
        [
            ("pair", "Unsupported type '(Int, Int)' in result position".to_string()),
            ("bump", "inout is not supported for type 'Int'".to_string()),
        ]
    );
    assert!(java(&output, "SwiftModule")?.contains("public static void ok() {"));
    Ok(())
}
