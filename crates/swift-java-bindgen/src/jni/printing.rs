//! Java and Swift source printing for the JNI backend.

use swift_java_abi::lowering::parameter_name;
use swift_java_abi::{CodePrinter, NominalTypeDecl, SwiftApiKind, SwiftSelfParameter};

use super::native::null_guard;
use super::translation::JniTranslatedDecl;
use super::types::jni_type;
use crate::config::AsyncFuncMode;
use crate::java::{Arena, print_downcall_doc};
use crate::model::ImportedFunc;
use crate::naming::jni_symbol;

/// Imports of every generated Java file.
pub const JAVA_IMPORTS: [&str; 5] = [
    "org.swift.swiftkit.core.*",
    "org.swift.swiftkit.core.util.*",
    "org.swift.swiftkit.core.annotations.*",
    "java.util.*",
    "java.util.concurrent.atomic.AtomicBoolean",
];

const SWIFT_ARENA_TYPE: &str = "SwiftArena";

/// Leading parameters of every JNI entry point.
const THUNK_PARAMETERS: [&str; 2] = ["environment: UnsafeMutablePointer<JNIEnv?>!", "thisClass: jclass"];

const ATTACH_ENVIRONMENT: &str = "try! JavaVirtualMachine.shared().environment()";

pub fn print_java_header(printer: &mut CodePrinter, module_name: &str, package: &str) {
    printer.print("// Generated by jextract-swift");
    printer.print(format!("// Swift module: {module_name}"));
    printer.print_empty_line();
    printer.print(format!("package {package};"));
    printer.print_empty_line();
    for import in JAVA_IMPORTS {
        printer.print(format!("import {import};"));
    }
    printer.print_empty_line();
}

fn print_library_loading(printer: &mut CodePrinter, module_name: &str) {
    printer.print(format!("static final String LIB_NAME = \"{module_name}\";"));
    printer.print_empty_line();
    printer.print_brace_block("static", |printer| {
        printer.print("System.loadLibrary(SwiftLibraries.LIB_NAME_SWIFT_JAVA);");
        printer.print("System.loadLibrary(LIB_NAME);");
    });
}

/// The class holding global functions.
pub fn print_module_class<R>(printer: &mut CodePrinter, module_name: &str, body: impl FnOnce(&mut CodePrinter) -> R) -> R {
    printer.print_brace_block(format!("public final class {module_name}"), |printer| {
        print_library_loading(printer, module_name);
        body(printer)
    })
}

/// The class wrapping a Swift nominal type through its heap allocated
/// `selfPointer`.
pub fn print_type_class<R>(
    printer: &mut CodePrinter,
    module_name: &str,
    decl: &NominalTypeDecl,
    protocols: &[String],
    nested: bool,
    body: impl FnOnce(&mut CodePrinter) -> R,
) -> R {
    let modifiers = if nested { "public static final" } else { "public final" };
    let interfaces = std::iter::once("JNISwiftInstance")
        .chain(protocols.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(", ");
    let name = &decl.name;
    printer.print_brace_block(format!("{modifiers} class {name} implements {interfaces}"), |printer| {
        print_library_loading(printer, module_name);
        printer.print_empty_line();
        printer.print("private final long selfPointer;");
        printer.print("private final AtomicBoolean $state$destroyed = new AtomicBoolean(false);");
        printer.print_empty_line();
        printer.print_brace_block(format!("private {name}(long selfPointer, SwiftArena swiftArena)"), |printer| {
            printer.print("SwiftObjects.requireNonZero(selfPointer, \"selfPointer\");");
            printer.print("this.selfPointer = selfPointer;");
            printer.print_empty_line();
            printer.print("// Only register once we have fully initialized the object since this will need the object pointer.");
            printer.print("swiftArena.register(this);");
        });
        printer.print_empty_line();
        printer.print_brace_block(
            format!("public static {name} wrapMemoryAddressUnsafe(long selfPointer, SwiftArena swiftArena)"),
            |printer| printer.print(format!("return new {name}(selfPointer, swiftArena);")),
        );
        printer.print_brace_block(
            format!("public static {name} wrapMemoryAddressUnsafe(long selfPointer)"),
            |printer| {
                printer.print(format!(
                    "return new {name}(selfPointer, SwiftMemoryManagement.DEFAULT_SWIFT_JAVA_AUTO_ARENA);"
                ));
            },
        );
        printer.print_empty_line();
        printer.print("@Override");
        printer.print_brace_block("public long $memoryAddress()", |printer| {
            printer.print("return this.selfPointer;");
        });
        printer.print_empty_line();
        printer.print("@Override");
        printer.print_brace_block("public AtomicBoolean $statusDestroyedFlag()", |printer| {
            printer.print("return $state$destroyed;");
        });

        let result = body(printer);

        printer.print_empty_line();
        printer.print("@Override");
        for (method, native) in DESCRIPTION_METHODS {
            printer.print_brace_block(format!("public java.lang.String {method}()"), |printer| {
                printer.print(format!("return {name}.{native}(this.$memoryAddress());"));
            });
            printer.print(format!("private static native java.lang.String {native}(long selfPointer);"));
            printer.print_empty_line();
        }
        printer.print("private static native long $typeMetadataAddressDowncall();");
        printer.print("@Override");
        printer.print_brace_block("public long $typeMetadataAddress()", |printer| {
            printer.print(format!("return {name}.$typeMetadataAddressDowncall();"));
        });
        printer.print_empty_line();
        printer.print("private static native void $destroy(long selfPointer);");
        printer.print("@Override");
        printer.print_brace_block("public Runnable $createDestroyFunction()", |printer| {
            printer.print("long self$ = this.$memoryAddress();");
            printer.print_brace_block("if (CallTraces.TRACE_DOWNCALLS)", |printer| {
                printer.print(format!(
                    "CallTraces.traceDowncall(\"{name}.$createDestroyFunction\", \"this\", this, \"self\", self$);"
                ));
            });
            printer.print(format!("return () -> {name}.$destroy(self$);"));
        });
        result
    })
}

/// The Java interface of a Swift protocol. Members print as abstract
/// methods; implementations come from conforming classes.
pub fn print_protocol_interface<R>(
    printer: &mut CodePrinter,
    decl: &NominalTypeDecl,
    nested: bool,
    body: impl FnOnce(&mut CodePrinter) -> R,
) -> R {
    let modifiers = if nested { "public static" } else { "public" };
    printer.print_brace_block(
        format!("{modifiers} interface {} extends JNISwiftInstance", decl.name),
        body,
    )
}

fn java_parameters(translated: &JniTranslatedDecl) -> Vec<String> {
    let signature = &translated.signature;
    let mut parameters: Vec<String> = signature
        .java_parameters()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    if signature.requires_swift_arena() {
        parameters.push(format!("{SWIFT_ARENA_TYPE} {}", Arena::Swift.variable()));
    }
    parameters
}

fn throws_clause(decl: &ImportedFunc) -> &'static str {
    // Async errors complete the future instead.
    if decl.signature.is_throwing() && !decl.signature.is_async() {
        " throws Exception"
    } else {
        ""
    }
}

fn modifiers(decl: &ImportedFunc) -> &'static str {
    if decl.is_static() { "public static" } else { "public" }
}

/// The public class named after a method that holds the functional
/// interfaces of its closure parameters.
fn print_closure_helper_class(printer: &mut CodePrinter, translated: &JniTranslatedDecl) {
    if translated.closures.is_empty() {
        return;
    }
    printer.print_brace_block(format!("public static class {}", translated.name), |printer| {
        for closure in &translated.closures {
            closure.print(printer);
        }
    });
}

/// Abstract method of a protocol interface.
pub fn print_interface_method(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
    printer.print_empty_line();
    print_closure_helper_class(printer, translated);
    print_downcall_doc(printer, &decl.signature_string);
    for annotation in &translated.signature.result.annotations {
        printer.print(annotation);
    }
    printer.print(format!(
        "{} {}({}){};",
        translated.signature.result.java_type,
        translated.name,
        java_parameters(translated).join(", "),
        throws_clause(decl)
    ));
}

/// Closure helpers, the public wrapper and the native method of one
/// declaration.
pub fn print_function(
    printer: &mut CodePrinter,
    decl: &ImportedFunc,
    translated: &JniTranslatedDecl,
    allows_global_automatic_arena: bool,
) {
    printer.print_empty_line();
    print_closure_helper_class(printer, translated);
    print_wrapper_method(printer, decl, translated);
    if allows_global_automatic_arena && translated.signature.requires_swift_arena() {
        printer.print_empty_line();
        print_global_arena_overload(printer, decl, translated);
    }
    printer.print_empty_line();
    print_native_method(printer, translated);
}

fn print_wrapper_method(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
    let signature = &translated.signature;
    print_downcall_doc(printer, &decl.signature_string);
    for annotation in &signature.result.annotations {
        printer.print(annotation);
    }
    let header = format!(
        "{} {} {}({}){}",
        modifiers(decl),
        signature.result.java_type,
        translated.name,
        java_parameters(translated).join(", "),
        throws_clause(decl)
    );
    printer.print_brace_block(header, |printer| print_downcall(printer, decl, translated));
}

/// Convert the arguments, allocate out parameters, call the native method
/// and convert its result.
fn print_downcall(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
    let signature = &translated.signature;
    let mut arguments = Vec::new();
    for (index, (parameter, original)) in signature
        .parameters
        .iter()
        .zip(&decl.signature.parameters)
        .enumerate()
    {
        let name = parameter_name(original, index);
        arguments.extend(parameter.conversion.render(printer, &name));
    }
    if let Some(self_parameter) = &signature.self_parameter {
        arguments.extend(self_parameter.conversion.render(printer, "this"));
    }
    for out in &signature.result.out_parameters {
        out.print(printer);
        arguments.push(out.name.clone());
    }

    let downcall = format!("{}.{}({})", translated.owner, translated.native_name, arguments.join(", "));
    if let Some(value) = signature.result.conversion.render(printer, &downcall) {
        if signature.result.java_type.is_void() {
            printer.print(format!("{value};"));
        } else {
            printer.print(format!("return {value};"));
        }
    }
}

/// The overload that allocates in the default automatic arena.
fn print_global_arena_overload(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
    let signature = &translated.signature;
    let parameters: Vec<String> = signature
        .java_parameters()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let mut arguments: Vec<String> = signature
        .java_parameters()
        .into_iter()
        .map(|parameter| parameter.name.clone())
        .collect();
    arguments.push("SwiftMemoryManagement.DEFAULT_SWIFT_JAVA_AUTO_ARENA".to_string());

    print_downcall_doc(printer, &decl.signature_string);
    for annotation in &signature.result.annotations {
        printer.print(annotation);
    }
    let header = format!(
        "{} {} {}({}){}",
        modifiers(decl),
        signature.result.java_type,
        translated.name,
        parameters.join(", "),
        throws_clause(decl)
    );
    let maybe_return = if signature.result.java_type.is_void() { "" } else { "return " };
    printer.print_brace_block(header, |printer| {
        printer.print(format!("{maybe_return}{}({});", translated.name, arguments.join(", ")));
    });
}

fn print_native_method(printer: &mut CodePrinter, translated: &JniTranslatedDecl) {
    let parameters: Vec<String> = translated
        .native
        .java_parameters()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    printer.print(format!(
        "private static native {} {}({});",
        translated.native.java_result(),
        translated.native_name,
        parameters.join(", ")
    ));
}

pub fn print_swift_header(printer: &mut CodePrinter, imports_foundation: bool) {
    printer.print("// Generated by swift-java");
    printer.print_empty_line();
    printer.print("import SwiftJava");
    printer.print("import SwiftJavaRuntimeSupport");
    if imports_foundation {
        printer.print("import Foundation");
    }
    printer.print_empty_line();
}

/// `@_cdecl("Java_...")` followed by the function header.
fn print_entry_point(
    printer: &mut CodePrinter,
    symbol: &str,
    parameters: &[String],
    result: Option<&str>,
    body: impl FnOnce(&mut CodePrinter),
) {
    let parameters: Vec<&str> = THUNK_PARAMETERS
        .into_iter()
        .chain(parameters.iter().map(String::as_str))
        .collect();
    let returns = result.map(|result| format!(" -> {result}")).unwrap_or_default();
    printer.print(format!("@_cdecl(\"{symbol}\")"));
    printer.print_brace_block(
        format!("public func {symbol}({}){returns}", parameters.join(", ")),
        body,
    );
}

/// `do { body } catch { handler }`
fn print_do_catch(printer: &mut CodePrinter, body: impl FnOnce(&mut CodePrinter), handler: impl FnOnce(&mut CodePrinter)) {
    printer.print("do {");
    printer.indent();
    body(printer);
    printer.outdent();
    printer.print("} catch {");
    printer.indent();
    handler(printer);
    printer.outdent();
    printer.print("}");
}

/// Render the argument conversions and build the Swift call.
fn swift_call(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) -> String {
    let mut values = Vec::with_capacity(decl.signature.parameters.len());
    let mut arguments = Vec::with_capacity(decl.signature.parameters.len());
    for (index, (original, native)) in decl
        .signature
        .parameters
        .iter()
        .zip(&translated.native.parameters)
        .enumerate()
    {
        let value = native.conversion.render(printer, &parameter_name(original, index));
        arguments.push(match &original.argument_label {
            Some(label) => format!("{label}: {value}"),
            None => value.clone(),
        });
        values.push(value);
    }

    let callee = match (&decl.signature.self_parameter, &translated.native.self_parameter) {
        (Some(SwiftSelfParameter::Instance(_)), Some(self_parameter)) => {
            self_parameter.conversion.render(printer, "selfPointer")
        }
        _ => decl
            .parent
            .as_ref()
            .map_or_else(|| decl.module_name.clone(), |parent| parent.qualified_name()),
    };

    let call = match decl.api_kind {
        SwiftApiKind::Initializer => format!("{callee}({})", arguments.join(", ")),
        SwiftApiKind::Function => format!("{callee}.{}({})", decl.name, arguments.join(", ")),
        SwiftApiKind::Getter | SwiftApiKind::EnumCase => format!("{callee}.{}", decl.name),
        SwiftApiKind::Setter => format!("{callee}.{} = {}", decl.name, values.join(", ")),
        SwiftApiKind::SubscriptGetter => format!("{callee}[{}]", arguments.join(", ")),
        SwiftApiKind::SubscriptSetter => match (arguments.split_last(), values.last()) {
            (Some((_, index)), Some(value)) => format!("{callee}[{}] = {value}", index.join(", ")),
            _ => format!("{callee}[]"),
        },
    };
    let mut effects = String::new();
    if decl.signature.is_throwing() {
        effects.push_str("try ");
    }
    if decl.signature.is_async() {
        effects.push_str("await ");
    }
    format!("{effects}{call}")
}

/// The `@_cdecl` entry point the JVM binds to the native method.
pub fn print_thunk(
    printer: &mut CodePrinter,
    decl: &ImportedFunc,
    translated: &JniTranslatedDecl,
    async_func_mode: AsyncFuncMode,
) {
    let native = &translated.native;
    let parameters: Vec<String> = native
        .java_parameters()
        .into_iter()
        .map(|parameter| format!("{}: {}", parameter.name, jni_type(&parameter.ty)))
        .collect();
    let result = native.java_result();
    let result = (!result.is_void()).then(|| jni_type(result));

    print_entry_point(printer, &translated.symbol, &parameters, result, |printer| {
        if native.future.is_some() {
            print_async_body(printer, decl, translated, async_func_mode);
        } else {
            print_sync_body(printer, decl, translated);
        }
    });
}

fn print_sync_body(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl) {
    let call = swift_call(printer, decl, translated);
    let result = &translated.native.result;
    let print_result = |printer: &mut CodePrinter| {
        let value = result.conversion.render(printer, &call);
        if result.java_type.is_void() {
            printer.print(value);
        } else {
            printer.print(format!("return {value}"));
        }
    };
    if !decl.signature.is_throwing() {
        print_result(printer);
        return;
    }
    print_do_catch(printer, print_result, |printer| {
        printer.print("environment.throwAsException(error)");
        if !result.java_type.is_void() {
            if let Some(placeholder) = &result.placeholder_value {
                printer.print(format!("return {placeholder}"));
            }
        }
    });
}

/// Object parameters an async thunk reads after the native frame has
/// returned. They are promoted to global references.
fn pinned_references(translated: &JniTranslatedDecl) -> Vec<&str> {
    translated
        .native
        .parameters
        .iter()
        .chain(&translated.native.self_parameter)
        .flat_map(|parameter| &parameter.parameters)
        .filter(|parameter| !parameter.ty.is_primitive())
        .map(|parameter| parameter.name.as_str())
        .collect()
}

/// Runs the call in a `Task` and completes the Java future with its
/// result. `Task.immediate` is preferred where the runtime has it.
fn print_async_body(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &JniTranslatedDecl, mode: AsyncFuncMode) {
    let pinned = pinned_references(translated);
    for name in &pinned {
        printer.print(format!("let {name} = environment.interface.NewGlobalRef(environment, {name})"));
    }
    printer.print("let globalFuture = environment.interface.NewGlobalRef(environment, result_future)");
    printer.print("var task: Task<Void, Never>? = nil");
    printer.print("#if swift(>=6.2)");
    printer.indent();
    printer.print_brace_block(
        "if #available(macOS 26.0, iOS 26.0, watchOS 26.0, tvOS 26.0, *)",
        |printer| {
            printer.print_brace_block("task = Task.immediate", |printer| {
                printer.print("var environment = environment!");
                print_task_body(printer, decl, translated, &pinned, mode);
            });
        },
    );
    printer.outdent();
    printer.print("#endif");
    printer.print_brace_block("if task == nil", |printer| {
        printer.print_brace_block("task = Task", |printer| {
            printer.print(format!("var environment = {ATTACH_ENVIRONMENT}"));
            print_task_body(printer, decl, translated, &pinned, mode);
        });
    });
}

fn print_task_body(
    printer: &mut CodePrinter,
    decl: &ImportedFunc,
    translated: &JniTranslatedDecl,
    pinned: &[&str],
    mode: AsyncFuncMode,
) {
    let future_cache = match mode {
        AsyncFuncMode::CompletableFuture => "_JNIMethodIDCache.CompletableFuture",
        AsyncFuncMode::LegacyFuture => "_JNIMethodIDCache.SimpleCompletableFuture",
    };
    let result = &translated.native.result;

    printer.print_brace_block("defer", |printer| {
        printer.print(format!("let deferEnvironment = {ATTACH_ENVIRONMENT}"));
        printer.print("deferEnvironment.interface.DeleteGlobalRef(deferEnvironment, globalFuture)");
        for name in pinned {
            printer.print(format!("deferEnvironment.interface.DeleteGlobalRef(deferEnvironment, {name})"));
        }
    });

    let complete = |printer: &mut CodePrinter| {
        let call = swift_call(printer, decl, translated);
        let argument = if result.java_type.is_void() {
            printer.print(&call);
            printer.print(format!("environment = {ATTACH_ENVIRONMENT}"));
            "nil".to_string()
        } else {
            printer.print(format!("let swiftResult$ = {call}"));
            printer.print(format!("environment = {ATTACH_ENVIRONMENT}"));
            let value = result.conversion.render(printer, "swiftResult$");
            if result.java_type.is_primitive() {
                printer.print(format!(
                    "let boxedResult$ = SwiftJavaRuntimeSupport._JNIBoxedConversions.box({value}, in: environment)"
                ));
                "boxedResult$".to_string()
            } else {
                value
            }
        };
        printer.print(format!(
            "_ = environment.interface.CallBooleanMethodA(environment, globalFuture, {future_cache}.complete, [jvalue(l: {argument})])"
        ));
    };

    if !decl.signature.is_throwing() {
        complete(printer);
        return;
    }
    print_do_catch(printer, complete, |printer| {
        printer.print(format!("let catchEnvironment = {ATTACH_ENVIRONMENT}"));
        printer.print(
            "let exception = catchEnvironment.interface.NewObjectA(catchEnvironment, _JNIMethodIDCache.Exception.class, _JNIMethodIDCache.Exception.constructWithMessage, [String(describing: error).getJValue(in: catchEnvironment)])",
        );
        printer.print(format!(
            "_ = catchEnvironment.interface.CallBooleanMethodA(catchEnvironment, globalFuture, {future_cache}.completeExceptionally, [jvalue(l: exception)])"
        ));
    });
}

/// Entry point of `$destroy`: deinitializes and frees the value behind a
/// handle.
pub fn print_destroy_thunk(printer: &mut CodePrinter, package: &str, decl: &NominalTypeDecl) {
    let qualified_name = decl.qualified_name();
    let symbol = jni_symbol(package, &qualified_name.replace('.', "$"), "$destroy", "J");
    print_entry_point(printer, &symbol, &["selfPointer: jlong".to_string()], None, |printer| {
        let pointer = null_guard(
            printer,
            "self$",
            &format!("UnsafeMutablePointer<{qualified_name}>(bitPattern: Int(Int64(fromJNI: selfPointer, in: environment)))"),
            "self",
        );
        printer.print(format!("{pointer}.deinitialize(count: 1)"));
        printer.print(format!("{pointer}.deallocate()"));
    });
}

/// Java method and native method bridging `String(describing:)` and
/// `String(reflecting:)`.
const DESCRIPTION_METHODS: [(&str, &str); 2] = [("toString", "$toString"), ("toDebugString", "$toDebugString")];

/// Entry points of `$toString` and `$toDebugString`.
pub fn print_description_thunks(printer: &mut CodePrinter, package: &str, decl: &NominalTypeDecl) {
    let qualified_name = decl.qualified_name();
    for ((_, native), initializer) in DESCRIPTION_METHODS.into_iter().zip(["describing", "reflecting"]) {
        let symbol = jni_symbol(package, &qualified_name.replace('.', "$"), native, "J");
        print_entry_point(
            printer,
            &symbol,
            &["selfPointer: jlong".to_string()],
            Some("jstring?"),
            |printer| {
                let pointer = null_guard(
                    printer,
                    "self$",
                    &format!(
                        "UnsafeMutablePointer<{qualified_name}>(bitPattern: Int(Int64(fromJNI: selfPointer, in: environment)))"
                    ),
                    "self",
                );
                printer.print(format!(
                    "return String({initializer}: {pointer}.pointee).getJNIValue(in: environment)"
                ));
            },
        );
        printer.print_empty_line();
    }
}

/// Entry point of `$typeMetadataAddressDowncall`.
pub fn print_type_metadata_thunk(printer: &mut CodePrinter, package: &str, decl: &NominalTypeDecl) {
    let qualified_name = decl.qualified_name();
    let symbol = jni_symbol(
        package,
        &qualified_name.replace('.', "$"),
        "$typeMetadataAddressDowncall",
        "",
    );
    print_entry_point(printer, &symbol, &[], Some("jlong"), |printer| {
        printer.print(format!(
            "return Int64(Int(bitPattern: unsafeBitCast({qualified_name}.self, to: UnsafeRawPointer.self))).getJNIValue(in: environment)"
        ));
    });
}
