//! Java and Swift source printing for the FFM backend.

use swift_java_abi::{CFunction, CType, CodePrinter, LoweringError, NominalTypeDecl};

use super::layout::{carrier_type, value_layout};
use super::translation::{FfmClosure, FfmTranslatedDecl};
use crate::error::TranslationError;
use crate::java::{Arena, print_downcall_doc};
use crate::model::ImportedFunc;
use crate::naming::type_metadata_thunk_name;

/// Imports of every generated Java file.
pub const JAVA_IMPORTS: [&str; 8] = [
    "org.swift.swiftkit.core.*",
    "org.swift.swiftkit.core.util.*",
    "org.swift.swiftkit.core.annotations.*",
    "org.swift.swiftkit.ffm.*",
    "java.lang.foreign.*",
    "java.lang.invoke.*",
    "java.util.*",
    "java.nio.charset.StandardCharsets",
];

/// Parameter type of the caller supplied arena.
const SWIFT_ARENA_TYPE: &str = "AllocatingSwiftArena";

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

/// `static final String LIB_NAME` and the library loading initializer.
fn print_library_loading(printer: &mut CodePrinter, module_name: &str) {
    printer.print(format!("static final String LIB_NAME = \"{module_name}\";"));
    printer.print("@SuppressWarnings(\"unused\")");
    printer.print("private static final boolean INITIALIZED_LIBS = initializeLibs();");
    printer.print_brace_block("static boolean initializeLibs()", |printer| {
        printer.print("System.loadLibrary(SwiftLibraries.LIB_NAME_SWIFT_CORE);");
        printer.print("System.loadLibrary(SwiftLibraries.LIB_NAME_SWIFT_RUNTIME_FUNCTIONS);");
        printer.print("System.loadLibrary(LIB_NAME);");
        printer.print("return true;");
    });
}

/// The class holding global functions and the symbol lookup used by every
/// descriptor class of the module.
pub fn print_module_class<R>(printer: &mut CodePrinter, module_name: &str, body: impl FnOnce(&mut CodePrinter) -> R) -> R {
    printer.print_brace_block(format!("public final class {module_name}"), |printer| {
        printer.print_brace_block(format!("private {module_name}()"), |printer| {
            printer.print("// Should not be called directly");
        });
        printer.print_empty_line();
        print_library_loading(printer, module_name);
        printer.print("static final Arena LIBRARY_ARENA = Arena.ofAuto();");
        printer.print_empty_line();
        printer.print("static final SymbolLookup SYMBOL_LOOKUP = getSymbolLookup();");
        printer.print_brace_block("private static SymbolLookup getSymbolLookup()", |printer| {
            printer.print("return SymbolLookup.loaderLookup()");
            printer.print("        .or(Linker.nativeLinker().defaultLookup());");
        });
        printer.print_empty_line();
        printer.print_brace_block("public static MemorySegment findOrThrow(String symbol)", |printer| {
            printer.print("return SYMBOL_LOOKUP.find(symbol)");
            printer.print("        .orElseThrow(() -> new UnsatisfiedLinkError(\"unresolved symbol: %s\".formatted(symbol)));");
        });
        body(printer)
    })
}

/// The class wrapping a Swift nominal type.
pub fn print_type_class<R>(
    printer: &mut CodePrinter,
    module_name: &str,
    decl: &NominalTypeDecl,
    nested: bool,
    body: impl FnOnce(&mut CodePrinter) -> R,
) -> R {
    let modifiers = if nested { "public static final" } else { "public final" };
    let interface = if decl.kind.is_reference_type() {
        "SwiftHeapObject"
    } else {
        "SwiftValue"
    };
    let header = format!("{modifiers} class {} extends FFMSwiftInstance implements {interface}", decl.name);
    printer.print_brace_block(header, |printer| {
        print_library_loading(printer, module_name);
        printer.print_empty_line();
        printer.print_brace_block(
            format!("public {}(MemorySegment segment, {SWIFT_ARENA_TYPE} arena)", decl.name),
            |printer| printer.print("super(segment, arena);"),
        );
        printer.print_empty_line();

        let metadata_thunk = type_metadata_thunk_name(decl);
        print_descriptor_class(printer, module_name, &type_metadata_c_function(&metadata_thunk), &[]);
        printer.print("public static final SwiftAnyType TYPE_METADATA =");
        printer.print(format!("  new SwiftAnyType({metadata_thunk}.call());"));
        printer.print_brace_block("public final SwiftAnyType $swiftType()", |printer| {
            printer.print("return TYPE_METADATA;");
        });
        printer.print_empty_line();
        printer.print(
            "public static final GroupLayout $LAYOUT = (GroupLayout) SwiftValueWitnessTable.layoutOfSwiftType(TYPE_METADATA.$memorySegment());",
        );
        printer.print_brace_block("public final GroupLayout $layout()", |printer| {
            printer.print("return $LAYOUT;");
        });

        let result = body(printer);

        printer.print_empty_line();
        printer.print("@Override");
        printer.print_brace_block("public String toString()", |printer| {
            printer.print("return getClass().getSimpleName()");
            printer.print("  + \"(\"");
            printer.print("  + SwiftRuntime.nameOfSwiftType($swiftType().$memorySegment(), true)");
            printer.print("  + \")@\"");
            printer.print("  + $memorySegment();");
        });
        result
    })
}

/// `void *swiftjava_getType_<module>_<type>(void)`
fn type_metadata_c_function(name: &str) -> CFunction {
    CFunction {
        result: CType::Pointer(Box::new(CType::Void)),
        name: name.to_string(),
        parameters: Vec::new(),
        is_variadic: false,
    }
}

/// `FunctionDescriptor.of(...)` over the given layouts.
fn print_function_descriptor(printer: &mut CodePrinter, result: Option<&str>, parameters: &[(String, String)]) {
    if result.is_none() && parameters.is_empty() {
        printer.print("private static final FunctionDescriptor DESC = FunctionDescriptor.ofVoid();");
        return;
    }

    let mut lines = Vec::with_capacity(parameters.len() + 1);
    match result {
        Some(layout) => {
            printer.print("private static final FunctionDescriptor DESC = FunctionDescriptor.of(");
            lines.push(format!("/* -> */{layout}"));
        }
        None => printer.print("private static final FunctionDescriptor DESC = FunctionDescriptor.ofVoid("),
    }
    lines.extend(
        parameters
            .iter()
            .map(|(name, layout)| format!("/* {name}: */{layout}")),
    );
    printer.indent();
    printer.print(lines.join(",\n"));
    printer.outdent();
    printer.print(");");
}

/// The private class binding one `@_cdecl` thunk: its descriptor, address,
/// handle and a `call` method, plus the upcall classes of its closures.
pub fn print_descriptor_class(
    printer: &mut CodePrinter,
    module_name: &str,
    function: &CFunction,
    closures: &[FfmClosure],
) {
    let parameters: Vec<(String, CType)> = function
        .parameters
        .iter()
        .enumerate()
        .map(|(index, parameter)| {
            let name = parameter.name.clone().unwrap_or_else(|| format!("_{index}"));
            (name, parameter.ty.clone())
        })
        .collect();

    printer.print("/**");
    printer.print(" * {@snippet lang=c :");
    printer.print(format!(" * {function}"));
    printer.print(" * }");
    printer.print(" */");
    printer.print_brace_block(format!("private static class {}", function.name), |printer| {
        let layouts: Vec<(String, String)> = parameters
            .iter()
            .filter_map(|(name, ty)| value_layout(ty).map(|layout| (name.clone(), layout)))
            .collect();
        print_function_descriptor(printer, value_layout(&function.result).as_deref(), &layouts);
        printer.print("private static final MemorySegment ADDR =");
        printer.print(format!("  {module_name}.findOrThrow(\"{}\");", function.name));
        printer.print("private static final MethodHandle HANDLE = Linker.nativeLinker().downcallHandle(ADDR, DESC);");

        let result = carrier_type(&function.result);
        let declared: Vec<String> = parameters
            .iter()
            .map(|(name, ty)| format!("{} {name}", carrier_type(ty)))
            .collect();
        let arguments: Vec<&str> = parameters.iter().map(|(name, _)| name.as_str()).collect();
        let arguments = arguments.join(", ");
        let maybe_return = if result.is_void() {
            String::new()
        } else {
            format!("return ({result}) ")
        };
        printer.print_brace_block(
            format!("public static {result} call({})", declared.join(", ")),
            |printer| {
                printer.print("try {");
                printer.indent();
                printer.print_brace_block("if (CallTraces.TRACE_DOWNCALLS)", |printer| {
                    printer.print(format!("CallTraces.traceDowncall({arguments});"));
                });
                printer.print(format!("{maybe_return}HANDLE.invokeExact({arguments});"));
                printer.outdent();
                printer.print("} catch (Throwable ex$) {");
                printer.indent();
                printer.print("throw new AssertionError(\"should not reach here\", ex$);");
                printer.outdent();
                printer.print("}");
            },
        );

        for closure in closures {
            print_closure_descriptor(printer, closure);
        }
    });
}

/// The upcall class of one closure parameter, nested in the descriptor
/// class of its function.
fn print_closure_descriptor(printer: &mut CodePrinter, closure: &FfmClosure) {
    printer.print("/**");
    printer.print(" * {@snippet lang=c :");
    printer.print(format!(" * {}", closure.c_type));
    printer.print(" * }");
    printer.print(" */");
    printer.print_brace_block(format!("private static class ${}", closure.name), |printer| {
        closure.c_interface.print(printer);
        print_function_descriptor(printer, closure.c_result_layout.as_deref(), &closure.c_parameter_layouts);
        printer.print(
            "private static final MethodHandle HANDLE = SwiftRuntime.upcallHandle(Function.class, \"apply\", DESC);",
        );
        printer.print_brace_block(
            "private static MemorySegment toUpcallStub(Function fi, Arena arena)",
            |printer| printer.print("return Linker.nativeLinker().upcallStub(HANDLE.bindTo(fi), DESC, arena);"),
        );
    });
}

/// The public class named after a method that holds the functional
/// interfaces of its closure parameters.
fn print_closure_helper_class(printer: &mut CodePrinter, translated: &FfmTranslatedDecl) {
    if translated.closures.is_empty() {
        return;
    }
    printer.print_brace_block(format!("public static class {}", translated.name), |printer| {
        for closure in &translated.closures {
            closure.java_interface.print(printer);
            let lambda_parameters: Vec<&str> = closure
                .c_interface
                .parameters
                .iter()
                .map(|parameter| parameter.name.as_str())
                .collect();
            let maybe_return = if closure.java_interface.result.is_void() {
                ""
            } else {
                "return "
            };
            printer.print_brace_block(
                format!(
                    "private static MemorySegment $toUpcallStub({} fi, Arena arena)",
                    closure.java_interface.name
                ),
                |printer| {
                    printer.print(format!(
                        "return {}.${}.toUpcallStub(({}) -> {{",
                        translated.thunk_name,
                        closure.name,
                        lambda_parameters.join(", ")
                    ));
                    printer.indent();
                    printer.print(format!("{maybe_return}fi.apply({});", closure.apply_arguments.join(", ")));
                    printer.outdent();
                    printer.print("}, arena);");
                },
            );
        }
    });
}

/// Descriptor class, closure helpers and the public wrapper method of one
/// declaration.
pub fn print_function(
    printer: &mut CodePrinter,
    module_name: &str,
    decl: &ImportedFunc,
    translated: &FfmTranslatedDecl,
    allows_global_automatic_arena: bool,
) -> Result<(), TranslationError> {
    let function = translated.lowered.c_function(&translated.thunk_name)?;
    printer.print_empty_line();
    print_descriptor_class(printer, module_name, &function, &translated.closures);
    printer.print_empty_line();
    print_closure_helper_class(printer, translated);
    print_wrapper_method(printer, decl, translated)?;
    if allows_global_automatic_arena && translated.signature.requires_swift_arena() {
        printer.print_empty_line();
        print_global_arena_overload(printer, decl, translated);
    }
    Ok(())
}

fn modifiers(decl: &ImportedFunc) -> &'static str {
    if decl.is_static() { "public static" } else { "public" }
}

fn print_wrapper_method(
    printer: &mut CodePrinter,
    decl: &ImportedFunc,
    translated: &FfmTranslatedDecl,
) -> Result<(), TranslationError> {
    let signature = &translated.signature;
    let mut parameters: Vec<String> = signature
        .java_parameters()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    if signature.requires_swift_arena() {
        parameters.push(format!("{SWIFT_ARENA_TYPE} {}", Arena::Swift.variable()));
    }

    print_downcall_doc(printer, &decl.signature_string);
    for annotation in &signature.result.annotations {
        printer.print(annotation);
    }
    let header = format!(
        "{} {} {}({})",
        modifiers(decl),
        signature.result.java_type,
        translated.name,
        parameters.join(", ")
    );
    printer.print_brace_block(header, |printer| {
        if !decl.is_static() {
            printer.print("$ensureAlive();");
        }
        if signature.requires_temporary_arena() {
            printer.print_brace_block("try(var arena$ = Arena.ofConfined())", |printer| {
                print_downcall(printer, decl, translated)
            })
        } else {
            print_downcall(printer, decl, translated)
        }
    })
}

/// Convert the arguments, allocate out parameters, call the thunk and
/// convert its result.
fn print_downcall(
    printer: &mut CodePrinter,
    decl: &ImportedFunc,
    translated: &FfmTranslatedDecl,
) -> Result<(), TranslationError> {
    let signature = &translated.signature;
    let mut arguments = Vec::new();
    for (index, (parameter, original)) in signature
        .parameters
        .iter()
        .zip(&decl.signature.parameters)
        .enumerate()
    {
        let name = swift_java_abi::lowering::parameter_name(original, index);
        let value = parameter
            .conversion
            .render(printer, &name)
            .ok_or(LoweringError::MissingValue(name))?;
        arguments.push(value);
    }
    if let Some(self_parameter) = &signature.self_parameter {
        let value = self_parameter
            .conversion
            .render(printer, "this")
            .ok_or_else(|| LoweringError::MissingValue("self".to_string()))?;
        arguments.push(value);
    }
    for out in &signature.result.out_parameters {
        out.print(printer);
        arguments.push(out.name.clone());
    }

    let downcall = format!("{}.call({})", translated.thunk_name, arguments.join(", "));
    if let Some(value) = signature.result.conversion.render(printer, &downcall) {
        if signature.result.java_type.is_void() {
            printer.print(format!("{value};"));
        } else {
            printer.print(format!("return {value};"));
        }
    }
    Ok(())
}

/// The overload that allocates in the global automatic arena.
fn print_global_arena_overload(printer: &mut CodePrinter, decl: &ImportedFunc, translated: &FfmTranslatedDecl) {
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
    arguments.push("SwiftMemoryManagement.GLOBAL_SWIFT_JAVA_ARENA".to_string());

    print_downcall_doc(printer, &decl.signature_string);
    for annotation in &signature.result.annotations {
        printer.print(annotation);
    }
    let header = format!(
        "{} {} {}({})",
        modifiers(decl),
        signature.result.java_type,
        translated.name,
        parameters.join(", ")
    );
    let maybe_return = if signature.result.java_type.is_void() { "" } else { "return " };
    printer.print_brace_block(header, |printer| {
        printer.print(format!("{maybe_return}{}({});", translated.name, arguments.join(", ")));
    });
}

/// `@_cdecl` function returning the metadata pointer of a type.
pub fn print_type_metadata_thunk(printer: &mut CodePrinter, decl: &NominalTypeDecl) {
    let name = type_metadata_thunk_name(decl);
    printer.print(format!("@_cdecl(\"{name}\")"));
    printer.print_brace_block(
        format!("public func {name}() -> UnsafeMutableRawPointer /* Any.Type */"),
        |printer| {
            printer.print(format!(
                "return unsafeBitCast({}.self, to: UnsafeMutableRawPointer.self)",
                decl.qualified_name()
            ));
        },
    );
}

pub fn print_swift_header(printer: &mut CodePrinter, imports_foundation: bool) {
    printer.print("// Generated by swift-java");
    printer.print_empty_line();
    printer.print("import SwiftKitSwift");
    if imports_foundation {
        printer.print("import Foundation");
    }
    printer.print_empty_line();
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use swift_java_abi::{CIntegralType, CParameter};

    use super::*;

    #[test]
    fn test_descriptor_class() {
        let function = CFunction {
            result: CType::Integral(CIntegralType::Ptrdiff),
            name: "swiftjava_SwiftModule_Data_count$get".to_string(),
            parameters: vec![CParameter {
                name: Some("self".to_string()),
                ty: CType::Pointer(Box::new(CType::Void.into_const())),
            }],
            is_variadic: false,
        };
        let mut printer = CodePrinter::new();
        print_descriptor_class(&mut printer, "SwiftModule", &function, &[]);
        let expected = r#"/**
 * {@snippet lang=c :
 * ptrdiff_t swiftjava_SwiftModule_Data_count$get(const void *self)
 * }
 */
private static class swiftjava_SwiftModule_Data_count$get {
  private static final FunctionDescriptor DESC = FunctionDescriptor.of(
    /* -> */SwiftValueLayout.SWIFT_INT,
    /* self: */SwiftValueLayout.SWIFT_POINTER
  );
  private static final MemorySegment ADDR =
    SwiftModule.findOrThrow("swiftjava_SwiftModule_Data_count$get");
  private static final MethodHandle HANDLE = Linker.nativeLinker().downcallHandle(ADDR, DESC);
  public static long call(java.lang.foreign.MemorySegment self) {
    try {
      if (CallTraces.TRACE_DOWNCALLS) {
        CallTraces.traceDowncall(self);
      }
      return (long) HANDLE.invokeExact(self);
    } catch (Throwable ex$) {
      throw new AssertionError("should not reach here", ex$);
    }
  }
}
"#;
        assert_eq!(printer.contents(), expected);
    }

    #[test]
    fn test_void_descriptor_without_parameters() {
        let mut printer = CodePrinter::new();
        print_function_descriptor(&mut printer, None, &[]);
        assert_eq!(
            printer.contents(),
            "private static final FunctionDescriptor DESC = FunctionDescriptor.ofVoid();\n"
        );
    }

    #[test]
    fn test_type_metadata_thunk() {
        let decl = NominalTypeDecl::known(swift_java_abi::KnownTypeKind::Data);
        let decl = NominalTypeDecl {
            module_name: "SwiftModule".to_string(),
            ..decl
        };
        let mut printer = CodePrinter::new();
        print_type_metadata_thunk(&mut printer, &decl);
        assert_eq!(
            printer.contents(),
            r#"@_cdecl("swiftjava_getType_SwiftModule_Data")
public func swiftjava_getType_SwiftModule_Data() -> UnsafeMutableRawPointer /* Any.Type */ {
  return unsafeBitCast(Data.self, to: UnsafeMutableRawPointer.self)
}
"#
        );
    }
}
