//! Conversion programs for the Swift side of JNI thunks.
//!
//! For a parameter the placeholder is the JNI parameter name and the
//! rendered expression is the Swift argument. For a result the placeholder
//! is the Swift call expression and the rendered expression is the JNI
//! value returned to Java. Temporaries are named after the placeholder or
//! an explicit `name`.

use std::collections::BTreeSet;

use swift_java_abi::{CodePrinter, ConversionStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeSwiftConversionStep {
    Placeholder,
    /// The placeholder with a suffix, e.g. `arg_discriminator`.
    Suffixed(String),
    Constant(String),
    /// `T(fromJNI: inner, in: environment)`
    InitFromJni {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
    },
    /// `inner.getJNIValue(in: environment)`
    GetJniValue(Box<NativeSwiftConversionStep>),
    /// `inner.getJValue(in: environment)`
    GetJValue(Box<NativeSwiftConversionStep>),
    /// `T(inner)`
    Initialize {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
    },
    /// `inner.member`
    Member {
        inner: Box<NativeSwiftConversionStep>,
        member: String,
    },
    /// `inner!`
    ForceUnwrap(Box<NativeSwiftConversionStep>),
    /// Binds `<placeholder>_unwrapped$` to `T(label: inner)`, trapping with
    /// `message` when the initializer fails.
    FailableInitialize {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
        label: String,
        message: String,
    },
    /// `T(javaThis: inner, environment: environment)`
    JavaObject {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
    },
    BinaryOp {
        lhs: Box<NativeSwiftConversionStep>,
        operator: String,
        rhs: Box<NativeSwiftConversionStep>,
    },
    Ternary {
        condition: Box<NativeSwiftConversionStep>,
        then: Box<NativeSwiftConversionStep>,
        otherwise: Box<NativeSwiftConversionStep>,
    },
    /// Prints `let name = value`; the value is `name`.
    Let {
        name: String,
        value: Box<NativeSwiftConversionStep>,
    },
    /// `discriminator == 1 ? value : nil`
    OptionalFromDiscriminator {
        discriminator: Box<NativeSwiftConversionStep>,
        value: Box<NativeSwiftConversionStep>,
    },
    /// `inner.map { body } [?? default]`, the body rendered against `$0`.
    OptionalMap {
        inner: Box<NativeSwiftConversionStep>,
        body: Box<NativeSwiftConversionStep>,
        default: Option<String>,
    },
    /// The Swift value behind a handle. Prints the null check and the
    /// pointer binding `<name>$`; the value is `<name>$.pointee`, or
    /// `<name>$?.pointee` when the handle may be zero.
    ExtractSwiftValue {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
        /// Defaults to the placeholder.
        name: Option<String>,
        nullable: bool,
    },
    /// Moves the value into a new heap allocation owned by Java. The value
    /// is the allocation's address, `<name>Bits$`.
    AllocateSwiftValue {
        inner: Box<NativeSwiftConversionStep>,
        swift_type: String,
        name: String,
    },
    /// Opens an existential from a value handle (the placeholder) and the
    /// handle of its type metadata.
    OpenExistential {
        inner: Box<NativeSwiftConversionStep>,
        metadata: Box<NativeSwiftConversionStep>,
        protocol: String,
    },
    /// Binds `result$` to the converted value when the optional is
    /// present and reports presence through the `byte[1]` discriminator.
    OptionalWithDiscriminatorArray {
        inner: Box<NativeSwiftConversionStep>,
        /// Rendered against the unwrapped value.
        value: Box<NativeSwiftConversionStep>,
        jni_type: String,
        placeholder_value: String,
        discriminator: String,
    },
    /// A Swift closure calling back into a Java functional interface.
    Closure(Box<UpcallConversionStep>),
}

/// A Swift closure forwarding its arguments to `apply` of the Java object
/// named by the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcallConversionStep {
    pub parameters: Vec<String>,
    /// One per parameter, rendered against it, producing a `jvalue`.
    pub arguments: Vec<NativeSwiftConversionStep>,
    pub method_descriptor: String,
    pub call_method: &'static str,
    /// Rendered against the JNI call expression. `None` for `Void`.
    pub result: Option<NativeSwiftConversionStep>,
    /// Escaping closures hold a global reference to the Java object and
    /// fetch the environment of the calling thread.
    pub escaping: bool,
}

impl NativeSwiftConversionStep {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    pub fn suffixed(suffix: impl Into<String>) -> Self {
        Self::Suffixed(suffix.into())
    }

    pub fn init_from_jni(inner: Self, swift_type: impl Into<String>) -> Self {
        Self::InitFromJni {
            inner: inner.boxed(),
            swift_type: swift_type.into(),
        }
    }

    pub fn get_jni_value(inner: Self) -> Self {
        Self::GetJniValue(inner.boxed())
    }

    pub fn initialize(inner: Self, swift_type: impl Into<String>) -> Self {
        Self::Initialize {
            inner: inner.boxed(),
            swift_type: swift_type.into(),
        }
    }

    pub fn binary(lhs: Self, operator: impl Into<String>, rhs: Self) -> Self {
        Self::BinaryOp {
            lhs: lhs.boxed(),
            operator: operator.into(),
            rhs: rhs.boxed(),
        }
    }

    pub fn let_binding(name: impl Into<String>, value: Self) -> Self {
        Self::Let {
            name: name.into(),
            value: value.boxed(),
        }
    }

    /// Number of distinct JNI parameters the step reads. The placeholder
    /// and each suffixed form count once; closure bodies and values
    /// rendered against temporaries are not counted.
    pub fn placeholder_count(&self) -> usize {
        let mut suffixes = BTreeSet::new();
        self.collect_suffixes(&mut suffixes);
        suffixes.len()
    }

    fn collect_suffixes<'s>(&'s self, suffixes: &mut BTreeSet<&'s str>) {
        match self {
            Self::Placeholder | Self::Closure(_) => {
                suffixes.insert("");
            }
            Self::Suffixed(suffix) => {
                suffixes.insert(suffix);
            }
            Self::Constant(_) => {}
            Self::InitFromJni { inner, .. }
            | Self::GetJniValue(inner)
            | Self::GetJValue(inner)
            | Self::Initialize { inner, .. }
            | Self::Member { inner, .. }
            | Self::ForceUnwrap(inner)
            | Self::FailableInitialize { inner, .. }
            | Self::JavaObject { inner, .. }
            | Self::Let { value: inner, .. }
            | Self::OptionalMap { inner, .. }
            | Self::ExtractSwiftValue { inner, .. }
            | Self::AllocateSwiftValue { inner, .. }
            | Self::OptionalWithDiscriminatorArray { inner, .. } => inner.collect_suffixes(suffixes),
            Self::BinaryOp { lhs, rhs, .. } => {
                lhs.collect_suffixes(suffixes);
                rhs.collect_suffixes(suffixes);
            }
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_suffixes(suffixes);
                then.collect_suffixes(suffixes);
                otherwise.collect_suffixes(suffixes);
            }
            Self::OptionalFromDiscriminator { discriminator, value } => {
                discriminator.collect_suffixes(suffixes);
                value.collect_suffixes(suffixes);
            }
            Self::OpenExistential { inner, metadata, .. } => {
                inner.collect_suffixes(suffixes);
                metadata.collect_suffixes(suffixes);
            }
        }
    }

    /// Render against `placeholder`, printing any statements first.
    pub fn render(&self, printer: &mut CodePrinter, placeholder: &str) -> String {
        match self {
            Self::Placeholder => placeholder.to_string(),
            Self::Suffixed(suffix) => format!("{placeholder}{suffix}"),
            Self::Constant(value) => value.clone(),
            Self::InitFromJni { inner, swift_type } => {
                let inner = inner.render(printer, placeholder);
                format!("{swift_type}(fromJNI: {inner}, in: environment)")
            }
            Self::GetJniValue(inner) => {
                let inner = inner.render(printer, placeholder);
                format!("{inner}.getJNIValue(in: environment)")
            }
            Self::GetJValue(inner) => {
                let inner = inner.render(printer, placeholder);
                format!("{inner}.getJValue(in: environment)")
            }
            Self::Initialize { inner, swift_type } => {
                let inner = inner.render(printer, placeholder);
                format!("{swift_type}({inner})")
            }
            Self::Member { inner, member } => {
                let inner = inner.render(printer, placeholder);
                format!("{inner}.{member}")
            }
            Self::ForceUnwrap(inner) => {
                let inner = inner.render(printer, placeholder);
                format!("{inner}!")
            }
            Self::FailableInitialize {
                inner,
                swift_type,
                label,
                message,
            } => {
                let inner = inner.render(printer, placeholder);
                let binding = format!("{placeholder}_unwrapped$");
                ConversionStep::UnwrapOptional {
                    value: ConversionStep::Placeholder.boxed(),
                    binding: binding.clone(),
                    message: message.clone(),
                }
                .render(printer, &format!("{swift_type}({label}: {inner})"))
                .unwrap_or(binding)
            }
            Self::JavaObject { inner, swift_type } => {
                let inner = inner.render(printer, placeholder);
                format!("{swift_type}(javaThis: {inner}, environment: environment)")
            }
            Self::BinaryOp { lhs, operator, rhs } => {
                let lhs = lhs.render(printer, placeholder);
                let rhs = rhs.render(printer, placeholder);
                format!("{lhs} {operator} {rhs}")
            }
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = condition.render(printer, placeholder);
                let then = then.render(printer, placeholder);
                let otherwise = otherwise.render(printer, placeholder);
                format!("{condition} ? {then} : {otherwise}")
            }
            Self::Let { name, value } => {
                let value = value.render(printer, placeholder);
                printer.print(format!("let {name} = {value}"));
                name.clone()
            }
            Self::OptionalFromDiscriminator { discriminator, value } => {
                let discriminator = discriminator.render(printer, placeholder);
                let value = value.render(printer, placeholder);
                format!("{discriminator} == 1 ? {value} : nil")
            }
            Self::OptionalMap { inner, body, default } => {
                let inner = inner.render(printer, placeholder);
                let mut body_printer = CodePrinter::new();
                body_printer.indent();
                let body = body.render(&mut body_printer, "$0");
                body_printer.print(body);
                let mapped = format!("{inner}.map {{\n{}}}", body_printer.finalize());
                match default {
                    Some(default) => format!("{mapped} ?? {default}"),
                    None => mapped,
                }
            }
            Self::ExtractSwiftValue {
                inner,
                swift_type,
                name,
                nullable,
            } => {
                let base = name.as_deref().unwrap_or(placeholder);
                let handle = inner.render(printer, placeholder);
                if !nullable {
                    printer.print(format!("assert({handle} != 0, \"{base} memory address was null\")"));
                }
                printer.print(format!("let {base}Bits$ = Int(Int64(fromJNI: {handle}, in: environment))"));
                printer.print(format!("let {base}$ = UnsafeMutablePointer<{swift_type}>(bitPattern: {base}Bits$)"));
                if *nullable {
                    return format!("{base}$?.pointee");
                }
                let pointer = format!("{base}$");
                let pointer = null_guard(printer, &pointer, &pointer, base);
                format!("{pointer}.pointee")
            }
            Self::AllocateSwiftValue {
                inner,
                swift_type,
                name,
            } => {
                let value = inner.render(printer, placeholder);
                printer.print(format!("let {name}$ = UnsafeMutablePointer<{swift_type}>.allocate(capacity: 1)"));
                printer.print(format!("{name}$.initialize(to: {value})"));
                printer.print(format!("let {name}Bits$ = Int64(Int(bitPattern: {name}$))"));
                format!("{name}Bits$")
            }
            Self::OpenExistential {
                inner,
                metadata,
                protocol,
            } => {
                let handle = inner.render(printer, placeholder);
                let metadata = metadata.render(printer, placeholder);
                null_guard(
                    printer,
                    &format!("{placeholder}Metadata$"),
                    &format!("UnsafeRawPointer(bitPattern: Int(Int64(fromJNI: {metadata}, in: environment)))"),
                    placeholder,
                );
                null_guard(
                    printer,
                    &format!("{placeholder}Pointer$"),
                    &format!("UnsafeRawPointer(bitPattern: Int(Int64(fromJNI: {handle}, in: environment)))"),
                    placeholder,
                );
                printer.print_brace_block(
                    format!("func {placeholder}Open$<T>(_ type: T.Type) -> any {protocol}"),
                    |printer| {
                        printer.print(format!(
                            "{placeholder}Pointer$.assumingMemoryBound(to: T.self).pointee as! any {protocol}"
                        ));
                    },
                );
                printer.print(format!(
                    "let {placeholder}$ = _openExistential(unsafeBitCast({placeholder}Metadata$, to: Any.Type.self), do: {placeholder}Open$)"
                ));
                format!("{placeholder}$")
            }
            Self::OptionalWithDiscriminatorArray {
                inner,
                value,
                jni_type,
                placeholder_value,
                discriminator,
            } => {
                let inner = inner.render(printer, placeholder);
                printer.print(format!("let result$: {jni_type}"));
                printer.print_brace_block(format!("if let innerResult$ = {inner}"), |printer| {
                    let value = value.render(printer, "innerResult$");
                    printer.print(format!("result$ = {value}"));
                    print_discriminator(printer, discriminator, 1);
                });
                printer.print_brace_block("else", |printer| {
                    printer.print(format!("result$ = {placeholder_value}"));
                    print_discriminator(printer, discriminator, 0);
                });
                "result$".to_string()
            }
            Self::Closure(upcall) => upcall.render(printer, placeholder),
        }
    }
}

/// Binds `binding` to the unwrapped `value`, trapping on a null address.
pub(super) fn null_guard(printer: &mut CodePrinter, binding: &str, value: &str, name: &str) -> String {
    ConversionStep::UnwrapOptional {
        value: ConversionStep::Placeholder.boxed(),
        binding: binding.to_string(),
        message: format!("{name} memory address was null in call to \\(#function)!"),
    }
    .render(printer, value)
    .unwrap_or_else(|| binding.to_string())
}

fn print_discriminator(printer: &mut CodePrinter, discriminator: &str, flag: u8) {
    printer.print(format!("var flag$ = Int8({flag})"));
    printer.print(format!(
        "environment.interface.SetByteArrayRegion(environment, {discriminator}, 0, 1, &flag$)"
    ));
}

impl UpcallConversionStep {
    /// Render the closure literal. The value ends with a newline so the
    /// closing parenthesis of the enclosing call lands on its own line.
    pub fn render(&self, printer: &mut CodePrinter, placeholder: &str) -> String {
        let object = if self.escaping {
            let holder = format!("closureContext_{placeholder}$");
            printer.print(format!(
                "let {holder} = JavaObjectHolder(object: {placeholder}, environment: environment)"
            ));
            format!("{holder}.object")
        } else {
            placeholder.to_string()
        };

        let mut body = CodePrinter::new();
        body.indent();
        if self.escaping {
            body.print("let environment = try! JavaVirtualMachine.shared().environment()");
        }
        body.print(format!("let class$ = environment.interface.GetObjectClass(environment, {object})"));
        body.print(format!(
            "let methodID$ = environment.interface.GetMethodID(environment, class$, \"apply\", \"{}\")!",
            self.method_descriptor
        ));
        let arguments: Vec<String> = self
            .parameters
            .iter()
            .zip(&self.arguments)
            .map(|(parameter, argument)| argument.render(&mut body, parameter))
            .collect();
        body.print(format!("let arguments$: [jvalue] = [{}]", arguments.join(", ")));
        let call = format!(
            "environment.interface.{}(environment, {object}, methodID$, arguments$)",
            self.call_method
        );
        match &self.result {
            Some(result) => {
                let value = result.render(&mut body, &call);
                body.print(format!("return {value}"));
            }
            None => body.print(call),
        }

        let header = if self.parameters.is_empty() {
            "{".to_string()
        } else {
            format!("{{ {} in", self.parameters.join(", "))
        };
        format!("{header}\n{}}}\n", body.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(step: &NativeSwiftConversionStep, placeholder: &str) -> (String, String) {
        let mut printer = CodePrinter::new();
        let value = step.render(&mut printer, placeholder);
        (value, printer.finalize())
    }

    #[test]
    fn test_optional_parameter_from_pair() {
        let step = NativeSwiftConversionStep::OptionalFromDiscriminator {
            discriminator: NativeSwiftConversionStep::suffixed("_discriminator").boxed(),
            value: NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::suffixed("_value"), "Int64")
                .boxed(),
        };
        assert_eq!(
            render(&step, "arg").0,
            "arg_discriminator == 1 ? Int64(fromJNI: arg_value, in: environment) : nil"
        );
    }

    #[test]
    fn test_placeholder_count_counts_distinct_parameters() {
        let pair = NativeSwiftConversionStep::OptionalFromDiscriminator {
            discriminator: NativeSwiftConversionStep::suffixed("_discriminator").boxed(),
            value: NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::suffixed("_value"), "Int64")
                .boxed(),
        };
        assert_eq!(pair.placeholder_count(), 2);

        // The placeholder read twice is still one parameter.
        let doubled = NativeSwiftConversionStep::binary(
            NativeSwiftConversionStep::Placeholder,
            "+",
            NativeSwiftConversionStep::Placeholder,
        );
        assert_eq!(doubled.placeholder_count(), 1);

        let existential = NativeSwiftConversionStep::OpenExistential {
            inner: NativeSwiftConversionStep::Placeholder.boxed(),
            metadata: NativeSwiftConversionStep::suffixed("_typeMetadataAddress").boxed(),
            protocol: "Shape".to_string(),
        };
        assert_eq!(existential.placeholder_count(), 2);
        assert_eq!(NativeSwiftConversionStep::constant("nil").placeholder_count(), 0);
    }

    #[test]
    fn test_combined_optional_result() {
        let step = NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::let_binding(
            "result_value$",
            NativeSwiftConversionStep::OptionalMap {
                inner: NativeSwiftConversionStep::Placeholder.boxed(),
                body: NativeSwiftConversionStep::binary(
                    NativeSwiftConversionStep::binary(
                        NativeSwiftConversionStep::initialize(NativeSwiftConversionStep::Placeholder, "Int64"),
                        "<<",
                        NativeSwiftConversionStep::constant("32"),
                    ),
                    "|",
                    NativeSwiftConversionStep::constant("Int64(1)"),
                )
                .boxed(),
                default: Some("0".to_string()),
            },
        ));
        let (value, printed) = render(&step, "SwiftModule.optionalSugar()");
        assert_eq!(value, "result_value$.getJNIValue(in: environment)");
        assert_eq!(
            printed,
            "let result_value$ = SwiftModule.optionalSugar().map {\n  Int64($0) << 32 | Int64(1)\n} ?? 0\n"
        );
    }

    #[test]
    fn test_extract_self() {
        let step = NativeSwiftConversionStep::ExtractSwiftValue {
            inner: NativeSwiftConversionStep::Placeholder.boxed(),
            swift_type: "MyClass".to_string(),
            name: Some("self".to_string()),
            nullable: false,
        };
        let (value, printed) = render(&step, "selfPointer");
        assert_eq!(value, "self$.pointee");
        assert_eq!(
            printed,
            "assert(selfPointer != 0, \"self memory address was null\")\n\
             let selfBits$ = Int(Int64(fromJNI: selfPointer, in: environment))\n\
             let self$ = UnsafeMutablePointer<MyClass>(bitPattern: selfBits$)\n\
             guard let self$ else {\n  fatalError(\"self memory address was null in call to \\(#function)!\")\n}\n"
        );
    }

    #[test]
    fn test_nullable_handle() {
        let step = NativeSwiftConversionStep::ExtractSwiftValue {
            inner: NativeSwiftConversionStep::Placeholder.boxed(),
            swift_type: "MyClass".to_string(),
            name: None,
            nullable: true,
        };
        let (value, printed) = render(&step, "arg");
        assert_eq!(value, "arg$?.pointee");
        assert!(!printed.contains("assert"));
    }

    #[test]
    fn test_open_existential_traps_on_null_handles() {
        let step = NativeSwiftConversionStep::OpenExistential {
            inner: NativeSwiftConversionStep::Placeholder.boxed(),
            metadata: NativeSwiftConversionStep::suffixed("_typeMetadataAddress").boxed(),
            protocol: "Shape".to_string(),
        };
        let (value, printed) = render(&step, "shape");
        assert_eq!(value, "shape$");
        assert!(printed.starts_with(
            "guard let shapeMetadata$ = UnsafeRawPointer(bitPattern: Int(Int64(fromJNI: shape_typeMetadataAddress, in: environment))) else {\n\
             \x20 fatalError(\"shape memory address was null in call to \\(#function)!\")\n\
             }\n\
             guard let shapePointer$ = UnsafeRawPointer(bitPattern: Int(Int64(fromJNI: shape, in: environment))) else {\n\
             \x20 fatalError(\"shape memory address was null in call to \\(#function)!\")\n\
             }\n"
        ));
        assert!(printed.contains("func shapeOpen$<T>(_ type: T.Type) -> any Shape {"));
    }

    #[test]
    fn test_failable_initializer_traps() {
        let step = NativeSwiftConversionStep::FailableInitialize {
            inner: NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::Placeholder, "String").boxed(),
            swift_type: "UUID".to_string(),
            label: "uuidString".to_string(),
            message: "Invalid UUID passed from Java".to_string(),
        };
        assert_eq!(step.placeholder_count(), 1);
        let (value, printed) = render(&step, "uuid");
        assert_eq!(value, "uuid_unwrapped$");
        assert_eq!(
            printed,
            "guard let uuid_unwrapped$ = UUID(uuidString: String(fromJNI: uuid, in: environment)) else {\n\
             \x20 fatalError(\"Invalid UUID passed from Java\")\n\
             }\n"
        );
    }

    #[test]
    fn test_discriminator_array_result() {
        let step = NativeSwiftConversionStep::OptionalWithDiscriminatorArray {
            inner: NativeSwiftConversionStep::Placeholder.boxed(),
            value: NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Placeholder).boxed(),
            jni_type: "jstring?".to_string(),
            placeholder_value: "String.jniPlaceholderValue".to_string(),
            discriminator: "result_discriminator$".to_string(),
        };
        let (value, printed) = render(&step, "SwiftModule.find()");
        assert_eq!(value, "result$");
        assert_eq!(
            printed,
            "let result$: jstring?\n\
             if let innerResult$ = SwiftModule.find() {\n\
             \x20 result$ = innerResult$.getJNIValue(in: environment)\n\
             \x20 var flag$ = Int8(1)\n\
             \x20 environment.interface.SetByteArrayRegion(environment, result_discriminator$, 0, 1, &flag$)\n\
             }\n\
             else {\n\
             \x20 result$ = String.jniPlaceholderValue\n\
             \x20 var flag$ = Int8(0)\n\
             \x20 environment.interface.SetByteArrayRegion(environment, result_discriminator$, 0, 1, &flag$)\n\
             }\n"
        );
    }

    #[test]
    fn test_upcall_with_arguments_and_result() {
        let upcall = UpcallConversionStep {
            parameters: vec!["_0".to_string(), "_1".to_string()],
            arguments: vec![
                NativeSwiftConversionStep::GetJValue(NativeSwiftConversionStep::Placeholder.boxed()),
                NativeSwiftConversionStep::GetJValue(NativeSwiftConversionStep::Placeholder.boxed()),
            ],
            method_descriptor: "(JZ)J".to_string(),
            call_method: "CallLongMethodA",
            result: Some(NativeSwiftConversionStep::init_from_jni(
                NativeSwiftConversionStep::Placeholder,
                "Int64",
            )),
            escaping: false,
        };
        let (value, printed) = render(&NativeSwiftConversionStep::Closure(Box::new(upcall)), "closure");
        assert!(printed.is_empty());
        assert_eq!(
            value,
            "{ _0, _1 in\n\
             \x20 let class$ = environment.interface.GetObjectClass(environment, closure)\n\
             \x20 let methodID$ = environment.interface.GetMethodID(environment, class$, \"apply\", \"(JZ)J\")!\n\
             \x20 let arguments$: [jvalue] = [_0.getJValue(in: environment), _1.getJValue(in: environment)]\n\
             \x20 return Int64(fromJNI: environment.interface.CallLongMethodA(environment, closure, methodID$, arguments$), in: environment)\n\
             }\n"
        );
    }

    #[test]
    fn test_escaping_upcall_holds_object() {
        let upcall = UpcallConversionStep {
            parameters: Vec::new(),
            arguments: Vec::new(),
            method_descriptor: "()V".to_string(),
            call_method: "CallVoidMethodA",
            result: None,
            escaping: true,
        };
        let (value, printed) = render(&NativeSwiftConversionStep::Closure(Box::new(upcall)), "callback");
        assert_eq!(
            printed,
            "let closureContext_callback$ = JavaObjectHolder(object: callback, environment: environment)\n"
        );
        assert!(value.starts_with("{\n  let environment = try! JavaVirtualMachine.shared().environment()\n"));
        assert!(value.contains("GetObjectClass(environment, closureContext_callback$.object)"));
        assert!(value.contains("let arguments$: [jvalue] = []\n"));
    }
}
