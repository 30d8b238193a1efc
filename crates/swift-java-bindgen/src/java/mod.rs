//! The Java side of bindings, shared by both backends.
//!
//! - [`types`]: Java types, parameters and descriptors
//! - [`conversion`]: [`JavaConversionStep`] programs
//!
//! This module also holds the translated signature every translator
//! produces and the scalar and optional mappings both backends agree on.

pub mod conversion;
pub mod types;

use swift_java_abi::{CodePrinter, KnownTypeKind};

pub use conversion::{Arena, JavaConversionStep};
pub use types::{JavaClass, JavaParameter, JavaType, method_descriptor};

use crate::config::UnsignedNumbersMode;

/// Annotation marking a signed Java primitive that carries an unsigned value.
pub const UNSIGNED_ANNOTATION: &str = "@Unsigned";

/// How an out parameter's storage is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutAllocation {
    /// `arena.allocate(layout)`
    Allocate { layout: String, arena: Arena },
    /// `new T[length]`
    NewArray { element: JavaType, length: usize },
    /// `new T<>()`
    New(JavaType),
}

/// Storage declared before the downcall and passed as trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutParameter {
    pub name: String,
    pub ty: JavaType,
    pub allocation: OutAllocation,
}

impl OutParameter {
    pub fn uses_arena(&self, arena: Arena) -> bool {
        matches!(&self.allocation, OutAllocation::Allocate { arena: used, .. } if *used == arena)
    }

    pub fn print(&self, printer: &mut CodePrinter) {
        let allocation = match &self.allocation {
            OutAllocation::Allocate { layout, arena } => format!("{}.allocate({layout})", arena.variable()),
            OutAllocation::NewArray { element, length } => format!("new {element}[{length}]"),
            OutAllocation::New(JavaType::Class(class)) if !class.type_parameters.is_empty() => {
                let raw = JavaType::Class(JavaClass {
                    type_parameters: Vec::new(),
                    ..class.clone()
                });
                format!("new {raw}<>()")
            }
            OutAllocation::New(ty) => format!("new {ty}()"),
        };
        printer.print(format!("{} {} = {allocation};", self.ty, self.name));
    }
}

/// A Swift parameter as seen from Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedParameter {
    /// One Swift parameter may need several Java parameters.
    pub java_parameters: Vec<JavaParameter>,
    /// Turns the Java parameter into downcall arguments.
    pub conversion: JavaConversionStep,
}

impl TranslatedParameter {
    pub fn single(parameter: JavaParameter, conversion: JavaConversionStep) -> Self {
        Self {
            java_parameters: vec![parameter],
            conversion,
        }
    }
}

/// A Swift result as seen from Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedResult {
    pub java_type: JavaType,
    /// Printed on their own line before the method.
    pub annotations: Vec<String>,
    pub out_parameters: Vec<OutParameter>,
    /// Turns the downcall expression into the returned value.
    pub conversion: JavaConversionStep,
}

impl TranslatedResult {
    pub fn direct(java_type: JavaType, conversion: JavaConversionStep) -> Self {
        Self {
            java_type,
            annotations: Vec::new(),
            out_parameters: Vec::new(),
            conversion,
        }
    }

    pub fn void() -> Self {
        Self::direct(
            JavaType::Void,
            JavaConversionStep::Print(JavaConversionStep::Placeholder.boxed()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFunctionSignature {
    pub self_parameter: Option<TranslatedParameter>,
    pub parameters: Vec<TranslatedParameter>,
    pub result: TranslatedResult,
}

impl TranslatedFunctionSignature {
    fn conversions(&self) -> impl Iterator<Item = &JavaConversionStep> {
        self.self_parameter
            .iter()
            .chain(&self.parameters)
            .map(|parameter| &parameter.conversion)
            .chain(std::iter::once(&self.result.conversion))
    }

    /// Whether the Java method takes a `swiftArena$` parameter.
    pub fn requires_swift_arena(&self) -> bool {
        self.conversions().any(JavaConversionStep::requires_swift_arena)
            || self
                .result
                .out_parameters
                .iter()
                .any(|out| out.uses_arena(Arena::Swift))
    }

    /// Whether the downcall is wrapped in a confined `arena$` scope.
    pub fn requires_temporary_arena(&self) -> bool {
        self.conversions().any(JavaConversionStep::requires_temporary_arena)
            || self
                .result
                .out_parameters
                .iter()
                .any(|out| out.uses_arena(Arena::Temporary))
    }

    /// Parameters of the public Java method, excluding `this`.
    pub fn java_parameters(&self) -> Vec<&JavaParameter> {
        self.parameters
            .iter()
            .flat_map(|parameter| &parameter.java_parameters)
            .collect()
    }
}

/// A Java functional interface standing in for a Swift closure type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalInterface {
    /// Simple name, e.g. the closure parameter's name.
    pub name: String,
    pub parameters: Vec<JavaParameter>,
    pub result: JavaType,
}

impl FunctionalInterface {
    pub fn print(&self, printer: &mut CodePrinter) {
        let parameters: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        printer.print("@FunctionalInterface");
        printer.print_brace_block(format!("public interface {}", self.name), |printer| {
            printer.print(format!("{} apply({});", self.result, parameters.join(", ")));
        });
    }
}

/// Guava's wrappers for unsigned 32 and 64 bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuavaUnsigned {
    Integer,
    Long,
}

impl GuavaUnsigned {
    pub fn java_type(self) -> JavaType {
        match self {
            Self::Integer => JavaType::class("com.google.common.primitives", "UnsignedInteger"),
            Self::Long => JavaType::class("com.google.common.primitives", "UnsignedLong"),
        }
    }

    fn bits_method(self) -> &'static str {
        match self {
            Self::Integer => "intValue",
            Self::Long => "longValue",
        }
    }

    /// Unwraps into the primitive carrying the bits.
    pub fn to_bits(self, value: JavaConversionStep) -> JavaConversionStep {
        JavaConversionStep::method(value, self.bits_method(), Vec::new())
    }

    /// Maps an `Optional` of the wrapper to an `Optional` of its bits.
    pub fn optional_to_bits(self, optional: JavaConversionStep) -> JavaConversionStep {
        JavaConversionStep::method(
            optional,
            "map",
            vec![JavaConversionStep::constant(format!(
                "{}::{}",
                self.java_type(),
                self.bits_method()
            ))],
        )
    }

    /// Wraps the primitive carrying the bits.
    pub fn from_bits(self, value: JavaConversionStep) -> JavaConversionStep {
        let function = match self {
            Self::Integer => "fromIntBits",
            Self::Long => "fromLongBits",
        };
        JavaConversionStep::call(value, format!("{}.{function}", self.java_type()))
    }
}

/// How a Swift scalar appears in Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaScalar {
    /// The primitive crossing the boundary.
    pub primitive: JavaType,
    pub annotations: Vec<String>,
    pub guava: Option<GuavaUnsigned>,
}

impl JavaScalar {
    /// The type of the public Java parameter or result.
    pub fn java_type(&self) -> JavaType {
        match self.guava {
            Some(guava) => guava.java_type(),
            None => self.primitive.clone(),
        }
    }

    pub fn parameter_conversion(&self) -> JavaConversionStep {
        match self.guava {
            Some(guava) => guava.to_bits(JavaConversionStep::Placeholder),
            None => JavaConversionStep::Placeholder,
        }
    }

    pub fn result_conversion(&self) -> JavaConversionStep {
        self.wrap(JavaConversionStep::Placeholder)
    }

    /// Turns the primitive `value` into the public Java value.
    pub fn wrap(&self, value: JavaConversionStep) -> JavaConversionStep {
        match self.guava {
            Some(guava) => guava.from_bits(value),
            None => value,
        }
    }

    /// The optional of the public type: `OptionalInt` for a plain `int`,
    /// `Optional<UnsignedInteger>` when wrapped.
    pub fn optional(&self) -> JavaOptional {
        JavaOptional::of(&self.java_type())
    }

    /// Converts an optional of the public type to the optional of the
    /// primitive, e.g. `Optional<UnsignedInteger>` to `OptionalInt`.
    pub fn optional_to_primitive(&self, optional: JavaConversionStep) -> JavaConversionStep {
        let Some(guava) = self.guava else {
            return optional;
        };
        let primitive = JavaOptional::of(&self.primitive);
        let reference = |method: &str| JavaConversionStep::constant(format!("{}::{method}", primitive.class_name));
        JavaConversionStep::method(
            JavaConversionStep::method(guava.optional_to_bits(optional), "map", vec![reference("of")]),
            "orElseGet",
            vec![reference("empty")],
        )
    }

    /// The primitive carried by an optional of the public type, or `zero`
    /// when it is empty.
    pub fn optional_value_or_zero(&self, optional: JavaConversionStep) -> JavaConversionStep {
        let bits = match self.guava {
            Some(guava) => guava.optional_to_bits(optional),
            None => optional,
        };
        JavaConversionStep::method(
            bits,
            "orElse",
            vec![JavaConversionStep::constant(self.primitive.zero_literal())],
        )
    }
}

/// The Java form of a scalar known type. `UInt16` is always `char`.
pub fn java_scalar(kind: KnownTypeKind, mode: UnsignedNumbersMode) -> Option<JavaScalar> {
    let plain = |primitive| JavaScalar {
        primitive,
        annotations: Vec::new(),
        guava: None,
    };
    let unsigned = |primitive, guava| match (mode, guava) {
        (UnsignedNumbersMode::WrapGuava, Some(guava)) => JavaScalar {
            primitive,
            annotations: Vec::new(),
            guava: Some(guava),
        },
        _ => JavaScalar {
            primitive,
            annotations: vec![UNSIGNED_ANNOTATION.to_string()],
            guava: None,
        },
    };
    let scalar = match kind {
        KnownTypeKind::Bool => plain(JavaType::Boolean),
        KnownTypeKind::Int8 => plain(JavaType::Byte),
        KnownTypeKind::Int16 => plain(JavaType::Short),
        KnownTypeKind::Int32 => plain(JavaType::Int),
        KnownTypeKind::Int64 | KnownTypeKind::Int => plain(JavaType::Long),
        KnownTypeKind::Float => plain(JavaType::Float),
        KnownTypeKind::Double => plain(JavaType::Double),
        KnownTypeKind::UInt16 => plain(JavaType::Char),
        KnownTypeKind::UInt8 => unsigned(JavaType::Byte, None),
        KnownTypeKind::UInt32 => unsigned(JavaType::Int, Some(GuavaUnsigned::Integer)),
        KnownTypeKind::UInt64 | KnownTypeKind::UInt => unsigned(JavaType::Long, Some(GuavaUnsigned::Long)),
        _ => return None,
    };
    Some(scalar)
}

/// `java.util` optional class for a primitive value: `OptionalInt`,
/// `OptionalLong`, `OptionalDouble`, or `Optional<Boxed>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaOptional {
    pub ty: JavaType,
    class_name: String,
}

impl JavaOptional {
    pub fn of(value: &JavaType) -> Self {
        let specialized = match value {
            JavaType::Int => Some("OptionalInt"),
            JavaType::Long => Some("OptionalLong"),
            JavaType::Double => Some("OptionalDouble"),
            _ => None,
        };
        match specialized {
            Some(name) => Self {
                ty: JavaType::imported(name),
                class_name: name.to_string(),
            },
            None => Self {
                ty: JavaType::optional(value.clone()),
                class_name: "Optional".to_string(),
            },
        }
    }

    /// `OptionalInt.of(value)`
    pub fn some(&self, value: JavaConversionStep) -> JavaConversionStep {
        JavaConversionStep::call(value, format!("{}.of", self.class_name))
    }

    /// `OptionalInt.empty()`
    pub fn none(&self) -> JavaConversionStep {
        JavaConversionStep::constant(format!("{}.empty()", self.class_name))
    }
}

/// Print the Javadoc echoing the Swift declaration.
pub fn print_downcall_doc(printer: &mut CodePrinter, swift_signature: &str) {
    printer.print("/**");
    printer.print(" * Downcall to Swift:");
    printer.print(" * {@snippet lang=swift :");
    for line in swift_signature.lines() {
        printer.print(format!(" * {line}"));
    }
    printer.print(" * }");
    printer.print(" */");
}
