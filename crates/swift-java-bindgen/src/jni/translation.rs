//! Translation of Swift signatures to JNI bindings.
//!
//! A declaration becomes a public Java wrapper, a `private static native`
//! method the wrapper calls, and a Swift `@_cdecl` thunk that the JVM
//! binds to the native method. Each parameter and the result is
//! translated twice: the Java conversion runs in the wrapper, the native
//! conversion in the thunk. Both sides agree on the native parameter list.

use swift_java_abi::lowering::parameter_name;
use swift_java_abi::{
    FunctionConvention, KnownTypeKind, LoweringError, NominalKind, SwiftFunctionType, SwiftGenericRequirement, SwiftSelfParameter,
    SwiftType, TypePosition,
};

use super::native::{NativeSwiftConversionStep, UpcallConversionStep};
use super::types::{call_method, combined_carrier, jni_type, swift_integer};
use crate::config::{AsyncFuncMode, Configuration};
use crate::error::TranslationError;
use crate::java::{
    FunctionalInterface, JavaConversionStep, JavaOptional, JavaParameter, JavaScalar, JavaType, OutAllocation,
    OutParameter, TranslatedFunctionSignature, TranslatedParameter, TranslatedResult, java_scalar, method_descriptor,
};
use crate::logging::trace;
use crate::model::ImportedFunc;
use crate::naming::jni_symbol;

type Result<T> = std::result::Result<T, TranslationError>;

/// Name of the native discriminator out parameter of optional results.
const RESULT_DISCRIMINATOR: &str = "result_discriminator$";

/// A Swift parameter as seen by the native method and the Swift thunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeParameter {
    pub parameters: Vec<JavaParameter>,
    /// Turns the JNI parameters into the Swift argument.
    pub conversion: NativeSwiftConversionStep,
}

impl NativeParameter {
    pub fn single(parameter: JavaParameter, conversion: NativeSwiftConversionStep) -> Self {
        Self {
            parameters: vec![parameter],
            conversion,
        }
    }

    /// Fails when the conversion reads a different number of JNI
    /// parameters than the native method declares.
    fn check_arity(&self, name: &str) -> Result<()> {
        let placeholders = self.conversion.placeholder_count();
        if placeholders != self.parameters.len() {
            return Err(LoweringError::ArityMismatch {
                parameter: name.to_string(),
                cdecl_parameters: self.parameters.len(),
                placeholders,
            }
            .into());
        }
        Ok(())
    }
}

/// A Swift result as returned by the Swift thunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeResult {
    pub java_type: JavaType,
    /// Trailing native parameters the thunk writes to.
    pub out_parameters: Vec<JavaParameter>,
    /// Turns the Swift call expression into the returned JNI value.
    pub conversion: NativeSwiftConversionStep,
    /// Returned after a Swift error was rethrown into Java.
    pub placeholder_value: Option<String>,
}

impl NativeResult {
    fn void() -> Self {
        Self {
            java_type: JavaType::Void,
            out_parameters: Vec::new(),
            conversion: NativeSwiftConversionStep::Placeholder,
            placeholder_value: None,
        }
    }

    fn direct(java_type: JavaType, conversion: NativeSwiftConversionStep, placeholder_value: String) -> Self {
        Self {
            java_type,
            out_parameters: Vec::new(),
            conversion,
            placeholder_value: Some(placeholder_value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFunctionSignature {
    pub self_parameter: Option<NativeParameter>,
    pub parameters: Vec<NativeParameter>,
    pub result: NativeResult,
    /// The future an `async` thunk completes. The native method then
    /// returns `void`.
    pub future: Option<JavaParameter>,
}

impl NativeFunctionSignature {
    /// Parameters of the native method: parameters, `self`, result out
    /// parameters, then the future.
    pub fn java_parameters(&self) -> Vec<&JavaParameter> {
        self.parameters
            .iter()
            .chain(&self.self_parameter)
            .flat_map(|parameter| &parameter.parameters)
            .chain(&self.result.out_parameters)
            .chain(&self.future)
            .collect()
    }

    pub fn java_result(&self) -> &JavaType {
        match self.future {
            Some(_) => &JavaType::Void,
            None => &self.result.java_type,
        }
    }

    /// The descriptor of the parameter list, as mangled into the symbol.
    pub fn parameters_descriptor(&self) -> String {
        self.java_parameters()
            .into_iter()
            .map(|parameter| parameter.ty.descriptor())
            .collect()
    }
}

/// A declaration translated for the JNI backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JniTranslatedDecl {
    /// Name of the Java wrapper.
    pub name: String,
    /// Name of the native method, `$name`.
    pub native_name: String,
    /// The Java class declaring both methods, e.g. `SwiftModule` or
    /// `Outer.Inner`.
    pub owner: String,
    /// The `@_cdecl` name of the Swift thunk.
    pub symbol: String,
    /// Interfaces of closure parameters, printed in a class named after
    /// the method.
    pub closures: Vec<FunctionalInterface>,
    pub signature: TranslatedFunctionSignature,
    pub native: NativeFunctionSignature,
}

/// Where the parameter being translated lives.
struct ParameterContext<'a> {
    owner: &'a str,
    method: &'a str,
    is_async: bool,
    requirements: &'a [SwiftGenericRequirement],
}

/// Translates declarations to JNI bindings.
#[derive(Debug, Clone, Copy)]
pub struct JniTranslator<'a> {
    config: &'a Configuration,
}

impl<'a> JniTranslator<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    pub fn translate(&self, decl: &ImportedFunc) -> Result<JniTranslatedDecl> {
        let owner = decl
            .parent
            .as_ref()
            .map_or_else(|| decl.module_name.clone(), |parent| parent.qualified_name());
        let method_name = decl.java_name();
        let context = ParameterContext {
            owner: &owner,
            method: &method_name,
            is_async: decl.signature.is_async(),
            requirements: &decl.signature.generic_requirements,
        };

        let mut closures = Vec::new();
        let mut parameters = Vec::with_capacity(decl.signature.parameters.len());
        let mut native_parameters = Vec::with_capacity(decl.signature.parameters.len());
        for (index, parameter) in decl.signature.parameters.iter().enumerate() {
            if parameter.is_inout() {
                return Err(TranslationError::InoutNotSupportedForType(parameter.ty.clone()));
            }
            let name = parameter_name(parameter, index);
            let (java, native) = self.translate_parameter(&parameter.ty, &name, &context, &mut closures)?;
            native.check_arity(&name)?;
            parameters.push(java);
            native_parameters.push(native);
        }

        let (self_parameter, native_self) = match &decl.signature.self_parameter {
            Some(SwiftSelfParameter::Instance(parameter)) => (
                Some(TranslatedParameter {
                    java_parameters: Vec::new(),
                    conversion: JavaConversionStep::Aggregate(vec![
                        JavaConversionStep::let_binding(
                            "self$",
                            JavaType::Long,
                            JavaConversionStep::MemoryAddress(JavaConversionStep::constant("this").boxed()),
                        ),
                        JavaConversionStep::constant("self$"),
                    ]),
                }),
                Some(NativeParameter::single(
                    JavaParameter::new("selfPointer", JavaType::Long),
                    NativeSwiftConversionStep::ExtractSwiftValue {
                        inner: NativeSwiftConversionStep::Placeholder.boxed(),
                        swift_type: parameter.ty.to_string(),
                        name: Some("self".to_string()),
                        nullable: false,
                    },
                )),
            ),
            Some(SwiftSelfParameter::StaticMethod(_) | SwiftSelfParameter::Initializer(_)) | None => (None, None),
        };
        if let Some(native_self) = &native_self {
            native_self.check_arity("self")?;
        }

        let (mut result, native_result) = self.translate_result(&decl.signature.result)?;
        let mut future = None;
        if context.is_async {
            let (async_result, future_parameter) = self.translate_async(&decl.signature.result, result, &native_result)?;
            result = async_result;
            future = Some(future_parameter);
        }

        let native = NativeFunctionSignature {
            self_parameter: native_self,
            parameters: native_parameters,
            result: native_result,
            future,
        };
        let native_name = format!("${method_name}");
        let symbol = jni_symbol(
            &self.config.java_package,
            &owner.replace('.', "$"),
            &native_name,
            &native.parameters_descriptor(),
        );
        trace!(decl = %decl.qualified_name(), symbol = %symbol, "translated for JNI");

        Ok(JniTranslatedDecl {
            name: method_name,
            native_name,
            owner,
            symbol,
            closures,
            signature: TranslatedFunctionSignature {
                self_parameter,
                parameters,
                result,
            },
            native,
        })
    }

    /// The Java class of a Swift value passed as a handle.
    fn handle_class(ty: &SwiftType) -> Option<JavaType> {
        let nominal = ty.as_nominal()?;
        let is_handle = (ty.is_user_value() && !nominal.decl.is_external) || ty.is_known(KnownTypeKind::Data);
        is_handle.then(|| JavaType::imported(nominal.decl.qualified_name()))
    }

    /// The configured Java class of an external type, wrapped as a Java
    /// object on the Swift side.
    fn external_class(&self, ty: &SwiftType) -> Option<Result<JavaType>> {
        let nominal = ty.as_nominal()?;
        if !nominal.decl.is_external {
            return None;
        }
        let qualified_name = nominal.decl.qualified_name();
        Some(
            self.config
                .class_mappings
                .get(&qualified_name)
                .map(|class| JavaType::from_qualified_name(class))
                .ok_or(TranslationError::MissingExternalMapping(qualified_name)),
        )
    }

    /// A protocol declared by user code, passed as an existential.
    fn user_protocol(ty: &SwiftType, requirements: &[SwiftGenericRequirement]) -> Option<String> {
        let constraint = ty.protocol_constraint(requirements)?.as_nominal()?;
        (constraint.decl.kind == NominalKind::Protocol && constraint.decl.known_kind.is_none())
            .then(|| constraint.decl.qualified_name())
    }

    fn translate_parameter(
        &self,
        ty: &SwiftType,
        name: &str,
        context: &ParameterContext<'_>,
        closures: &mut Vec<FunctionalInterface>,
    ) -> Result<(TranslatedParameter, NativeParameter)> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Parameter);

        if let Some(scalar) = ty
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok((
                TranslatedParameter::single(
                    JavaParameter::new(name, scalar.java_type()).with_annotations(scalar.annotations.clone()),
                    scalar.parameter_conversion(),
                ),
                NativeParameter::single(
                    JavaParameter::new(name, scalar.primitive),
                    NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::Placeholder, ty.to_string()),
                ),
            ));
        }

        match ty {
            // Crosses as its string form.
            SwiftType::Nominal(_) if ty.is_known(KnownTypeKind::Uuid) => Ok((
                TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::uuid()),
                    JavaConversionStep::method(JavaConversionStep::Placeholder, "toString", Vec::new()),
                ),
                NativeParameter::single(
                    JavaParameter::new(name, JavaType::string()),
                    NativeSwiftConversionStep::FailableInitialize {
                        inner: NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::Placeholder, "String")
                            .boxed(),
                        swift_type: "UUID".to_string(),
                        label: "uuidString".to_string(),
                        message: "Invalid UUID passed from Java".to_string(),
                    },
                ),
            )),
            SwiftType::Nominal(_) if ty.is_known(KnownTypeKind::String) => Ok((
                TranslatedParameter::single(JavaParameter::new(name, JavaType::string()), JavaConversionStep::Placeholder),
                NativeParameter::single(
                    JavaParameter::new(name, JavaType::string()),
                    NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::Placeholder, "String"),
                ),
            )),
            SwiftType::Nominal(_) => {
                if let Some(class) = self.external_class(ty) {
                    let class = class?;
                    return Ok((
                        TranslatedParameter::single(JavaParameter::new(name, class.clone()), JavaConversionStep::Placeholder),
                        NativeParameter::single(
                            JavaParameter::new(name, class),
                            NativeSwiftConversionStep::JavaObject {
                                inner: NativeSwiftConversionStep::ForceUnwrap(NativeSwiftConversionStep::Placeholder.boxed())
                                    .boxed(),
                                swift_type: ty.to_string(),
                            },
                        ),
                    ));
                }
                let class = Self::handle_class(ty).ok_or_else(unsupported)?;
                Ok((
                    TranslatedParameter::single(
                        JavaParameter::new(name, class),
                        JavaConversionStep::MemoryAddress(JavaConversionStep::Placeholder.boxed()),
                    ),
                    NativeParameter::single(
                        JavaParameter::new(name, JavaType::Long),
                        NativeSwiftConversionStep::ExtractSwiftValue {
                            inner: NativeSwiftConversionStep::Placeholder.boxed(),
                            swift_type: ty.to_string(),
                            name: None,
                            nullable: false,
                        },
                    ),
                ))
            }
            SwiftType::Optional(wrapped) => self.translate_optional_parameter(ty, wrapped, name, context),
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_parameter(single, name, context, closures),
                _ => Err(unsupported()),
            },
            SwiftType::Function(function) if function.convention == FunctionConvention::Swift => {
                self.translate_closure(ty, function, name, context, closures)
            }
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                if let Some(concrete) = ty.representative_concrete_type(context.requirements) {
                    return self.translate_parameter(&concrete, name, context, closures);
                }
                let protocol = Self::user_protocol(ty, context.requirements).ok_or_else(unsupported)?;
                Ok((
                    TranslatedParameter::single(
                        JavaParameter::new(name, JavaType::imported(protocol.clone())),
                        JavaConversionStep::CommaSeparated(vec![
                            JavaConversionStep::MemoryAddress(JavaConversionStep::Placeholder.boxed()),
                            JavaConversionStep::TypeMetadataAddress(JavaConversionStep::Placeholder.boxed()),
                        ]),
                    ),
                    NativeParameter {
                        parameters: vec![
                            JavaParameter::new(name, JavaType::Long),
                            JavaParameter::new(format!("{name}_typeMetadataAddress"), JavaType::Long),
                        ],
                        conversion: NativeSwiftConversionStep::OpenExistential {
                            inner: NativeSwiftConversionStep::Placeholder.boxed(),
                            metadata: NativeSwiftConversionStep::suffixed("_typeMetadataAddress").boxed(),
                            protocol,
                        },
                    },
                ))
            }
            SwiftType::Function(_) | SwiftType::Metatype(_) | SwiftType::Composite(_) => Err(unsupported()),
        }
    }

    fn translate_optional_parameter(
        &self,
        ty: &SwiftType,
        wrapped: &SwiftType,
        name: &str,
        context: &ParameterContext<'_>,
    ) -> Result<(TranslatedParameter, NativeParameter)> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Parameter);

        // `(discriminator, value)` pair, `value` read from the optional.
        let pair = |java: JavaParameter, value: JavaConversionStep, native_type: JavaType, swift_type: String| {
            (
                TranslatedParameter::single(
                    java,
                    JavaConversionStep::CommaSeparated(vec![
                        JavaConversionStep::cast(
                            JavaConversionStep::ternary(
                                JavaConversionStep::method(JavaConversionStep::Placeholder, "isPresent", Vec::new()),
                                JavaConversionStep::constant("1"),
                                JavaConversionStep::constant("0"),
                            ),
                            JavaType::Byte,
                        ),
                        value,
                    ]),
                ),
                NativeParameter {
                    parameters: vec![
                        JavaParameter::new(format!("{name}_discriminator"), JavaType::Byte),
                        JavaParameter::new(format!("{name}_value"), native_type),
                    ],
                    conversion: NativeSwiftConversionStep::OptionalFromDiscriminator {
                        discriminator: NativeSwiftConversionStep::suffixed("_discriminator").boxed(),
                        value: NativeSwiftConversionStep::init_from_jni(
                            NativeSwiftConversionStep::suffixed("_value"),
                            swift_type,
                        )
                        .boxed(),
                    },
                },
            )
        };

        if let Some(scalar) = wrapped
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok(pair(
                JavaParameter::new(name, scalar.optional().ty).with_annotations(scalar.annotations.clone()),
                scalar.optional_value_or_zero(JavaConversionStep::Placeholder),
                scalar.primitive,
                wrapped.to_string(),
            ));
        }

        match wrapped {
            SwiftType::Nominal(_) if wrapped.is_known(KnownTypeKind::String) => Ok(pair(
                JavaParameter::new(name, JavaType::optional(JavaType::string())),
                JavaConversionStep::method(
                    JavaConversionStep::Placeholder,
                    "orElse",
                    vec![JavaConversionStep::constant("null")],
                ),
                JavaType::string(),
                "String".to_string(),
            )),
            SwiftType::Nominal(_) => {
                if let Some(class) = self.external_class(wrapped) {
                    let class = class?;
                    return Ok((
                        TranslatedParameter::single(
                            JavaParameter::new(name, JavaType::optional(class.clone())),
                            JavaConversionStep::method(
                                JavaConversionStep::Placeholder,
                                "orElse",
                                vec![JavaConversionStep::constant("null")],
                            ),
                        ),
                        NativeParameter::single(
                            JavaParameter::new(name, class),
                            NativeSwiftConversionStep::OptionalMap {
                                inner: NativeSwiftConversionStep::Placeholder.boxed(),
                                body: NativeSwiftConversionStep::JavaObject {
                                    inner: NativeSwiftConversionStep::Placeholder.boxed(),
                                    swift_type: wrapped.to_string(),
                                }
                                .boxed(),
                                default: None,
                            },
                        ),
                    ));
                }
                let class = Self::handle_class(wrapped).ok_or_else(unsupported)?;
                Ok((
                    TranslatedParameter::single(
                        JavaParameter::new(name, JavaType::optional(class.clone())),
                        JavaConversionStep::method(
                            JavaConversionStep::method(
                                JavaConversionStep::Placeholder,
                                "map",
                                vec![JavaConversionStep::constant(format!("{class}::$memoryAddress"))],
                            ),
                            "orElse",
                            vec![JavaConversionStep::constant("0L")],
                        ),
                    ),
                    NativeParameter::single(
                        JavaParameter::new(name, JavaType::Long),
                        NativeSwiftConversionStep::ExtractSwiftValue {
                            inner: NativeSwiftConversionStep::Placeholder.boxed(),
                            swift_type: wrapped.to_string(),
                            name: None,
                            nullable: true,
                        },
                    ),
                ))
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_optional_parameter(ty, single, name, context),
                _ => Err(unsupported()),
            },
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                match wrapped.representative_concrete_type(context.requirements) {
                    Some(concrete) => self.translate_optional_parameter(ty, &concrete, name, context),
                    None => Err(unsupported()),
                }
            }
            SwiftType::Function(_) | SwiftType::Metatype(_) | SwiftType::Optional(_) | SwiftType::Composite(_) => {
                Err(unsupported())
            }
        }
    }

    /// Closure parameters and results cross as primitives or strings.
    fn closure_value_type(&self, ty: &SwiftType) -> Option<JavaType> {
        if ty.is_known(KnownTypeKind::String) {
            return Some(JavaType::string());
        }
        ty.known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
            .map(|scalar| scalar.primitive)
    }

    fn translate_closure(
        &self,
        ty: &SwiftType,
        function: &SwiftFunctionType,
        name: &str,
        context: &ParameterContext<'_>,
        closures: &mut Vec<FunctionalInterface>,
    ) -> Result<(TranslatedParameter, NativeParameter)> {
        // The call returns before the task runs.
        if context.is_async && !function.is_escaping {
            return Err(TranslationError::unsupported(ty, TypePosition::Parameter));
        }

        let mut parameters = Vec::with_capacity(function.parameters.len());
        let mut names = Vec::with_capacity(function.parameters.len());
        for (index, parameter) in function.parameters.iter().enumerate() {
            let java = self
                .closure_value_type(&parameter.ty)
                .ok_or_else(|| TranslationError::unsupported(&parameter.ty, TypePosition::ClosureParameter))?;
            let parameter_name = format!("_{index}");
            parameters.push(JavaParameter::new(parameter_name.clone(), java));
            names.push(parameter_name);
        }
        let result = if function.result.is_void() {
            JavaType::Void
        } else {
            self.closure_value_type(&function.result)
                .ok_or_else(|| TranslationError::unsupported(&function.result, TypePosition::ClosureResult))?
        };

        let parameter_types: Vec<JavaType> = parameters.iter().map(|parameter| parameter.ty.clone()).collect();
        let upcall = UpcallConversionStep {
            arguments: names
                .iter()
                .map(|_| NativeSwiftConversionStep::GetJValue(NativeSwiftConversionStep::Placeholder.boxed()))
                .collect(),
            parameters: names,
            method_descriptor: method_descriptor(&parameter_types, &result),
            call_method: call_method(&result),
            result: (!result.is_void()).then(|| {
                NativeSwiftConversionStep::init_from_jni(NativeSwiftConversionStep::Placeholder, function.result.to_string())
            }),
            escaping: function.is_escaping,
        };
        closures.push(FunctionalInterface {
            name: name.to_string(),
            parameters,
            result,
        });

        let interface = JavaType::class(
            self.config.java_package.clone(),
            format!("{}.{}.{name}", context.owner, context.method),
        );
        Ok((
            TranslatedParameter::single(JavaParameter::new(name, interface.clone()), JavaConversionStep::Placeholder),
            NativeParameter::single(
                JavaParameter::new(name, interface),
                NativeSwiftConversionStep::Closure(Box::new(upcall)),
            ),
        ))
    }

    fn translate_result(&self, ty: &SwiftType) -> Result<(TranslatedResult, NativeResult)> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Result);

        if ty.is_void() {
            return Ok((TranslatedResult::void(), NativeResult::void()));
        }

        if let Some(scalar) = ty
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok((
                TranslatedResult {
                    annotations: scalar.annotations.clone(),
                    ..TranslatedResult::direct(scalar.java_type(), scalar.result_conversion())
                },
                NativeResult::direct(
                    scalar.primitive,
                    NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Placeholder),
                    format!("{ty}.jniPlaceholderValue"),
                ),
            ));
        }

        match ty {
            SwiftType::Nominal(_) if ty.is_known(KnownTypeKind::Uuid) => Ok((
                TranslatedResult::direct(
                    JavaType::uuid(),
                    JavaConversionStep::call(JavaConversionStep::Placeholder, "java.util.UUID.fromString"),
                ),
                NativeResult::direct(
                    JavaType::string(),
                    NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Member {
                        inner: NativeSwiftConversionStep::Placeholder.boxed(),
                        member: "uuidString".to_string(),
                    }),
                    "String.jniPlaceholderValue".to_string(),
                ),
            )),
            SwiftType::Nominal(_) if ty.is_known(KnownTypeKind::String) => Ok((
                TranslatedResult::direct(JavaType::string(), JavaConversionStep::Placeholder),
                NativeResult::direct(
                    JavaType::string(),
                    NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Placeholder),
                    "String.jniPlaceholderValue".to_string(),
                ),
            )),
            SwiftType::Nominal(_) => {
                if let Some(class) = self.external_class(ty) {
                    let class = class?;
                    return Ok((
                        TranslatedResult::direct(class.clone(), JavaConversionStep::Placeholder),
                        NativeResult::direct(
                            class,
                            NativeSwiftConversionStep::Member {
                                inner: NativeSwiftConversionStep::Placeholder.boxed(),
                                member: "javaThis".to_string(),
                            },
                            "nil".to_string(),
                        ),
                    ));
                }
                let class = Self::handle_class(ty).ok_or_else(unsupported)?;
                Ok((
                    TranslatedResult::direct(
                        class.clone(),
                        JavaConversionStep::WrapMemoryAddress {
                            inner: JavaConversionStep::Placeholder.boxed(),
                            ty: class,
                        },
                    ),
                    NativeResult::direct(
                        JavaType::Long,
                        NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::AllocateSwiftValue {
                            inner: NativeSwiftConversionStep::Placeholder.boxed(),
                            swift_type: ty.to_string(),
                            name: "result".to_string(),
                        }),
                        "Int64.jniPlaceholderValue".to_string(),
                    ),
                ))
            }
            SwiftType::Optional(wrapped) => self.translate_optional_result(ty, wrapped),
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_result(single),
                _ => Err(unsupported()),
            },
            SwiftType::Function(_)
            | SwiftType::Metatype(_)
            | SwiftType::Existential(_)
            | SwiftType::Opaque(_)
            | SwiftType::GenericParameter(_)
            | SwiftType::Composite(_) => Err(unsupported()),
        }
    }

    fn translate_optional_result(&self, ty: &SwiftType, wrapped: &SwiftType) -> Result<(TranslatedResult, NativeResult)> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Result);

        if let Some(scalar) = wrapped
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            let combined = scalar.primitive.bit_width().and_then(combined_carrier);
            let (mut java, native) = match combined {
                Some((carrier, shift)) => Self::combined_optional_result(&scalar, carrier, shift),
                None => Self::discriminated_optional_result(
                    scalar.optional(),
                    scalar.primitive.clone(),
                    scalar.wrap(JavaConversionStep::constant("result$")),
                    NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Placeholder),
                    format!("{wrapped}.jniPlaceholderValue"),
                ),
            };
            java.annotations = scalar.annotations;
            return Ok((java, native));
        }

        match wrapped {
            SwiftType::Nominal(_) if wrapped.is_known(KnownTypeKind::String) => Ok(Self::discriminated_optional_result(
                JavaOptional::of(&JavaType::string()),
                JavaType::string(),
                JavaConversionStep::constant("result$"),
                NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::Placeholder),
                "String.jniPlaceholderValue".to_string(),
            )),
            SwiftType::Nominal(_) => {
                let class = Self::handle_class(wrapped).ok_or_else(unsupported)?;
                Ok(Self::discriminated_optional_result(
                    JavaOptional::of(&class),
                    JavaType::Long,
                    JavaConversionStep::WrapMemoryAddress {
                        inner: JavaConversionStep::constant("result$").boxed(),
                        ty: class,
                    },
                    NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::AllocateSwiftValue {
                        inner: NativeSwiftConversionStep::Placeholder.boxed(),
                        swift_type: wrapped.to_string(),
                        name: "_result".to_string(),
                    }),
                    "0".to_string(),
                ))
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_optional_result(ty, single),
                _ => Err(unsupported()),
            },
            _ => Err(unsupported()),
        }
    }

    /// The value shifted into the high half of `carrier`, the discriminator
    /// in the low byte.
    fn combined_optional_result(scalar: &JavaScalar, carrier: JavaType, shift: u32) -> (TranslatedResult, NativeResult) {
        let primitive = &scalar.primitive;
        let optional = scalar.optional();
        let combined = || JavaConversionStep::constant("result_combined$");
        let shifted = || JavaConversionStep::binary(combined(), ">>", JavaConversionStep::constant(shift.to_string()));
        let value = match primitive {
            JavaType::Boolean => JavaConversionStep::binary(shifted(), "!=", JavaConversionStep::constant("0")),
            JavaType::Float => JavaConversionStep::call(
                JavaConversionStep::cast(shifted(), JavaType::Int),
                "Float.intBitsToFloat",
            ),
            _ => JavaConversionStep::cast(shifted(), primitive.clone()),
        };
        let java = TranslatedResult::direct(
            optional.ty.clone(),
            JavaConversionStep::Aggregate(vec![
                JavaConversionStep::let_binding("result_combined$", carrier.clone(), JavaConversionStep::Placeholder),
                JavaConversionStep::let_binding(
                    "result_discriminator$",
                    JavaType::Byte,
                    JavaConversionStep::cast(
                        JavaConversionStep::binary(combined(), "&", JavaConversionStep::constant("0xFF")),
                        JavaType::Byte,
                    ),
                ),
                JavaConversionStep::let_binding("result_value$", primitive.clone(), value),
                JavaConversionStep::ternary(
                    JavaConversionStep::binary(
                        JavaConversionStep::constant("result_discriminator$"),
                        "==",
                        JavaConversionStep::constant("1"),
                    ),
                    optional.some(scalar.wrap(JavaConversionStep::constant("result_value$"))),
                    optional.none(),
                ),
            ]),
        );

        let integer = swift_integer(&carrier);
        let bits = match primitive {
            JavaType::Boolean => NativeSwiftConversionStep::Ternary {
                condition: NativeSwiftConversionStep::Placeholder.boxed(),
                then: NativeSwiftConversionStep::constant("1").boxed(),
                otherwise: NativeSwiftConversionStep::constant("0").boxed(),
            },
            JavaType::Float => NativeSwiftConversionStep::Member {
                inner: NativeSwiftConversionStep::Placeholder.boxed(),
                member: "bitPattern".to_string(),
            },
            _ => NativeSwiftConversionStep::Placeholder,
        };
        let native = NativeResult::direct(
            carrier,
            NativeSwiftConversionStep::get_jni_value(NativeSwiftConversionStep::let_binding(
                "result_value$",
                NativeSwiftConversionStep::OptionalMap {
                    inner: NativeSwiftConversionStep::Placeholder.boxed(),
                    body: NativeSwiftConversionStep::binary(
                        NativeSwiftConversionStep::binary(
                            NativeSwiftConversionStep::initialize(bits, integer),
                            "<<",
                            NativeSwiftConversionStep::constant(shift.to_string()),
                        ),
                        "|",
                        NativeSwiftConversionStep::constant(format!("{integer}(1)")),
                    )
                    .boxed(),
                    default: Some("0".to_string()),
                },
            )),
            format!("{integer}.jniPlaceholderValue"),
        );
        (java, native)
    }

    /// The value returned directly, presence written to a `byte[1]`.
    fn discriminated_optional_result(
        optional: JavaOptional,
        native_type: JavaType,
        some_value: JavaConversionStep,
        native_value: NativeSwiftConversionStep,
        placeholder_value: String,
    ) -> (TranslatedResult, NativeResult) {
        let java = TranslatedResult {
            java_type: optional.ty.clone(),
            annotations: Vec::new(),
            out_parameters: vec![OutParameter {
                name: "result$_discriminator$".to_string(),
                ty: JavaType::array(JavaType::Byte),
                allocation: OutAllocation::NewArray {
                    element: JavaType::Byte,
                    length: 1,
                },
            }],
            conversion: JavaConversionStep::Aggregate(vec![
                JavaConversionStep::let_binding("result$", native_type.clone(), JavaConversionStep::Placeholder),
                JavaConversionStep::ternary(
                    JavaConversionStep::constant("(result$_discriminator$[0] == 1)"),
                    optional.some(some_value),
                    optional.none(),
                ),
            ]),
        };
        let native = NativeResult {
            out_parameters: vec![JavaParameter::new(RESULT_DISCRIMINATOR, JavaType::array(JavaType::Byte))],
            conversion: NativeSwiftConversionStep::OptionalWithDiscriminatorArray {
                inner: NativeSwiftConversionStep::Placeholder.boxed(),
                value: native_value.boxed(),
                jni_type: jni_type(&native_type).to_string(),
                placeholder_value: placeholder_value.clone(),
                discriminator: RESULT_DISCRIMINATOR.to_string(),
            },
            java_type: native_type,
            placeholder_value: Some(placeholder_value),
        };
        (java, native)
    }

    /// Wrap a translated result in a future completed by the thunk's task.
    fn translate_async(
        &self,
        ty: &SwiftType,
        result: TranslatedResult,
        native: &NativeResult,
    ) -> Result<(TranslatedResult, JavaParameter)> {
        if matches!(ty, SwiftType::Optional(_)) || !native.out_parameters.is_empty() {
            return Err(TranslationError::unsupported(ty, TypePosition::Result));
        }

        let (future_class, returned_class) = match self.config.async_func_mode {
            AsyncFuncMode::CompletableFuture => (
                JavaType::class("java.util.concurrent", "CompletableFuture"),
                JavaType::class("java.util.concurrent", "CompletableFuture"),
            ),
            AsyncFuncMode::LegacyFuture => (
                JavaType::class("org.swift.swiftkit.core", "SimpleCompletableFuture"),
                JavaType::class("java.util.concurrent", "Future"),
            ),
        };
        let future = future_class.with_type_parameters(vec![native.java_type.boxed()]);
        let body = if native.java_type.is_void() {
            JavaConversionStep::Placeholder
        } else {
            result.conversion
        };

        let translated = TranslatedResult {
            java_type: returned_class.with_type_parameters(vec![result.java_type.boxed()]),
            annotations: Vec::new(),
            out_parameters: vec![OutParameter {
                name: "future$".to_string(),
                ty: future.clone(),
                allocation: OutAllocation::New(future.clone()),
            }],
            conversion: JavaConversionStep::Aggregate(vec![
                JavaConversionStep::Print(JavaConversionStep::Placeholder.boxed()),
                JavaConversionStep::method(
                    JavaConversionStep::constant("future$"),
                    "thenApply",
                    vec![JavaConversionStep::Lambda {
                        parameter: "futureResult$".to_string(),
                        body: body.boxed(),
                    }],
                ),
            ]),
        };
        Ok((translated, JavaParameter::new("result_future", future)))
    }
}
