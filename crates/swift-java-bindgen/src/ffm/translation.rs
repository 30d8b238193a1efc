//! Translation of lowered signatures to FFM Java signatures.
//!
//! Every Java conversion produced here renders to exactly the arguments
//! of the corresponding `@_cdecl` parameters, in the order the lowering
//! put them: parameters, then `self`, then out parameters.

use swift_java_abi::lowering::parameter_name;
use swift_java_abi::{
    CType, CdeclLowering, FunctionConvention, KnownTypeKind, LoweredFunctionSignature, LoweringError,
    RESULT_NAME, SwiftFunctionType, SwiftGenericRequirement, SwiftSelfParameter, SwiftType, TypePosition,
};

use super::layout::{carrier_type, known_layout, value_layout};
use crate::config::Configuration;
use crate::error::TranslationError;
use crate::java::{
    Arena, FunctionalInterface, JavaConversionStep, JavaParameter, JavaType, OutAllocation, OutParameter,
    TranslatedFunctionSignature, TranslatedParameter, TranslatedResult, java_scalar,
};
use crate::logging::trace;
use crate::model::ImportedFunc;

type Result<T> = std::result::Result<T, TranslationError>;

/// `org.swift.swiftkit.ffm.SwiftAnyType`, the Java form of a metatype.
pub fn swift_any_type() -> JavaType {
    JavaType::class("org.swift.swiftkit.ffm", "SwiftAnyType")
}

/// `MemorySegment`, imported from `java.lang.foreign`.
fn segment() -> JavaType {
    JavaType::imported("MemorySegment")
}

/// A closure parameter and the two interfaces that carry it: the one users
/// implement and the C-level one the upcall stub is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmClosure {
    /// The Swift parameter name, also the name of the user facing interface.
    pub name: String,
    pub java_interface: FunctionalInterface,
    /// Named `Function`, with one parameter per C parameter.
    pub c_interface: FunctionalInterface,
    /// `(name, layout)` of every C parameter.
    pub c_parameter_layouts: Vec<(String, String)>,
    pub c_result_layout: Option<String>,
    /// The C function pointer type, for documentation.
    pub c_type: CType,
    /// Arguments passed from the C-level lambda to the user interface.
    pub apply_arguments: Vec<String>,
}

/// A declaration translated for the FFM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmTranslatedDecl {
    /// Name of the Java method.
    pub name: String,
    /// Name of the `@_cdecl` thunk and of its descriptor class.
    pub thunk_name: String,
    pub closures: Vec<FfmClosure>,
    pub signature: TranslatedFunctionSignature,
    pub lowered: LoweredFunctionSignature,
}

/// Translates declarations to FFM bindings.
#[derive(Debug, Clone, Copy)]
pub struct FfmTranslator<'a> {
    config: &'a Configuration,
}

impl<'a> FfmTranslator<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    pub fn translate(
        &self,
        decl: &ImportedFunc,
        lowered: &LoweredFunctionSignature,
        thunk_name: String,
    ) -> Result<FfmTranslatedDecl> {
        let method_name = decl.java_name();
        let requirements = &decl.signature.generic_requirements;

        let result = self.translate_result(&decl.signature.result)?;
        if result.out_parameters.len() != lowered.result.cdecl_out_parameters.len() {
            return Err(LoweringError::ArityMismatch {
                parameter: RESULT_NAME.to_string(),
                cdecl_parameters: lowered.result.cdecl_out_parameters.len(),
                placeholders: result.out_parameters.len(),
            }
            .into());
        }
        let arena = if result.conversion.requires_swift_arena()
            || result.out_parameters.iter().any(|out| out.uses_arena(Arena::Swift))
        {
            Arena::Swift
        } else {
            Arena::Temporary
        };

        let mut closures = Vec::new();
        let mut parameters = Vec::with_capacity(decl.signature.parameters.len());
        for (index, (parameter, lowered_parameter)) in decl
            .signature
            .parameters
            .iter()
            .zip(&lowered.parameters)
            .enumerate()
        {
            let name = parameter_name(parameter, index);
            let translated = self.translate_parameter(
                &parameter.ty,
                &name,
                requirements,
                arena,
                &method_name,
                &mut closures,
            )?;
            let produced = translated.conversion.argument_count();
            if produced != lowered_parameter.cdecl_parameters.len() {
                return Err(LoweringError::ArityMismatch {
                    parameter: name,
                    cdecl_parameters: lowered_parameter.cdecl_parameters.len(),
                    placeholders: produced,
                }
                .into());
            }
            parameters.push(translated);
        }

        let self_parameter = match &decl.signature.self_parameter {
            Some(SwiftSelfParameter::Instance(_)) => Some(TranslatedParameter {
                java_parameters: Vec::new(),
                conversion: JavaConversionStep::SwiftValueSelfSegment(JavaConversionStep::constant("this").boxed()),
            }),
            Some(SwiftSelfParameter::StaticMethod(_) | SwiftSelfParameter::Initializer(_)) | None => None,
        };

        trace!(decl = %decl.qualified_name(), thunk = %thunk_name, "translated for FFM");
        Ok(FfmTranslatedDecl {
            name: method_name,
            thunk_name,
            closures,
            signature: TranslatedFunctionSignature {
                self_parameter,
                parameters,
                result,
            },
            lowered: lowered.clone(),
        })
    }

    /// The Java class of a nominal type passed as a memory segment.
    fn value_class(&self, ty: &SwiftType) -> Result<JavaType> {
        let Some(nominal) = ty.as_nominal() else {
            return Err(TranslationError::unsupported(ty, TypePosition::Parameter));
        };
        if nominal.decl.is_external {
            let qualified_name = nominal.decl.qualified_name();
            return self
                .config
                .class_mappings
                .get(&qualified_name)
                .map(|class| JavaType::from_qualified_name(class))
                .ok_or(TranslationError::MissingExternalMapping(qualified_name));
        }
        Ok(JavaType::imported(nominal.decl.qualified_name()))
    }

    fn is_value_type(ty: &SwiftType) -> bool {
        ty.is_user_value() || ty.is_known(KnownTypeKind::Data)
    }

    fn translate_parameter(
        &self,
        ty: &SwiftType,
        name: &str,
        requirements: &[SwiftGenericRequirement],
        arena: Arena,
        method_name: &str,
        closures: &mut Vec<FfmClosure>,
    ) -> Result<TranslatedParameter> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Parameter);

        if let Some(scalar) = ty
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok(TranslatedParameter::single(
                JavaParameter::new(name, scalar.java_type()).with_annotations(scalar.annotations.clone()),
                scalar.parameter_conversion(),
            ));
        }

        match ty {
            SwiftType::Nominal(nominal) => match nominal.known_kind() {
                Some(KnownTypeKind::String) => Ok(TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::string()),
                    JavaConversionStep::call_with_arena(JavaConversionStep::Placeholder, "SwiftRuntime.toCString", arena),
                )),
                Some(
                    KnownTypeKind::UnsafeRawPointer
                    | KnownTypeKind::UnsafeMutableRawPointer
                    | KnownTypeKind::UnsafePointer
                    | KnownTypeKind::UnsafeMutablePointer,
                ) => Ok(TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::memory_segment()),
                    JavaConversionStep::Placeholder,
                )),
                Some(KnownTypeKind::UnsafeRawBufferPointer | KnownTypeKind::UnsafeMutableRawBufferPointer) => {
                    Ok(TranslatedParameter::single(
                        JavaParameter::new(name, JavaType::memory_segment()),
                        JavaConversionStep::CommaSeparated(vec![
                            JavaConversionStep::Placeholder,
                            JavaConversionStep::method(JavaConversionStep::Placeholder, "byteSize", Vec::new()),
                        ]),
                    ))
                }
                Some(KnownTypeKind::UnsafeBufferPointer | KnownTypeKind::UnsafeMutableBufferPointer) => {
                    let element_layout = nominal
                        .single_generic_argument()
                        .and_then(SwiftType::known_kind)
                        .and_then(known_layout)
                        .ok_or_else(unsupported)?;
                    Ok(TranslatedParameter::single(
                        JavaParameter::new(name, JavaType::memory_segment()),
                        JavaConversionStep::CommaSeparated(vec![
                            JavaConversionStep::Placeholder,
                            JavaConversionStep::binary(
                                JavaConversionStep::method(JavaConversionStep::Placeholder, "byteSize", Vec::new()),
                                "/",
                                JavaConversionStep::constant(format!("{element_layout}.byteSize()")),
                            ),
                        ]),
                    ))
                }
                _ if Self::is_value_type(ty) => Ok(TranslatedParameter::single(
                    JavaParameter::new(name, self.value_class(ty)?),
                    JavaConversionStep::SwiftValueSelfSegment(JavaConversionStep::Placeholder.boxed()),
                )),
                _ => Err(unsupported()),
            },
            SwiftType::Metatype(_) => Ok(TranslatedParameter::single(
                JavaParameter::new(name, swift_any_type()),
                JavaConversionStep::SwiftValueSelfSegment(JavaConversionStep::Placeholder.boxed()),
            )),
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_parameter(single, name, requirements, arena, method_name, closures),
                _ => {
                    let mut java_parameters = Vec::new();
                    let mut conversions = Vec::with_capacity(elements.len());
                    for (index, element) in elements.iter().enumerate() {
                        let translated = self.translate_parameter(
                            element,
                            &format!("{name}_{index}"),
                            requirements,
                            arena,
                            method_name,
                            closures,
                        )?;
                        java_parameters.extend(translated.java_parameters);
                        conversions.push(translated.conversion.explode(&format!("_{index}")));
                    }
                    Ok(TranslatedParameter {
                        java_parameters,
                        conversion: JavaConversionStep::CommaSeparated(conversions),
                    })
                }
            },
            SwiftType::Function(function) if function.convention == FunctionConvention::C => {
                Ok(TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::memory_segment()),
                    JavaConversionStep::Placeholder,
                ))
            }
            SwiftType::Function(function) => {
                closures.push(self.translate_closure(function, name)?);
                Ok(TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::imported(format!("{method_name}.{name}"))),
                    JavaConversionStep::call_with_arena(
                        JavaConversionStep::Placeholder,
                        format!("{method_name}.$toUpcallStub"),
                        arena,
                    ),
                ))
            }
            SwiftType::Optional(wrapped) => self.translate_optional_parameter(ty, wrapped, name, requirements, arena),
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                match ty.representative_concrete_type(requirements) {
                    Some(concrete) => {
                        self.translate_parameter(&concrete, name, requirements, arena, method_name, closures)
                    }
                    None => Err(unsupported()),
                }
            }
            SwiftType::Composite(_) => Err(unsupported()),
        }
    }

    fn translate_optional_parameter(
        &self,
        ty: &SwiftType,
        wrapped: &SwiftType,
        name: &str,
        requirements: &[SwiftGenericRequirement],
        arena: Arena,
    ) -> Result<TranslatedParameter> {
        if let Some(scalar) = wrapped
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok(TranslatedParameter::single(
                JavaParameter::new(name, scalar.optional().ty).with_annotations(scalar.annotations.clone()),
                JavaConversionStep::call_with_arena(
                    scalar.optional_to_primitive(JavaConversionStep::Placeholder),
                    format!("SwiftRuntime.toOptionalSegment{}", optional_segment_suffix(&scalar.primitive)),
                    arena,
                ),
            ));
        }

        match wrapped {
            SwiftType::Nominal(_) if Self::is_value_type(wrapped) => {
                let class = self.value_class(wrapped)?;
                Ok(TranslatedParameter::single(
                    JavaParameter::new(name, JavaType::optional(class.clone())),
                    JavaConversionStep::method(
                        JavaConversionStep::method(
                            JavaConversionStep::Placeholder,
                            "map",
                            vec![JavaConversionStep::constant(format!("{class}::$memorySegment"))],
                        ),
                        "orElse",
                        vec![JavaConversionStep::constant("MemorySegment.NULL")],
                    ),
                ))
            }
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                match wrapped.representative_concrete_type(requirements) {
                    Some(concrete) => self.translate_optional_parameter(ty, &concrete, name, requirements, arena),
                    None => Err(TranslationError::unsupported(ty, TypePosition::Parameter)),
                }
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_optional_parameter(ty, single, name, requirements, arena),
                _ => Err(TranslationError::unsupported(ty, TypePosition::Parameter)),
            },
            _ => Err(TranslationError::unsupported(ty, TypePosition::Parameter)),
        }
    }

    fn translate_closure(&self, function: &SwiftFunctionType, name: &str) -> Result<FfmClosure> {
        let (lowered, _) = CdeclLowering::new().lower_function_type(function)?;
        let c_type = CType::from_cdecl_type(&lowered)?;
        let SwiftType::Function(lowered) = lowered else {
            return Err(LoweringError::NotCRepresentable(lowered).into());
        };

        let mut c_parameters = Vec::with_capacity(lowered.parameters.len());
        let mut c_parameter_layouts = Vec::with_capacity(lowered.parameters.len());
        for (index, parameter) in lowered.parameters.iter().enumerate() {
            let name = parameter_name(parameter, index);
            let ty = CType::from_cdecl_type(&parameter.ty)?;
            if let Some(layout) = value_layout(&ty) {
                c_parameter_layouts.push((name.clone(), layout));
            }
            c_parameters.push(JavaParameter::new(name, carrier_type(&ty)));
        }
        let c_result = CType::from_cdecl_type(&lowered.result)?;

        let mut java_parameters = Vec::with_capacity(function.parameters.len());
        let mut apply_arguments = Vec::with_capacity(function.parameters.len());
        for (index, parameter) in function.parameters.iter().enumerate() {
            let name = parameter_name(parameter, index);
            match parameter.ty.known_kind() {
                Some(KnownTypeKind::UnsafeRawBufferPointer | KnownTypeKind::UnsafeMutableRawBufferPointer) => {
                    apply_arguments.push(format!("{name}_pointer.reinterpret({name}_count)"));
                    java_parameters.push(JavaParameter::new(name, JavaType::memory_segment()));
                }
                _ => {
                    let ty = CType::from_cdecl_type(&parameter.ty)
                        .map_err(|_| TranslationError::unsupported(&parameter.ty, TypePosition::ClosureParameter))?;
                    apply_arguments.push(name.clone());
                    java_parameters.push(JavaParameter::new(name, carrier_type(&ty)));
                }
            }
        }

        Ok(FfmClosure {
            name: name.to_string(),
            java_interface: FunctionalInterface {
                name: name.to_string(),
                parameters: java_parameters,
                result: carrier_type(&c_result),
            },
            c_interface: FunctionalInterface {
                name: "Function".to_string(),
                parameters: c_parameters,
                result: carrier_type(&c_result),
            },
            c_parameter_layouts,
            c_result_layout: value_layout(&c_result),
            c_type,
            apply_arguments,
        })
    }

    fn translate_result(&self, ty: &SwiftType) -> Result<TranslatedResult> {
        let unsupported = || TranslationError::unsupported(ty, TypePosition::Result);

        if ty.is_void() {
            return Ok(TranslatedResult::void());
        }

        if let Some(scalar) = ty
            .known_kind()
            .and_then(|kind| java_scalar(kind, self.config.unsigned_numbers_mode))
        {
            return Ok(TranslatedResult {
                annotations: scalar.annotations.clone(),
                ..TranslatedResult::direct(scalar.java_type(), scalar.result_conversion())
            });
        }

        let read_result_after_call = |value: JavaConversionStep| {
            JavaConversionStep::Aggregate(vec![
                JavaConversionStep::Print(JavaConversionStep::Placeholder.boxed()),
                value,
            ])
        };

        match ty {
            SwiftType::Nominal(nominal) => match nominal.known_kind() {
                Some(
                    KnownTypeKind::UnsafeRawPointer
                    | KnownTypeKind::UnsafeMutableRawPointer
                    | KnownTypeKind::UnsafePointer
                    | KnownTypeKind::UnsafeMutablePointer,
                ) => Ok(TranslatedResult::direct(
                    JavaType::memory_segment(),
                    JavaConversionStep::Placeholder,
                )),
                Some(
                    KnownTypeKind::UnsafeRawBufferPointer
                    | KnownTypeKind::UnsafeMutableRawBufferPointer
                    | KnownTypeKind::UnsafeBufferPointer
                    | KnownTypeKind::UnsafeMutableBufferPointer,
                ) => {
                    let pointer = format!("{RESULT_NAME}_pointer");
                    let count = format!("{RESULT_NAME}_count");
                    let pointer_layout = known_layout(KnownTypeKind::UnsafeRawPointer).ok_or_else(unsupported)?;
                    let count_layout = known_layout(KnownTypeKind::Int).ok_or_else(unsupported)?;
                    Ok(TranslatedResult {
                        java_type: JavaType::memory_segment(),
                        annotations: Vec::new(),
                        out_parameters: vec![
                            self.out_parameter(&pointer, pointer_layout.clone(), Arena::Temporary),
                            self.out_parameter(&count, count_layout.clone(), Arena::Temporary),
                        ],
                        conversion: read_result_after_call(JavaConversionStep::method(
                            JavaConversionStep::ReadMemorySegment {
                                inner: JavaConversionStep::constant(pointer).boxed(),
                                layout: pointer_layout,
                            },
                            "reinterpret",
                            vec![JavaConversionStep::ReadMemorySegment {
                                inner: JavaConversionStep::constant(count).boxed(),
                                layout: count_layout,
                            }],
                        )),
                    })
                }
                Some(KnownTypeKind::String) => {
                    let pointer_layout = known_layout(KnownTypeKind::UnsafeRawPointer).ok_or_else(unsupported)?;
                    Ok(TranslatedResult {
                        java_type: JavaType::string(),
                        annotations: Vec::new(),
                        out_parameters: vec![self.out_parameter(
                            RESULT_NAME,
                            pointer_layout.clone(),
                            Arena::Temporary,
                        )],
                        conversion: read_result_after_call(JavaConversionStep::call(
                            JavaConversionStep::ReadMemorySegment {
                                inner: JavaConversionStep::constant(RESULT_NAME).boxed(),
                                layout: pointer_layout,
                            },
                            "SwiftRuntime.fromCStringAndFree",
                        )),
                    })
                }
                _ if Self::is_value_type(ty) => {
                    let class = self.value_class(ty)?;
                    Ok(TranslatedResult {
                        java_type: class.clone(),
                        annotations: Vec::new(),
                        out_parameters: vec![self.out_parameter(
                            RESULT_NAME,
                            format!("{class}.$LAYOUT"),
                            Arena::Swift,
                        )],
                        conversion: read_result_after_call(JavaConversionStep::ConstructSwiftValue {
                            inner: JavaConversionStep::constant(RESULT_NAME).boxed(),
                            ty: class,
                        }),
                    })
                }
                _ => Err(unsupported()),
            },
            SwiftType::Metatype(_) => Ok(TranslatedResult::direct(
                swift_any_type(),
                JavaConversionStep::Construct {
                    inner: JavaConversionStep::Placeholder.boxed(),
                    ty: swift_any_type(),
                },
            )),
            SwiftType::Optional(wrapped) => {
                let kind = wrapped.known_kind().ok_or_else(unsupported)?;
                let scalar = java_scalar(kind, self.config.unsigned_numbers_mode).ok_or_else(unsupported)?;
                let layout = known_layout(kind).ok_or_else(unsupported)?;
                let optional = scalar.optional();
                Ok(TranslatedResult {
                    java_type: optional.ty.clone(),
                    annotations: scalar.annotations.clone(),
                    out_parameters: vec![self.out_parameter(RESULT_NAME, layout.clone(), Arena::Temporary)],
                    conversion: JavaConversionStep::ternary(
                        JavaConversionStep::binary(
                            JavaConversionStep::Placeholder,
                            "!=",
                            JavaConversionStep::constant("0"),
                        ),
                        optional.some(scalar.wrap(JavaConversionStep::ReadMemorySegment {
                            inner: JavaConversionStep::constant(RESULT_NAME).boxed(),
                            layout,
                        })),
                        optional.none(),
                    ),
                })
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.translate_result(single),
                _ => Err(unsupported()),
            },
            SwiftType::Function(_)
            | SwiftType::Existential(_)
            | SwiftType::Opaque(_)
            | SwiftType::GenericParameter(_)
            | SwiftType::Composite(_) => Err(unsupported()),
        }
    }

    fn out_parameter(&self, name: &str, layout: String, arena: Arena) -> OutParameter {
        OutParameter {
            name: name.to_string(),
            ty: segment(),
            allocation: OutAllocation::Allocate { layout, arena },
        }
    }
}

/// `SwiftRuntime.toOptionalSegmentInt` and friends.
fn optional_segment_suffix(primitive: &JavaType) -> &'static str {
    match primitive {
        JavaType::Boolean => "Boolean",
        JavaType::Byte => "Byte",
        JavaType::Char => "Char",
        JavaType::Short => "Short",
        JavaType::Int => "Int",
        JavaType::Long => "Long",
        JavaType::Float => "Float",
        JavaType::Double => "Double",
        JavaType::Void | JavaType::Array(_) | JavaType::Class(_) => "",
    }
}
