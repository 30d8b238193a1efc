//! Lowering of Swift signatures to `@_cdecl` entry points.
//!
//! [`CdeclLowering`] maps every parameter and the result of a Swift
//! function signature onto C-compatible parameters, together with the
//! [`ConversionStep`] that turns the C values back into the Swift value the
//! original API expects (or the Swift result into the C result).

use crate::conversion::{ConversionStep, LabeledArgument};
use crate::ctype::{CFunction, CType};
use crate::error::{LoweringError, TypePosition};
use crate::printer::CodePrinter;
use crate::swift::{
    FunctionConvention, KnownTypeKind, NominalKind, ParameterConvention, SwiftApiKind, SwiftFunctionSignature,
    SwiftFunctionType, SwiftGenericRequirement, SwiftNominalType, SwiftParameter, SwiftSelfParameter, SwiftType,
};

type Result<T> = std::result::Result<T, LoweringError>;

/// Name of the indirect result parameter.
pub const RESULT_NAME: &str = "_result";

fn known(kind: KnownTypeKind) -> SwiftType {
    SwiftType::known(kind)
}

fn raw_pointer(mutable: bool) -> SwiftType {
    if mutable {
        known(KnownTypeKind::UnsafeMutableRawPointer)
    } else {
        known(KnownTypeKind::UnsafeRawPointer)
    }
}

fn is_c_representable(ty: &SwiftType) -> bool {
    CType::from_cdecl_type(ty).is_ok()
}

fn is_scalar(ty: &SwiftType) -> bool {
    ty.known_kind().is_some_and(KnownTypeKind::is_scalar)
}

/// The name a parameter is referred to by in a thunk.
pub fn parameter_name(parameter: &SwiftParameter, index: usize) -> String {
    parameter
        .parameter_name
        .clone()
        .unwrap_or_else(|| format!("_{index}"))
}

/// `label: value`, with `&` for inout arguments.
fn call_arguments(arguments: &[(&SwiftParameter, String)]) -> Vec<String> {
    arguments
        .iter()
        .map(|(parameter, value)| {
            let value = if parameter.is_inout() {
                format!("&{value}")
            } else {
                value.clone()
            };
            match &parameter.argument_label {
                Some(label) => format!("{label}: {value}"),
                None => value,
            }
        })
        .collect()
}

/// One Swift parameter and the C parameters it was lowered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredParameter {
    /// A single Swift value may need several C parameters, e.g. a buffer
    /// pointer becomes `(pointer, count)`.
    pub cdecl_parameters: Vec<SwiftParameter>,
    /// Rebuilds the Swift argument from the C parameters.
    pub conversion: ConversionStep,
}

impl LoweredParameter {
    /// Fails when the conversion consumes a different number of values than
    /// there are C parameters.
    pub fn new(name: &str, cdecl_parameters: Vec<SwiftParameter>, conversion: ConversionStep) -> Result<Self> {
        let placeholders = conversion.placeholder_count();
        if placeholders != cdecl_parameters.len() {
            return Err(LoweringError::ArityMismatch {
                parameter: name.to_string(),
                cdecl_parameters: cdecl_parameters.len(),
                placeholders,
            });
        }
        Ok(Self {
            cdecl_parameters,
            conversion,
        })
    }

    fn single(name: &str, ty: SwiftType, conversion: ConversionStep) -> Result<Self> {
        Self::new(name, vec![SwiftParameter::unlabeled(name, ty)], conversion)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredResult {
    /// Return type of the thunk.
    pub cdecl_result_type: SwiftType,
    /// Caller-provided storage the thunk writes results into.
    pub cdecl_out_parameters: Vec<SwiftParameter>,
    /// Converts the Swift result into the thunk's result.
    pub conversion: ConversionStep,
}

impl LoweredResult {
    fn direct(ty: SwiftType, conversion: ConversionStep) -> Self {
        Self {
            cdecl_result_type: ty,
            cdecl_out_parameters: Vec::new(),
            conversion,
        }
    }

    fn indirect(cdecl_out_parameters: Vec<SwiftParameter>, conversion: ConversionStep) -> Self {
        Self {
            cdecl_result_type: SwiftType::void(),
            cdecl_out_parameters,
            conversion,
        }
    }
}

/// A Swift signature together with its `@_cdecl` counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredFunctionSignature {
    pub original: SwiftFunctionSignature,
    pub self_parameter: Option<LoweredParameter>,
    pub parameters: Vec<LoweredParameter>,
    pub result: LoweredResult,
}

/// Lowers Swift API to C API.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdeclLowering;

impl CdeclLowering {
    pub fn new() -> Self {
        Self
    }

    /// Lower a signature to a `@_cdecl` signature.
    ///
    /// `async` and `throws` functions have no C form and are rejected.
    pub fn lower_function_signature(&self, signature: &SwiftFunctionSignature) -> Result<LoweredFunctionSignature> {
        if let Some(effect) = signature.effects.first() {
            return Err(LoweringError::EffectNotSupported(*effect));
        }
        let requirements = &signature.generic_requirements;

        let self_parameter = match &signature.self_parameter {
            Some(SwiftSelfParameter::Instance(parameter)) => Some(self.lower_parameter_at(
                &parameter.ty,
                parameter.convention,
                parameter.parameter_name.as_deref().unwrap_or("self"),
                requirements,
                TypePosition::SelfParameter,
            )?),
            Some(SwiftSelfParameter::StaticMethod(_) | SwiftSelfParameter::Initializer(_)) | None => None,
        };

        let parameters = signature
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                self.lower_parameter_at(
                    &parameter.ty,
                    parameter.convention,
                    &parameter_name(parameter, index),
                    requirements,
                    TypePosition::Parameter,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let result = self.lower_result(&signature.result, RESULT_NAME)?;

        Ok(LoweredFunctionSignature {
            original: signature.clone(),
            self_parameter,
            parameters,
            result,
        })
    }

    /// Lower one parameter, e.g. `by delta: (Double, Double)` becomes
    /// `delta_0: Double, delta_1: Double`.
    pub fn lower_parameter(
        &self,
        ty: &SwiftType,
        convention: ParameterConvention,
        name: &str,
        requirements: &[SwiftGenericRequirement],
    ) -> Result<LoweredParameter> {
        self.lower_parameter_at(ty, convention, name, requirements, TypePosition::Parameter)
    }

    fn lower_parameter_at(
        &self,
        ty: &SwiftType,
        convention: ParameterConvention,
        name: &str,
        requirements: &[SwiftGenericRequirement],
        position: TypePosition,
    ) -> Result<LoweredParameter> {
        let inout = convention == ParameterConvention::Inout;
        if !inout && is_c_representable(ty) {
            return LoweredParameter::single(name, ty.clone(), ConversionStep::Placeholder);
        }

        match ty {
            SwiftType::Metatype(_) => LoweredParameter::single(
                name,
                raw_pointer(false),
                ConversionStep::UnsafeCastPointer(ConversionStep::Placeholder.boxed(), ty.clone()),
            ),
            SwiftType::Nominal(nominal) => self.lower_nominal_parameter(ty, nominal, inout, name, position),
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.lower_parameter_at(single, convention, name, requirements, position),
                _ if inout => Err(LoweringError::InoutNotSupported(ty.clone())),
                _ => {
                    let mut cdecl_parameters = Vec::new();
                    let mut conversions = Vec::with_capacity(elements.len());
                    for (index, element) in elements.iter().enumerate() {
                        let lowered = self.lower_parameter_at(
                            element,
                            convention,
                            &format!("{name}_{index}"),
                            requirements,
                            position,
                        )?;
                        cdecl_parameters.extend(lowered.cdecl_parameters);
                        conversions.push(lowered.conversion);
                    }
                    LoweredParameter::new(name, cdecl_parameters, ConversionStep::Tuplify(conversions))
                }
            },
            SwiftType::Function(_) if inout => Err(LoweringError::InoutNotSupported(ty.clone())),
            SwiftType::Function(function) => {
                let (lowered, conversion) = self.lower_function_type(function)?;
                LoweredParameter::single(name, lowered, conversion)
            }
            SwiftType::Optional(wrapped) => {
                self.lower_optional_parameter(wrapped, convention, name, requirements, position)
            }
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                match ty.representative_concrete_type(requirements) {
                    Some(concrete) => self.lower_parameter_at(&concrete, convention, name, requirements, position),
                    None => Err(LoweringError::unhandled(ty, position)),
                }
            }
            SwiftType::Composite(_) => Err(LoweringError::unhandled(ty, position)),
        }
    }

    fn lower_nominal_parameter(
        &self,
        ty: &SwiftType,
        nominal: &SwiftNominalType,
        inout: bool,
        name: &str,
        position: TypePosition,
    ) -> Result<LoweredParameter> {
        let Some(kind) = nominal.known_kind() else {
            return match nominal.decl.kind {
                NominalKind::Protocol => Err(LoweringError::unhandled(ty, position)),
                NominalKind::Class | NominalKind::Actor if !inout => LoweredParameter::single(
                    name,
                    raw_pointer(false),
                    ConversionStep::UnsafeCastPointer(ConversionStep::Placeholder.boxed(), ty.clone()),
                ),
                _ => Self::opaque_value_parameter(ty, inout, name),
            };
        };

        if inout {
            return Err(LoweringError::InoutNotSupported(ty.clone()));
        }

        let element = || {
            nominal
                .single_generic_argument()
                .cloned()
                .ok_or_else(|| LoweringError::unhandled(ty, position))
        };

        match kind {
            KnownTypeKind::UnsafePointer | KnownTypeKind::UnsafeMutablePointer => LoweredParameter::single(
                name,
                raw_pointer(kind == KnownTypeKind::UnsafeMutablePointer),
                ConversionStep::TypedPointer(ConversionStep::Placeholder.boxed(), element()?),
            ),
            KnownTypeKind::UnsafeBufferPointer | KnownTypeKind::UnsafeMutableBufferPointer => {
                let pointer = ConversionStep::TypedPointer(
                    ConversionStep::ExplodedComponent(ConversionStep::Placeholder.boxed(), "pointer".to_string())
                        .boxed(),
                    element()?,
                );
                Self::buffer_parameter(
                    ty,
                    name,
                    raw_pointer(kind == KnownTypeKind::UnsafeMutableBufferPointer),
                    pointer,
                )
            }
            KnownTypeKind::UnsafeRawBufferPointer | KnownTypeKind::UnsafeMutableRawBufferPointer => {
                let pointer =
                    ConversionStep::ExplodedComponent(ConversionStep::Placeholder.boxed(), "pointer".to_string());
                Self::buffer_parameter(
                    ty,
                    name,
                    SwiftType::optional(raw_pointer(kind == KnownTypeKind::UnsafeMutableRawBufferPointer)),
                    pointer,
                )
            }
            // Passed in as a C string.
            KnownTypeKind::String => LoweredParameter::single(
                name,
                SwiftType::known_generic(KnownTypeKind::UnsafePointer, vec![known(KnownTypeKind::Int8)]),
                ConversionStep::Initialize(
                    ty.clone(),
                    vec![LabeledArgument::labeled("cString", ConversionStep::Placeholder)],
                ),
            ),
            KnownTypeKind::Data => Self::opaque_value_parameter(ty, false, name),
            _ => Err(LoweringError::unhandled(ty, position)),
        }
    }

    fn buffer_parameter(
        ty: &SwiftType,
        name: &str,
        pointer_type: SwiftType,
        pointer: ConversionStep,
    ) -> Result<LoweredParameter> {
        LoweredParameter::new(
            name,
            vec![
                SwiftParameter::unlabeled(format!("{name}_pointer"), pointer_type),
                SwiftParameter::unlabeled(format!("{name}_count"), known(KnownTypeKind::Int)),
            ],
            ConversionStep::Initialize(
                ty.clone(),
                vec![
                    LabeledArgument::labeled("start", pointer),
                    LabeledArgument::labeled(
                        "count",
                        ConversionStep::ExplodedComponent(ConversionStep::Placeholder.boxed(), "count".to_string()),
                    ),
                ],
            ),
        )
    }

    /// Values of arbitrary nominal types are passed by address.
    fn opaque_value_parameter(ty: &SwiftType, inout: bool, name: &str) -> Result<LoweredParameter> {
        LoweredParameter::single(
            name,
            raw_pointer(inout),
            ConversionStep::Pointee(ConversionStep::TypedPointer(ConversionStep::Placeholder.boxed(), ty.clone()).boxed()),
        )
    }

    /// Lower `wrapped?` to a nullable pointer.
    pub fn lower_optional_parameter(
        &self,
        wrapped: &SwiftType,
        convention: ParameterConvention,
        name: &str,
        requirements: &[SwiftGenericRequirement],
        position: TypePosition,
    ) -> Result<LoweredParameter> {
        let optional = SwiftType::optional(wrapped.clone());
        if convention == ParameterConvention::Inout {
            return Err(LoweringError::InoutNotSupported(optional));
        }

        if is_scalar(wrapped) {
            return LoweredParameter::single(
                name,
                SwiftType::optional(SwiftType::known_generic(KnownTypeKind::UnsafePointer, vec![wrapped.clone()])),
                ConversionStep::Pointee(ConversionStep::OptionalChain(ConversionStep::Placeholder.boxed()).boxed()),
            );
        }

        match wrapped {
            SwiftType::Nominal(_) if wrapped.is_user_value() || wrapped.is_known(KnownTypeKind::Data) => {
                LoweredParameter::single(
                    name,
                    SwiftType::optional(raw_pointer(false)),
                    ConversionStep::Pointee(
                        ConversionStep::TypedPointer(
                            ConversionStep::OptionalChain(ConversionStep::Placeholder.boxed()).boxed(),
                            wrapped.clone(),
                        )
                        .boxed(),
                    ),
                )
            }
            SwiftType::Existential(_) | SwiftType::Opaque(_) | SwiftType::GenericParameter(_) => {
                match wrapped.representative_concrete_type(requirements) {
                    Some(concrete) => {
                        self.lower_optional_parameter(&concrete, convention, name, requirements, position)
                    }
                    None => Err(LoweringError::unhandled(&optional, position)),
                }
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.lower_optional_parameter(single, convention, name, requirements, position),
                _ => Err(LoweringError::unhandled(&optional, position)),
            },
            SwiftType::Nominal(_)
            | SwiftType::Function(_)
            | SwiftType::Metatype(_)
            | SwiftType::Optional(_)
            | SwiftType::Composite(_) => Err(LoweringError::unhandled(&optional, position)),
        }
    }

    /// Lower a closure type to a `@convention(c)` function pointer.
    ///
    /// When every parameter passes through unchanged the pointer is used
    /// as the closure directly; otherwise the thunk wraps it in a closure
    /// literal that lowers each argument before calling it.
    pub fn lower_function_type(&self, function: &SwiftFunctionType) -> Result<(SwiftType, ConversionStep)> {
        let mut parameters = Vec::new();
        let mut conversions = Vec::with_capacity(function.parameters.len());
        for (index, parameter) in function.parameters.iter().enumerate() {
            let lowered = self.lower_closure_parameter(parameter, &parameter_name(parameter, index))?;
            parameters.extend(lowered.cdecl_parameters);
            conversions.push(lowered.conversion);
        }

        if !is_c_representable(&function.result) {
            return Err(LoweringError::unhandled(&function.result, TypePosition::ClosureResult));
        }

        let lowered = SwiftType::Function(
            SwiftFunctionType::new(parameters, (*function.result).clone()).with_convention(FunctionConvention::C),
        );
        let compatible = conversions
            .iter()
            .all(|conversion| matches!(conversion, ConversionStep::Placeholder));
        let conversion = if compatible {
            ConversionStep::Placeholder
        } else {
            ConversionStep::ClosureLowering {
                parameters: conversions,
                result: ConversionStep::Placeholder.boxed(),
            }
        };
        Ok((lowered, conversion))
    }

    /// Closure parameters flow from Swift into C, so the conversion lowers
    /// the Swift value rather than raising the C one.
    fn lower_closure_parameter(&self, parameter: &SwiftParameter, name: &str) -> Result<LoweredParameter> {
        let ty = &parameter.ty;
        if parameter.is_inout() {
            return Err(LoweringError::InoutNotSupported(ty.clone()));
        }
        if is_c_representable(ty) {
            return LoweredParameter::single(name, ty.clone(), ConversionStep::Placeholder);
        }
        match ty.known_kind() {
            Some(kind @ (KnownTypeKind::UnsafeRawBufferPointer | KnownTypeKind::UnsafeMutableRawBufferPointer)) => {
                let mutable = kind == KnownTypeKind::UnsafeMutableRawBufferPointer;
                LoweredParameter::new(
                    name,
                    vec![
                        SwiftParameter::unlabeled(format!("{name}_pointer"), SwiftType::optional(raw_pointer(mutable))),
                        SwiftParameter::unlabeled(format!("{name}_count"), known(KnownTypeKind::Int)),
                    ],
                    ConversionStep::Tuplify(vec![
                        ConversionStep::Member(ConversionStep::Placeholder.boxed(), "baseAddress".to_string()),
                        ConversionStep::Member(ConversionStep::Placeholder.boxed(), "count".to_string()),
                    ]),
                )
            }
            _ => Err(LoweringError::unhandled(ty, TypePosition::ClosureParameter)),
        }
    }

    /// Lower a result type to a C return type and out parameters named
    /// after `out_name`.
    pub fn lower_result(&self, ty: &SwiftType, out_name: &str) -> Result<LoweredResult> {
        if is_c_representable(ty) {
            return Ok(LoweredResult::direct(ty.clone(), ConversionStep::Placeholder));
        }

        match ty {
            SwiftType::Metatype(_) => {
                let raw = raw_pointer(false);
                let conversion = ConversionStep::UnsafeCastPointer(ConversionStep::Placeholder.boxed(), raw.clone());
                Ok(LoweredResult::direct(raw, conversion))
            }
            SwiftType::Nominal(nominal) => self.lower_nominal_result(ty, nominal, out_name),
            SwiftType::Optional(wrapped) if is_scalar(wrapped) => {
                let scratch = format!("{out_name}$");
                let conversion = ConversionStep::Aggregate(
                    vec![
                        ConversionStep::IfLet {
                            value: ConversionStep::Placeholder.boxed(),
                            binding: "value$".to_string(),
                            then: ConversionStep::PopulatePointer {
                                name: out_name.to_string(),
                                assuming_type: Some((**wrapped).clone()),
                                to: ConversionStep::Placeholder.boxed(),
                            }
                            .boxed(),
                        },
                        ConversionStep::Ternary {
                            condition: ConversionStep::BinaryOp {
                                lhs: ConversionStep::Placeholder.boxed(),
                                operator: "!=".to_string(),
                                rhs: ConversionStep::Constant("nil".to_string()).boxed(),
                            }
                            .boxed(),
                            then: ConversionStep::Constant("1".to_string()).boxed(),
                            otherwise: ConversionStep::Constant("0".to_string()).boxed(),
                        },
                    ],
                    Some(scratch),
                );
                Ok(LoweredResult {
                    cdecl_result_type: known(KnownTypeKind::Int8),
                    cdecl_out_parameters: vec![SwiftParameter::unlabeled(out_name, raw_pointer(true))],
                    conversion,
                })
            }
            SwiftType::Tuple(elements) => match elements.as_slice() {
                [single] => self.lower_result(single, out_name),
                _ => self.lower_tuple_result(elements, out_name),
            },
            SwiftType::Optional(_)
            | SwiftType::Function(_)
            | SwiftType::Existential(_)
            | SwiftType::Opaque(_)
            | SwiftType::GenericParameter(_)
            | SwiftType::Composite(_) => Err(LoweringError::unhandled(ty, TypePosition::Result)),
        }
    }

    fn lower_nominal_result(&self, ty: &SwiftType, nominal: &SwiftNominalType, out_name: &str) -> Result<LoweredResult> {
        match nominal.known_kind() {
            Some(kind @ (KnownTypeKind::UnsafePointer | KnownTypeKind::UnsafeMutablePointer)) => {
                let raw = raw_pointer(kind == KnownTypeKind::UnsafeMutablePointer);
                let conversion = ConversionStep::Initialize(
                    raw.clone(),
                    vec![LabeledArgument::unlabeled(ConversionStep::Placeholder)],
                );
                Ok(LoweredResult::direct(raw, conversion))
            }
            Some(kind @ (KnownTypeKind::UnsafeBufferPointer | KnownTypeKind::UnsafeMutableBufferPointer)) => {
                let raw = raw_pointer(kind == KnownTypeKind::UnsafeMutableBufferPointer);
                let base_address = ConversionStep::Initialize(
                    raw.clone(),
                    vec![LabeledArgument::unlabeled(ConversionStep::Member(
                        ConversionStep::Placeholder.boxed(),
                        "baseAddress".to_string(),
                    ))],
                );
                Ok(Self::buffer_result(out_name, raw, base_address))
            }
            Some(kind @ (KnownTypeKind::UnsafeRawBufferPointer | KnownTypeKind::UnsafeMutableRawBufferPointer)) => {
                let raw = raw_pointer(kind == KnownTypeKind::UnsafeMutableRawBufferPointer);
                let base_address =
                    ConversionStep::Member(ConversionStep::Placeholder.boxed(), "baseAddress".to_string());
                Ok(Self::buffer_result(out_name, raw, base_address))
            }
            // The caller receives a heap copy it must free.
            Some(KnownTypeKind::String) => Ok(LoweredResult::indirect(
                vec![SwiftParameter::unlabeled(out_name, raw_pointer(true))],
                ConversionStep::PopulatePointer {
                    name: out_name.to_string(),
                    assuming_type: Some(SwiftType::optional(SwiftType::known_generic(
                        KnownTypeKind::UnsafeMutablePointer,
                        vec![known(KnownTypeKind::Int8)],
                    ))),
                    to: ConversionStep::Call(ConversionStep::Placeholder.boxed(), "strdup".to_string()).boxed(),
                },
            )),
            Some(KnownTypeKind::Data) => Ok(Self::opaque_value_result(ty, out_name)),
            None if ty.is_user_value() => Ok(Self::opaque_value_result(ty, out_name)),
            _ => Err(LoweringError::unhandled(ty, TypePosition::Result)),
        }
    }

    fn buffer_result(out_name: &str, raw: SwiftType, base_address: ConversionStep) -> LoweredResult {
        let pointer_name = format!("{out_name}_pointer");
        let count_name = format!("{out_name}_count");
        LoweredResult::indirect(
            vec![
                SwiftParameter::unlabeled(
                    &pointer_name,
                    SwiftType::known_generic(KnownTypeKind::UnsafeMutablePointer, vec![SwiftType::optional(raw)]),
                ),
                SwiftParameter::unlabeled(
                    &count_name,
                    SwiftType::known_generic(KnownTypeKind::UnsafeMutablePointer, vec![known(KnownTypeKind::Int)]),
                ),
            ],
            ConversionStep::Aggregate(
                vec![
                    ConversionStep::PopulatePointer {
                        name: pointer_name,
                        assuming_type: None,
                        to: base_address.boxed(),
                    },
                    ConversionStep::PopulatePointer {
                        name: count_name,
                        assuming_type: None,
                        to: ConversionStep::Member(ConversionStep::Placeholder.boxed(), "count".to_string()).boxed(),
                    },
                ],
                Some(out_name.to_string()),
            ),
        )
    }

    /// Values of arbitrary nominal types are returned into caller-allocated
    /// storage.
    fn opaque_value_result(ty: &SwiftType, out_name: &str) -> LoweredResult {
        LoweredResult::indirect(
            vec![SwiftParameter::unlabeled(out_name, raw_pointer(true))],
            ConversionStep::PopulatePointer {
                name: out_name.to_string(),
                assuming_type: Some(ty.clone()),
                to: ConversionStep::Placeholder.boxed(),
            },
        )
    }

    fn lower_tuple_result(&self, elements: &[SwiftType], out_name: &str) -> Result<LoweredResult> {
        let mut out_parameters = Vec::new();
        let mut conversions = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let element_name = format!("{out_name}_{index}");
            let lowered = self.lower_result(element, &element_name)?;

            if lowered.cdecl_result_type.is_void() {
                out_parameters.extend(lowered.cdecl_out_parameters);
                conversions.push(lowered.conversion);
                continue;
            }

            // Directly returned elements are written through a typed pointer.
            let name = if lowered.cdecl_out_parameters.is_empty() {
                element_name
            } else {
                format!("{element_name}_return")
            };
            out_parameters.extend(lowered.cdecl_out_parameters);
            out_parameters.push(SwiftParameter::unlabeled(
                &name,
                SwiftType::known_generic(KnownTypeKind::UnsafeMutablePointer, vec![lowered.cdecl_result_type]),
            ));
            conversions.push(ConversionStep::PopulatePointer {
                name,
                assuming_type: None,
                to: lowered.conversion.boxed(),
            });
        }

        Ok(LoweredResult::indirect(
            out_parameters,
            ConversionStep::TupleExplode(conversions, Some(out_name.to_string())),
        ))
    }
}

impl LoweredFunctionSignature {
    /// Every C parameter in order: parameters, then `self`, then out
    /// parameters.
    pub fn all_lowered_parameters(&self) -> Vec<SwiftParameter> {
        let mut all: Vec<SwiftParameter> = self
            .parameters
            .iter()
            .flat_map(|parameter| parameter.cdecl_parameters.iter().cloned())
            .collect();
        if let Some(self_parameter) = &self.self_parameter {
            all.extend(self_parameter.cdecl_parameters.iter().cloned());
        }
        all.extend(self.result.cdecl_out_parameters.iter().cloned());
        all
    }

    pub fn cdecl_signature(&self) -> SwiftFunctionSignature {
        SwiftFunctionSignature::new(self.all_lowered_parameters(), self.result.cdecl_result_type.clone())
    }

    /// The C declaration of the thunk.
    pub fn c_function(&self, name: &str) -> Result<CFunction> {
        CFunction::from_cdecl_signature(&self.cdecl_signature(), name)
    }

    /// Print the `@_cdecl` thunk that raises its C parameters and calls
    /// `api_name`.
    pub fn cdecl_thunk(
        &self,
        printer: &mut CodePrinter,
        c_name: &str,
        api_name: &str,
        kind: SwiftApiKind,
    ) -> Result<()> {
        let parameters: Vec<String> = self
            .all_lowered_parameters()
            .iter()
            .map(ToString::to_string)
            .collect();
        let return_clause = if self.result.cdecl_result_type.is_void() {
            String::new()
        } else {
            format!(" -> {}", self.result.cdecl_result_type)
        };

        printer.print(format!("@_cdecl(\"{c_name}\")"));
        printer.print_brace_block(
            format!("public func {c_name}({}){return_clause}", parameters.join(", ")),
            |printer| self.print_thunk_body(printer, api_name, kind),
        )
    }

    fn print_thunk_body(&self, printer: &mut CodePrinter, api_name: &str, kind: SwiftApiKind) -> Result<()> {
        let self_expr = match &self.original.self_parameter {
            Some(SwiftSelfParameter::Instance(parameter)) => {
                let name = parameter.parameter_name.as_deref().unwrap_or("self");
                let lowered = self
                    .self_parameter
                    .as_ref()
                    .ok_or_else(|| LoweringError::MissingValue(name.to_string()))?;
                Some(
                    lowered
                        .conversion
                        .render(printer, name)
                        .ok_or_else(|| LoweringError::MissingValue(name.to_string()))?,
                )
            }
            Some(SwiftSelfParameter::StaticMethod(ty) | SwiftSelfParameter::Initializer(ty)) => Some(ty.to_string()),
            None => None,
        };

        let mut arguments = Vec::with_capacity(self.parameters.len());
        for (index, (lowered, original)) in self.parameters.iter().zip(&self.original.parameters).enumerate() {
            let name = parameter_name(original, index);
            let value = lowered
                .conversion
                .render(printer, &name)
                .ok_or(LoweringError::MissingValue(name))?;
            arguments.push((original, value));
        }

        let callee = match (self_expr, kind) {
            (
                Some(self_expr),
                SwiftApiKind::Initializer | SwiftApiKind::SubscriptGetter | SwiftApiKind::SubscriptSetter,
            ) => self_expr,
            (Some(self_expr), _) => format!("{self_expr}.{api_name}"),
            (None, _) => api_name.to_string(),
        };

        let call = match kind {
            SwiftApiKind::Function | SwiftApiKind::Initializer => {
                format!("{callee}({})", call_arguments(&arguments).join(", "))
            }
            SwiftApiKind::Getter | SwiftApiKind::EnumCase => callee,
            SwiftApiKind::Setter => match arguments.as_slice() {
                [(_, value)] => format!("{callee} = {value}"),
                _ => {
                    return Err(LoweringError::ArityMismatch {
                        parameter: "newValue".to_string(),
                        cdecl_parameters: arguments.len(),
                        placeholders: 1,
                    });
                }
            },
            SwiftApiKind::SubscriptGetter => format!("{callee}[{}]", call_arguments(&arguments).join(", ")),
            SwiftApiKind::SubscriptSetter => match arguments.split_last() {
                Some(((_, value), index)) => {
                    format!("{callee}[{}] = {value}", call_arguments(index).join(", "))
                }
                None => {
                    return Err(LoweringError::ArityMismatch {
                        parameter: "newValue".to_string(),
                        cdecl_parameters: 0,
                        placeholders: 1,
                    });
                }
            },
        };

        if self.original.result.is_void() {
            printer.print(call);
        } else if let Some(value) = self.result.conversion.render(printer, &call) {
            if self.result.cdecl_result_type.is_void() {
                printer.print(value);
            } else {
                printer.print(format!("return {value}"));
            }
        }
        Ok(())
    }
}
