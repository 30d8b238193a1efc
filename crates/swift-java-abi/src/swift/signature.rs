//! Function signatures, parameters and generic requirements.

use std::fmt;

use super::types::SwiftType;

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterConvention {
    #[default]
    Borrowed,
    Owned,
    Inout,
}

/// A parameter of a function or function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwiftParameter {
    pub convention: ParameterConvention,
    /// `None` for an unlabeled (`_`) argument.
    pub argument_label: Option<String>,
    pub parameter_name: Option<String>,
    pub ty: SwiftType,
}

impl SwiftParameter {
    /// A labeled parameter whose label and name coincide.
    pub fn labeled(name: impl Into<String>, ty: SwiftType) -> Self {
        let name = name.into();
        Self {
            convention: ParameterConvention::Borrowed,
            argument_label: Some(name.clone()),
            parameter_name: Some(name),
            ty,
        }
    }

    /// An unlabeled parameter, as used by `@_cdecl` thunks.
    pub fn unlabeled(name: impl Into<String>, ty: SwiftType) -> Self {
        Self {
            convention: ParameterConvention::Borrowed,
            argument_label: None,
            parameter_name: Some(name.into()),
            ty,
        }
    }

    pub fn with_convention(mut self, convention: ParameterConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.argument_label = label;
        self
    }

    pub fn is_inout(&self) -> bool {
        self.convention == ParameterConvention::Inout
    }
}

impl fmt::Display for SwiftParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.argument_label.as_deref().unwrap_or("_");
        let name = self.parameter_name.as_deref().unwrap_or("_");
        let inout = if self.is_inout() { "inout " } else { "" };
        let escaping = match &self.ty {
            SwiftType::Function(function)
                if function.is_escaping && function.convention == FunctionConvention::Swift =>
            {
                "@escaping "
            }
            _ => "",
        };
        write!(f, "{label} {name}: {inout}{escaping}{}", self.ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionConvention {
    #[default]
    Swift,
    /// `@convention(c)`: a plain C function pointer.
    C,
}

/// A function type such as `(Int64, Bool) -> Int64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwiftFunctionType {
    pub convention: FunctionConvention,
    pub parameters: Vec<SwiftParameter>,
    pub result: Box<SwiftType>,
    pub is_escaping: bool,
}

impl SwiftFunctionType {
    pub fn new(parameters: Vec<SwiftParameter>, result: SwiftType) -> Self {
        Self {
            convention: FunctionConvention::Swift,
            parameters,
            result: Box::new(result),
            is_escaping: false,
        }
    }

    pub fn with_convention(mut self, convention: FunctionConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn escaping(mut self) -> Self {
        self.is_escaping = true;
        self
    }
}

/// `async` or `throws`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwiftEffect {
    Async,
    Throws,
}

impl fmt::Display for SwiftEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Async => f.write_str("async"),
            Self::Throws => f.write_str("throws"),
        }
    }
}

/// A requirement in a `where` clause or on a generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwiftGenericRequirement {
    /// `T: P`
    Inherits { parameter: String, constraint: SwiftType },
    /// `T == U`
    SameType { parameter: String, ty: SwiftType },
}

/// The implicit `self` of a member declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwiftSelfParameter {
    /// An instance member; the parameter type is the enclosing type.
    Instance(SwiftParameter),
    /// A `static` member of the given type.
    StaticMethod(SwiftType),
    /// An initializer of the given type.
    Initializer(SwiftType),
}

/// What a declaration is from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwiftApiKind {
    Function,
    Initializer,
    Getter,
    Setter,
    /// `self[index]`; the parameters are the index.
    SubscriptGetter,
    /// `self[index] = newValue`; `newValue` is the last parameter.
    SubscriptSetter,
    EnumCase,
}

/// A complete function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwiftFunctionSignature {
    pub self_parameter: Option<SwiftSelfParameter>,
    pub parameters: Vec<SwiftParameter>,
    pub result: SwiftType,
    pub effects: Vec<SwiftEffect>,
    pub generic_parameters: Vec<String>,
    pub generic_requirements: Vec<SwiftGenericRequirement>,
}

impl SwiftFunctionSignature {
    pub fn new(parameters: Vec<SwiftParameter>, result: SwiftType) -> Self {
        Self {
            self_parameter: None,
            parameters,
            result,
            effects: Vec::new(),
            generic_parameters: Vec::new(),
            generic_requirements: Vec::new(),
        }
    }

    pub fn with_self(mut self, self_parameter: SwiftSelfParameter) -> Self {
        self.self_parameter = Some(self_parameter);
        self
    }

    pub fn with_effects(mut self, effects: Vec<SwiftEffect>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_generics(
        mut self,
        parameters: Vec<String>,
        requirements: Vec<SwiftGenericRequirement>,
    ) -> Self {
        self.generic_parameters = parameters;
        self.generic_requirements = requirements;
        self
    }

    pub fn is_async(&self) -> bool {
        self.effects.contains(&SwiftEffect::Async)
    }

    pub fn is_throwing(&self) -> bool {
        self.effects.contains(&SwiftEffect::Throws)
    }
}

impl SwiftType {
    /// Resolve a generic parameter, existential or opaque type to the
    /// concrete type that stands in for it.
    ///
    /// A generic parameter resolves only when it has exactly one
    /// conformance requirement; the protocol must name a known protocol
    /// with a representative type (`DataProtocol` becomes `Data`).
    pub fn representative_concrete_type(
        &self,
        requirements: &[SwiftGenericRequirement],
    ) -> Option<SwiftType> {
        let constraint = self.protocol_constraint(requirements)?;
        let representative = constraint.known_kind()?.representative_type()?;
        Some(SwiftType::known(representative))
    }

    /// The single protocol that bounds a generic parameter, existential or
    /// opaque type.
    pub fn protocol_constraint<'a>(
        &'a self,
        requirements: &'a [SwiftGenericRequirement],
    ) -> Option<&'a SwiftType> {
        match self {
            Self::Existential(constraint) | Self::Opaque(constraint) => Some(constraint),
            Self::GenericParameter(name) => {
                let mut bounds = requirements.iter().filter_map(|requirement| match requirement {
                    SwiftGenericRequirement::Inherits {
                        parameter,
                        constraint,
                    } if parameter == name => Some(constraint),
                    _ => None,
                });
                let first = bounds.next()?;
                if bounds.next().is_some() {
                    return None;
                }
                Some(first)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swift::types::KnownTypeKind;

    #[test]
    fn test_parameter_display() {
        let int = SwiftType::known(KnownTypeKind::Int);
        assert_eq!(SwiftParameter::unlabeled("x", int.clone()).to_string(), "_ x: Int");
        assert_eq!(
            SwiftParameter::labeled("value", int)
                .with_convention(ParameterConvention::Inout)
                .to_string(),
            "value value: inout Int"
        );
    }

    #[test]
    fn test_representative_type_for_generic_parameter() {
        let requirements = vec![SwiftGenericRequirement::Inherits {
            parameter: "D".to_string(),
            constraint: SwiftType::known(KnownTypeKind::DataProtocol),
        }];
        let generic = SwiftType::GenericParameter("D".to_string());
        assert_eq!(
            generic.representative_concrete_type(&requirements),
            Some(SwiftType::known(KnownTypeKind::Data))
        );

        let unconstrained = SwiftType::GenericParameter("T".to_string());
        assert_eq!(unconstrained.representative_concrete_type(&requirements), None);
    }

    #[test]
    fn test_representative_type_requires_single_bound() {
        let requirements = vec![
            SwiftGenericRequirement::Inherits {
                parameter: "D".to_string(),
                constraint: SwiftType::known(KnownTypeKind::DataProtocol),
            },
            SwiftGenericRequirement::Inherits {
                parameter: "D".to_string(),
                constraint: SwiftType::known(KnownTypeKind::DataProtocol),
            },
        ];
        let generic = SwiftType::GenericParameter("D".to_string());
        assert_eq!(generic.representative_concrete_type(&requirements), None);
    }

    #[test]
    fn test_representative_type_for_opaque() {
        let opaque = SwiftType::Opaque(Box::new(SwiftType::known(KnownTypeKind::DataProtocol)));
        assert_eq!(
            opaque.representative_concrete_type(&[]),
            Some(SwiftType::known(KnownTypeKind::Data))
        );
    }
}
