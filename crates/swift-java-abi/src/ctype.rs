//! C types: the canonical ABI both sides of a binding agree on.

use std::fmt;

use crate::error::LoweringError;
use crate::swift::{FunctionConvention, KnownTypeKind, SwiftFunctionSignature, SwiftType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CIntegralType {
    Bool,
    Signed { bits: u32 },
    Unsigned { bits: u32 },
    Ptrdiff,
    Size,
}

impl fmt::Display for CIntegralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Signed { bits } => write!(f, "int{bits}_t"),
            Self::Unsigned { bits } => write!(f, "uint{bits}_t"),
            Self::Ptrdiff => f.write_str("ptrdiff_t"),
            Self::Size => f.write_str("size_t"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CFloatingType {
    Float,
    Double,
}

impl fmt::Display for CFloatingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
        }
    }
}

/// A C type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CType {
    Void,
    Integral(CIntegralType),
    Floating(CFloatingType),
    Pointer(Box<CType>),
    Function {
        result: Box<CType>,
        parameters: Vec<CType>,
        variadic: bool,
    },
    Qualified {
        is_const: bool,
        is_volatile: bool,
        ty: Box<CType>,
    },
}

impl CType {
    /// The C type of a scalar or raw pointer known type.
    pub fn primitive(kind: KnownTypeKind) -> Option<CType> {
        let ty = match kind {
            KnownTypeKind::Bool => Self::Integral(CIntegralType::Bool),
            KnownTypeKind::Int => Self::Integral(CIntegralType::Ptrdiff),
            KnownTypeKind::UInt => Self::Integral(CIntegralType::Size),
            KnownTypeKind::Int8 => Self::Integral(CIntegralType::Signed { bits: 8 }),
            KnownTypeKind::UInt8 => Self::Integral(CIntegralType::Unsigned { bits: 8 }),
            KnownTypeKind::Int16 => Self::Integral(CIntegralType::Signed { bits: 16 }),
            KnownTypeKind::UInt16 => Self::Integral(CIntegralType::Unsigned { bits: 16 }),
            KnownTypeKind::Int32 => Self::Integral(CIntegralType::Signed { bits: 32 }),
            KnownTypeKind::UInt32 => Self::Integral(CIntegralType::Unsigned { bits: 32 }),
            KnownTypeKind::Int64 => Self::Integral(CIntegralType::Signed { bits: 64 }),
            KnownTypeKind::UInt64 => Self::Integral(CIntegralType::Unsigned { bits: 64 }),
            KnownTypeKind::Float => Self::Floating(CFloatingType::Float),
            KnownTypeKind::Double => Self::Floating(CFloatingType::Double),
            KnownTypeKind::UnsafeMutableRawPointer => Self::Pointer(Box::new(Self::Void)),
            KnownTypeKind::UnsafeRawPointer => Self::Pointer(Box::new(Self::Void.into_const())),
            KnownTypeKind::String
            | KnownTypeKind::Array
            | KnownTypeKind::Data
            | KnownTypeKind::DataProtocol
            | KnownTypeKind::Uuid
            | KnownTypeKind::UnsafePointer
            | KnownTypeKind::UnsafeMutablePointer
            | KnownTypeKind::UnsafeBufferPointer
            | KnownTypeKind::UnsafeMutableBufferPointer
            | KnownTypeKind::UnsafeRawBufferPointer
            | KnownTypeKind::UnsafeMutableRawBufferPointer => return None,
        };
        Some(ty)
    }

    /// Map a type that may appear in a `@_cdecl` signature to C.
    ///
    /// Only scalars, pointers whose pointee is itself representable,
    /// optional pointers, `Void` and `@convention(c)` functions succeed.
    pub fn from_cdecl_type(ty: &SwiftType) -> Result<CType, LoweringError> {
        let not_representable = || LoweringError::NotCRepresentable(ty.clone());
        match ty {
            SwiftType::Nominal(nominal) => {
                let kind = nominal.known_kind().ok_or_else(not_representable)?;
                if let Some(primitive) = Self::primitive(kind) {
                    return Ok(primitive);
                }
                let pointee = nominal.single_generic_argument().ok_or_else(not_representable)?;
                match kind {
                    KnownTypeKind::UnsafePointer => {
                        Ok(Self::Pointer(Box::new(Self::from_cdecl_type(pointee)?.into_const())))
                    }
                    KnownTypeKind::UnsafeMutablePointer => {
                        Ok(Self::Pointer(Box::new(Self::from_cdecl_type(pointee)?)))
                    }
                    _ => Err(not_representable()),
                }
            }
            SwiftType::Function(function) => match function.convention {
                FunctionConvention::Swift => Err(not_representable()),
                FunctionConvention::C => {
                    let parameters = function
                        .parameters
                        .iter()
                        .map(|parameter| Self::from_cdecl_type(&parameter.ty))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Self::Pointer(Box::new(Self::Function {
                        result: Box::new(Self::from_cdecl_type(&function.result)?),
                        parameters,
                        variadic: false,
                    })))
                }
            },
            SwiftType::Tuple(elements) if elements.is_empty() => Ok(Self::Void),
            SwiftType::Optional(wrapped) if wrapped.is_pointer() => Self::from_cdecl_type(wrapped),
            SwiftType::Optional(_)
            | SwiftType::Tuple(_)
            | SwiftType::Metatype(_)
            | SwiftType::Existential(_)
            | SwiftType::Opaque(_)
            | SwiftType::GenericParameter(_)
            | SwiftType::Composite(_) => Err(not_representable()),
        }
    }

    pub fn into_const(self) -> CType {
        Self::Qualified {
            is_const: true,
            is_volatile: false,
            ty: Box::new(self),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Render a declaration of `name` with this type, e.g. `const void *p`
    /// or `void (*callback)(int32_t)`. An empty name gives an abstract
    /// declarator.
    pub fn declarator(&self, name: &str) -> String {
        match self {
            Self::Void => spaced("void", name),
            Self::Integral(integral) => spaced(&integral.to_string(), name),
            Self::Floating(floating) => spaced(&floating.to_string(), name),
            Self::Qualified {
                is_const,
                is_volatile,
                ty,
            } => {
                let mut qualifiers = String::new();
                if *is_const {
                    qualifiers.push_str("const ");
                }
                if *is_volatile {
                    qualifiers.push_str("volatile ");
                }
                match ty.as_ref() {
                    Self::Pointer(_) => ty.declarator(&format!("{qualifiers}{name}")),
                    _ => format!("{qualifiers}{}", ty.declarator(name)),
                }
            }
            Self::Pointer(pointee) => {
                let inner = format!("*{name}");
                match pointee.as_ref() {
                    Self::Function { .. } => pointee.declarator(&format!("({inner})")),
                    _ => pointee.declarator(&inner),
                }
            }
            Self::Function {
                result,
                parameters,
                variadic,
            } => {
                let parameters: Vec<String> =
                    parameters.iter().map(|parameter| parameter.declarator("")).collect();
                result.declarator(&format!("{name}({})", parameter_list(parameters, *variadic)))
            }
        }
    }
}

fn spaced(base: &str, name: &str) -> String {
    if name.is_empty() {
        base.to_string()
    } else {
        format!("{base} {name}")
    }
}

fn parameter_list(parameters: Vec<String>, variadic: bool) -> String {
    if parameters.is_empty() {
        return if variadic { "...".to_string() } else { "void".to_string() };
    }
    let mut list = parameters.join(", ");
    if variadic {
        list.push_str(", ...");
    }
    list
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.declarator(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CParameter {
    pub name: Option<String>,
    pub ty: CType,
}

/// A C function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CFunction {
    pub result: CType,
    pub name: String,
    pub parameters: Vec<CParameter>,
    pub is_variadic: bool,
}

impl CFunction {
    /// The C declaration matching a `@_cdecl` Swift signature.
    pub fn from_cdecl_signature(
        signature: &SwiftFunctionSignature,
        name: impl Into<String>,
    ) -> Result<Self, LoweringError> {
        let parameters = signature
            .parameters
            .iter()
            .map(|parameter| {
                Ok(CParameter {
                    name: parameter.parameter_name.clone(),
                    ty: CType::from_cdecl_type(&parameter.ty)?,
                })
            })
            .collect::<Result<Vec<_>, LoweringError>>()?;
        Ok(Self {
            result: CType::from_cdecl_type(&signature.result)?,
            name: name.into(),
            parameters,
            is_variadic: false,
        })
    }
}

impl fmt::Display for CFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| parameter.ty.declarator(parameter.name.as_deref().unwrap_or("")))
            .collect();
        let declarator = format!("{}({})", self.name, parameter_list(parameters, self.is_variadic));
        f.write_str(&self.result.declarator(&declarator))
    }
}
