//! The Swift type grammar.
//!
//! [`SwiftType`] is a closed recursive sum type. Scalars, strings and
//! pointers are nominal types whose declaration carries a
//! [`KnownTypeKind`]; everything else nominal is an opaque user type.

use std::fmt;
use std::sync::Arc;

use super::signature::{FunctionConvention, ParameterConvention, SwiftFunctionType};

/// Bit width of `Int`, `UInt` and pointers on every supported platform.
pub const POINTER_BIT_WIDTH: u32 = 64;

/// Standard library and Foundation types that have fixed lowering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTypeKind {
    Bool,
    Int,
    UInt,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    Array,
    Data,
    DataProtocol,
    Uuid,
    UnsafeRawPointer,
    UnsafeMutableRawPointer,
    UnsafePointer,
    UnsafeMutablePointer,
    UnsafeBufferPointer,
    UnsafeMutableBufferPointer,
    UnsafeRawBufferPointer,
    UnsafeMutableRawBufferPointer,
}

impl KnownTypeKind {
    /// Every known kind, in declaration order.
    pub const ALL: [KnownTypeKind; 26] = [
        Self::Bool,
        Self::Int,
        Self::UInt,
        Self::Int8,
        Self::UInt8,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Array,
        Self::Data,
        Self::DataProtocol,
        Self::Uuid,
        Self::UnsafeRawPointer,
        Self::UnsafeMutableRawPointer,
        Self::UnsafePointer,
        Self::UnsafeMutablePointer,
        Self::UnsafeBufferPointer,
        Self::UnsafeMutableBufferPointer,
        Self::UnsafeRawBufferPointer,
        Self::UnsafeMutableRawBufferPointer,
    ];

    /// The Swift spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::UInt => "UInt",
            Self::Int8 => "Int8",
            Self::UInt8 => "UInt8",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::Array => "Array",
            Self::Data => "Data",
            Self::DataProtocol => "DataProtocol",
            Self::Uuid => "UUID",
            Self::UnsafeRawPointer => "UnsafeRawPointer",
            Self::UnsafeMutableRawPointer => "UnsafeMutableRawPointer",
            Self::UnsafePointer => "UnsafePointer",
            Self::UnsafeMutablePointer => "UnsafeMutablePointer",
            Self::UnsafeBufferPointer => "UnsafeBufferPointer",
            Self::UnsafeMutableBufferPointer => "UnsafeMutableBufferPointer",
            Self::UnsafeRawBufferPointer => "UnsafeRawBufferPointer",
            Self::UnsafeMutableRawBufferPointer => "UnsafeMutableRawBufferPointer",
        }
    }

    /// Look up a known kind by its Swift spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Module that declares the type.
    pub fn module_name(self) -> &'static str {
        match self {
            Self::Data | Self::DataProtocol | Self::Uuid => "Foundation",
            _ => "Swift",
        }
    }

    pub fn nominal_kind(self) -> NominalKind {
        match self {
            Self::DataProtocol => NominalKind::Protocol,
            _ => NominalKind::Struct,
        }
    }

    /// Names of the generic parameters the type declares.
    pub fn generic_parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::Array | Self::UnsafeBufferPointer | Self::UnsafeMutableBufferPointer => {
                &["Element"]
            }
            Self::UnsafePointer | Self::UnsafeMutablePointer => &["Pointee"],
            _ => &[],
        }
    }

    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::UnsafePointer
                | Self::UnsafeMutablePointer
                | Self::UnsafeRawPointer
                | Self::UnsafeMutableRawPointer
        )
    }

    /// Bool, integers and floating point numbers.
    pub fn is_scalar(self) -> bool {
        self.bit_width().is_some()
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            Self::UInt | Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Storage width of a scalar, in bits.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => Some(8),
            Self::Int16 | Self::UInt16 => Some(16),
            Self::Int32 | Self::UInt32 | Self::Float => Some(32),
            Self::Int64 | Self::UInt64 | Self::Double => Some(64),
            Self::Int | Self::UInt => Some(POINTER_BIT_WIDTH),
            _ => None,
        }
    }

    /// Concrete type used in place of a generic or existential bound by
    /// this protocol.
    pub fn representative_type(self) -> Option<KnownTypeKind> {
        match self {
            Self::DataProtocol => Some(Self::Data),
            _ => None,
        }
    }
}

impl fmt::Display for KnownTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The flavor of a nominal type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Actor,
    Protocol,
}

impl NominalKind {
    pub fn is_reference_type(self) -> bool {
        matches!(self, Self::Class | Self::Actor)
    }
}

/// A nominal type declaration: a struct, enum, class, actor or protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NominalTypeDecl {
    pub module_name: String,
    pub name: String,
    /// Qualified name of the enclosing type, for nested declarations.
    pub parent: Option<String>,
    pub kind: NominalKind,
    pub known_kind: Option<KnownTypeKind>,
    pub generic_parameters: Vec<String>,
    /// Declared outside the module being extracted; its Java class must be
    /// supplied by configuration.
    pub is_external: bool,
}

impl NominalTypeDecl {
    pub fn new(module_name: impl Into<String>, name: impl Into<String>, kind: NominalKind) -> Self {
        Self {
            module_name: module_name.into(),
            name: name.into(),
            parent: None,
            kind,
            known_kind: None,
            generic_parameters: Vec::new(),
            is_external: false,
        }
    }

    /// The declaration of a standard library or Foundation type.
    pub fn known(kind: KnownTypeKind) -> Self {
        Self {
            module_name: kind.module_name().to_string(),
            name: kind.name().to_string(),
            parent: None,
            kind: kind.nominal_kind(),
            known_kind: Some(kind),
            generic_parameters: kind
                .generic_parameter_names()
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            is_external: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_generic_parameters(mut self, parameters: Vec<String>) -> Self {
        self.generic_parameters = parameters;
        self
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }

    /// Name including enclosing types, e.g. `Outer.Inner`.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A reference to a nominal declaration with its generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwiftNominalType {
    pub decl: Arc<NominalTypeDecl>,
    pub generic_arguments: Vec<SwiftType>,
}

impl SwiftNominalType {
    pub fn new(decl: Arc<NominalTypeDecl>) -> Self {
        Self {
            decl,
            generic_arguments: Vec::new(),
        }
    }

    pub fn known_kind(&self) -> Option<KnownTypeKind> {
        self.decl.known_kind
    }

    /// The single generic argument of `UnsafePointer<T>` and friends.
    pub fn single_generic_argument(&self) -> Option<&SwiftType> {
        match self.generic_arguments.as_slice() {
            [argument] => Some(argument),
            _ => None,
        }
    }
}

impl fmt::Display for SwiftNominalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decl.qualified_name())?;
        if !self.generic_arguments.is_empty() {
            f.write_str("<")?;
            write_joined(f, &self.generic_arguments, ", ")?;
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// A Swift type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwiftType {
    Nominal(SwiftNominalType),
    /// A tuple; the empty tuple is `Void`.
    Tuple(Vec<SwiftType>),
    Function(SwiftFunctionType),
    Metatype(Box<SwiftType>),
    Optional(Box<SwiftType>),
    /// `any P`
    Existential(Box<SwiftType>),
    /// `some P`
    Opaque(Box<SwiftType>),
    GenericParameter(String),
    /// `P & Q`
    Composite(Vec<SwiftType>),
}

impl SwiftType {
    pub fn nominal(decl: Arc<NominalTypeDecl>) -> Self {
        Self::Nominal(SwiftNominalType::new(decl))
    }

    pub fn known(kind: KnownTypeKind) -> Self {
        Self::nominal(Arc::new(NominalTypeDecl::known(kind)))
    }

    pub fn known_generic(kind: KnownTypeKind, generic_arguments: Vec<SwiftType>) -> Self {
        Self::Nominal(SwiftNominalType {
            decl: Arc::new(NominalTypeDecl::known(kind)),
            generic_arguments,
        })
    }

    pub fn void() -> Self {
        Self::Tuple(Vec::new())
    }

    pub fn optional(wrapped: SwiftType) -> Self {
        Self::Optional(Box::new(wrapped))
    }

    pub fn as_nominal(&self) -> Option<&SwiftNominalType> {
        match self {
            Self::Nominal(nominal) => Some(nominal),
            _ => None,
        }
    }

    pub fn known_kind(&self) -> Option<KnownTypeKind> {
        self.as_nominal().and_then(SwiftNominalType::known_kind)
    }

    pub fn is_known(&self, kind: KnownTypeKind) -> bool {
        self.known_kind() == Some(kind)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Tuple(elements) if elements.is_empty())
    }

    pub fn is_pointer(&self) -> bool {
        self.known_kind().is_some_and(KnownTypeKind::is_pointer)
    }

    /// Class or actor instances; mutation does not need `inout`.
    pub fn is_reference_type(&self) -> bool {
        self.as_nominal()
            .is_some_and(|nominal| nominal.decl.kind.is_reference_type())
    }

    /// A nominal type declared by user code (not a known kind, not a
    /// protocol).
    pub fn is_user_value(&self) -> bool {
        self.as_nominal().is_some_and(|nominal| {
            nominal.decl.known_kind.is_none() && nominal.decl.kind != NominalKind::Protocol
        })
    }

    fn needs_parentheses_as_postfix_operand(&self) -> bool {
        matches!(
            self,
            Self::Function(_) | Self::Composite(_) | Self::Existential(_) | Self::Opaque(_)
        )
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[SwiftType], separator: &str) -> fmt::Result {
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl fmt::Display for SwiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominal(nominal) => write!(f, "{nominal}"),
            Self::Tuple(elements) if elements.is_empty() => f.write_str("Void"),
            Self::Tuple(elements) => {
                f.write_str("(")?;
                write_joined(f, elements, ", ")?;
                f.write_str(")")
            }
            Self::Function(function) => {
                if function.convention == FunctionConvention::C {
                    f.write_str("@convention(c) ")?;
                }
                f.write_str("(")?;
                for (index, parameter) in function.parameters.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    if parameter.convention == ParameterConvention::Inout {
                        f.write_str("inout ")?;
                    }
                    write!(f, "{}", parameter.ty)?;
                }
                write!(f, ") -> {}", function.result)
            }
            Self::Metatype(instance) if instance.needs_parentheses_as_postfix_operand() => {
                write!(f, "({instance}).Type")
            }
            Self::Metatype(instance) => write!(f, "{instance}.Type"),
            Self::Optional(wrapped) if wrapped.needs_parentheses_as_postfix_operand() => {
                write!(f, "({wrapped})?")
            }
            Self::Optional(wrapped) => write!(f, "{wrapped}?"),
            Self::Existential(constraint) => write!(f, "any {constraint}"),
            Self::Opaque(constraint) => write!(f, "some {constraint}"),
            Self::GenericParameter(name) => f.write_str(name),
            Self::Composite(protocols) => write_joined(f, protocols, " & "),
        }
    }
}
