//! Memory layouts and Java carrier types for C values.

use swift_java_abi::{CFloatingType, CIntegralType, CType, KnownTypeKind};

use crate::java::JavaType;

/// Class holding the `ValueLayout` constants for Swift types.
pub const VALUE_LAYOUT_CLASS: &str = "SwiftValueLayout";

/// The `SwiftValueLayout` constant describing a C value, `None` for
/// `void`.
pub fn value_layout(ty: &CType) -> Option<String> {
    let name = match ty {
        CType::Void => return None,
        CType::Integral(integral) => match integral {
            CIntegralType::Bool => "SWIFT_BOOL".to_string(),
            CIntegralType::Signed { bits } => format!("SWIFT_INT{bits}"),
            CIntegralType::Unsigned { bits } => format!("SWIFT_UINT{bits}"),
            CIntegralType::Ptrdiff => "SWIFT_INT".to_string(),
            CIntegralType::Size => "SWIFT_UINT".to_string(),
        },
        CType::Floating(CFloatingType::Float) => "SWIFT_FLOAT".to_string(),
        CType::Floating(CFloatingType::Double) => "SWIFT_DOUBLE".to_string(),
        CType::Pointer(_) | CType::Function { .. } => "SWIFT_POINTER".to_string(),
        CType::Qualified { ty, .. } => return value_layout(ty),
    };
    Some(format!("{VALUE_LAYOUT_CLASS}.{name}"))
}

/// The layout of a scalar known type.
pub fn known_layout(kind: KnownTypeKind) -> Option<String> {
    CType::primitive(kind).and_then(|ty| value_layout(&ty))
}

/// The Java type a downcall handle uses for a C value.
pub fn carrier_type(ty: &CType) -> JavaType {
    match ty {
        CType::Void => JavaType::Void,
        CType::Integral(integral) => match integral {
            CIntegralType::Bool => JavaType::Boolean,
            CIntegralType::Signed { bits: 8 } | CIntegralType::Unsigned { bits: 8 } => JavaType::Byte,
            CIntegralType::Signed { bits: 16 } => JavaType::Short,
            CIntegralType::Unsigned { bits: 16 } => JavaType::Char,
            CIntegralType::Signed { bits: 32 } | CIntegralType::Unsigned { bits: 32 } => JavaType::Int,
            CIntegralType::Signed { .. }
            | CIntegralType::Unsigned { .. }
            | CIntegralType::Ptrdiff
            | CIntegralType::Size => JavaType::Long,
        },
        CType::Floating(CFloatingType::Float) => JavaType::Float,
        CType::Floating(CFloatingType::Double) => JavaType::Double,
        CType::Pointer(_) | CType::Function { .. } => JavaType::memory_segment(),
        CType::Qualified { ty, .. } => carrier_type(ty),
    }
}
