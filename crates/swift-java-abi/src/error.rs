//! Error types for type parsing and ABI lowering.

use std::fmt;

use thiserror::Error;

use crate::swift::{SwiftEffect, SwiftType};

/// Where in a signature a type appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypePosition {
    Parameter,
    SelfParameter,
    Result,
    ClosureParameter,
    ClosureResult,
}

impl fmt::Display for TypePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => f.write_str("parameter"),
            Self::SelfParameter => f.write_str("self"),
            Self::Result => f.write_str("result"),
            Self::ClosureParameter => f.write_str("closure parameter"),
            Self::ClosureResult => f.write_str("closure result"),
        }
    }
}

/// Errors from parsing a Swift type expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeParseError {
    #[error("Unexpected character '{0}' in type")]
    UnexpectedCharacter(char),

    #[error("Unexpected end of type, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("Expected {expected}, found '{found}'")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Type '{name}' expects {expected} generic argument(s), found {found}")]
    GenericArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported type syntax: {0}")]
    UnsupportedSyntax(String),
}

/// Errors from lowering a Swift signature to its `@_cdecl` form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// No lowering rule applies to this type in this position.
    #[error("Unsupported type '{ty}' in {position} position")]
    UnhandledType { ty: SwiftType, position: TypePosition },

    /// `inout` is only supported for user-defined nominal types.
    #[error("inout is not supported for type '{0}'")]
    InoutNotSupported(SwiftType),

    #[error("'{0}' functions cannot be lowered to a C function")]
    EffectNotSupported(SwiftEffect),

    /// The type is not expressible in a `@_cdecl` signature.
    #[error("Type '{0}' has no C representation")]
    NotCRepresentable(SwiftType),

    /// A lowered parameter's conversion consumes a different number of
    /// values than the C parameters it was lowered to.
    #[error(
        "Lowered parameter '{parameter}' has {cdecl_parameters} C parameter(s) but its conversion consumes {placeholders}"
    )]
    ArityMismatch {
        parameter: String,
        cdecl_parameters: usize,
        placeholders: usize,
    },

    /// A parameter conversion rendered to statements only.
    #[error("Conversion for '{0}' produced no value")]
    MissingValue(String),
}

impl LoweringError {
    pub fn unhandled(ty: &SwiftType, position: TypePosition) -> Self {
        Self::UnhandledType {
            ty: ty.clone(),
            position,
        }
    }

    /// The type the error is about, if any.
    pub fn offending_type(&self) -> Option<&SwiftType> {
        match self {
            Self::UnhandledType { ty, .. } | Self::InoutNotSupported(ty) | Self::NotCRepresentable(ty) => {
                Some(ty)
            }
            Self::EffectNotSupported(_) | Self::ArityMismatch { .. } | Self::MissingValue(_) => None,
        }
    }

    /// Returns `true` for defects in the lowering engine itself, as opposed
    /// to input it cannot handle.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::ArityMismatch { .. } | Self::MissingValue(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swift::KnownTypeKind;

    #[test]
    fn test_error_messages() {
        let ty = SwiftType::known(KnownTypeKind::String);
        let err = LoweringError::unhandled(&SwiftType::optional(ty.clone()), TypePosition::Result);
        assert_eq!(err.to_string(), "Unsupported type 'String?' in result position");
        assert!(!err.is_internal());

        let err = LoweringError::InoutNotSupported(ty.clone());
        assert_eq!(err.offending_type(), Some(&ty));

        let err = LoweringError::ArityMismatch {
            parameter: "x".to_string(),
            cdecl_parameters: 2,
            placeholders: 1,
        };
        assert!(err.is_internal());
        assert_eq!(err.offending_type(), None);
    }
}
