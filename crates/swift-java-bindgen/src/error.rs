//! Error types for binding generation.
//!
//! [`TranslationError`] is the per-declaration failure: the generator skips
//! the declaration and keeps going. [`Error`] is the unified type returned
//! by everything else; internal errors in it abort the run.

use swift_java_abi::{LoweringError, SwiftType, TypeParseError, TypePosition};
use thiserror::Error;

use crate::config::ConfigError;

/// Why a single declaration could not be translated to Java.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// No translation rule applies to this type in this position.
    #[error("Unsupported type '{ty}' in {position} position")]
    UnsupportedType { ty: SwiftType, position: TypePosition },

    #[error("inout is not supported for type '{0}'")]
    InoutNotSupportedForType(SwiftType),

    /// Static members and initializers of protocols have no Java form.
    #[error("Static and initializer requirements of protocol '{0}' are not supported")]
    ProtocolRequirementsNotSupported(String),

    /// An external type is used without a `class_mappings` entry.
    #[error("No Java class configured for external type '{0}'")]
    MissingExternalMapping(String),

    #[error(transparent)]
    Lowering(#[from] LoweringError),
}

impl TranslationError {
    pub fn unsupported(ty: &SwiftType, position: TypePosition) -> Self {
        Self::UnsupportedType {
            ty: ty.clone(),
            position,
        }
    }

    /// The type the error is about, if any.
    pub fn offending_type(&self) -> Option<&SwiftType> {
        match self {
            Self::UnsupportedType { ty, .. } | Self::InoutNotSupportedForType(ty) => Some(ty),
            Self::Lowering(err) => err.offending_type(),
            Self::ProtocolRequirementsNotSupported(_) | Self::MissingExternalMapping(_) => None,
        }
    }

    /// Returns `true` if the error is a defect in the generator rather than
    /// unsupported input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Lowering(err) if err.is_internal())
    }
}

/// Errors in the declaration model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read declarations '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Invalid declaration model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid type in '{context}': {source}")]
    TypeParse {
        context: String,
        #[source]
        source: TypeParseError,
    },

    #[error("Unknown parent type '{parent}' of '{member}'")]
    UnknownParent { parent: String, member: String },

    #[error("'{0}' requires a parent type")]
    MissingParent(String),

    #[error("Type '{0}' is declared more than once")]
    DuplicateType(String),
}

impl ModelError {
    pub fn type_parse(context: impl Into<String>, source: TypeParseError) -> Self {
        Self::TypeParse {
            context: context.into(),
            source,
        }
    }
}

/// Unified error type for swift-java-bindgen.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    /// A generator invariant was violated; the run cannot continue.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns `true` if this is a translation error.
    pub fn is_translation(&self) -> bool {
        matches!(self, Self::Translation(_))
    }

    /// Returns `true` if this is a declaration model error.
    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` for generator defects, including internal lowering
    /// failures.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Translation(err) => err.is_internal(),
            Self::Model(_) | Self::Config(_) | Self::Io(..) => false,
        }
    }
}
