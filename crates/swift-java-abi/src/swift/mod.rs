//! The Swift side of the type model.
//!
//! # Module Organization
//!
//! - `types`: [`SwiftType`], nominal declarations and known kinds
//! - `signature`: parameters, function types and signatures
//! - `symbol_table`: name resolution for nominal types
//! - `parse`: the type-expression parser behind [`SymbolTable::parse_type`]

mod parse;
mod signature;
mod symbol_table;
mod types;

pub use signature::{
    FunctionConvention, ParameterConvention, SwiftApiKind, SwiftEffect, SwiftFunctionSignature,
    SwiftFunctionType, SwiftGenericRequirement, SwiftParameter, SwiftSelfParameter,
};
pub use symbol_table::SymbolTable;
pub use types::{
    KnownTypeKind, NominalKind, NominalTypeDecl, POINTER_BIT_WIDTH, SwiftNominalType, SwiftType,
};
