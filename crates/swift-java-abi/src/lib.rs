//! Swift type model and C ABI lowering for Swift-to-Java bindings.
//!
//! This crate describes Swift API surfaces as data and lowers them to
//! `@_cdecl` entry points: C-compatible functions that any foreign caller
//! can link against. Both Java backends build on the lowered signatures.
//!
//! # Module Organization
//!
//! - [`swift`]: Swift types, signatures, the symbol table and type parser
//! - [`ctype`]: C types and function declarations
//! - [`conversion`]: Conversion programs for the Swift side of thunks
//! - [`lowering`]: [`CdeclLowering`] and the lowered signatures it produces
//! - [`printer`]: The [`CodePrinter`] emission context
//! - `error`: Error types for parsing and lowering
//!
//! # Example
//!
//! ```rust
//! use swift_java_abi::{CdeclLowering, CodePrinter, SwiftApiKind, SymbolTable};
//! use swift_java_abi::{SwiftFunctionSignature, SwiftParameter};
//!
//! let symbols = SymbolTable::new("MyModule");
//! let signature = SwiftFunctionSignature::new(
//!     vec![SwiftParameter::labeled("name", symbols.parse_type("String").unwrap())],
//!     symbols.parse_type("Int32").unwrap(),
//! );
//! let lowered = CdeclLowering::new().lower_function_signature(&signature).unwrap();
//! assert_eq!(
//!     lowered.c_function("swiftjava_MyModule_hash_name").unwrap().to_string(),
//!     "int32_t swiftjava_MyModule_hash_name(const int8_t *name)"
//! );
//!
//! let mut printer = CodePrinter::new();
//! lowered
//!     .cdecl_thunk(&mut printer, "swiftjava_MyModule_hash_name", "hash", SwiftApiKind::Function)
//!     .unwrap();
//! assert!(printer.contents().contains("return hash(name: String(cString: name))"));
//! ```

pub mod conversion;
pub mod ctype;
mod error;
pub mod lowering;
pub mod printer;
pub mod swift;

pub use conversion::{ConversionStep, LabeledArgument};
pub use ctype::{CFloatingType, CFunction, CIntegralType, CParameter, CType};
pub use error::{LoweringError, TypeParseError, TypePosition};
pub use lowering::{CdeclLowering, LoweredFunctionSignature, LoweredParameter, LoweredResult, RESULT_NAME};
pub use printer::CodePrinter;
pub use swift::{
    FunctionConvention, KnownTypeKind, NominalKind, NominalTypeDecl, POINTER_BIT_WIDTH, ParameterConvention,
    SwiftApiKind, SwiftEffect, SwiftFunctionSignature, SwiftFunctionType, SwiftGenericRequirement,
    SwiftNominalType, SwiftParameter, SwiftSelfParameter, SwiftType, SymbolTable,
};
