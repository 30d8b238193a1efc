//! Name resolution for nominal types.

use std::collections::HashMap;
use std::sync::Arc;

use super::parse::TypeParser;
use super::types::{KnownTypeKind, NominalTypeDecl, SwiftType};
use crate::error::TypeParseError;

/// Nominal declarations visible while extracting one module.
///
/// The table is pre-populated with every [`KnownTypeKind`]. Declarations
/// registered later shadow known types of the same qualified name.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    module_name: String,
    types: HashMap<String, Arc<NominalTypeDecl>>,
}

impl SymbolTable {
    pub fn new(module_name: impl Into<String>) -> Self {
        let types = KnownTypeKind::ALL
            .into_iter()
            .map(|kind| (kind.name().to_string(), Arc::new(NominalTypeDecl::known(kind))))
            .collect();
        Self {
            module_name: module_name.into(),
            types,
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Register a declaration under its qualified name.
    pub fn register(&mut self, decl: NominalTypeDecl) -> Arc<NominalTypeDecl> {
        let decl = Arc::new(decl);
        self.types.insert(decl.qualified_name(), Arc::clone(&decl));
        decl
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<Arc<NominalTypeDecl>> {
        self.types.get(qualified_name).cloned()
    }

    /// The unspecialized type of a registered, non-generic declaration.
    pub fn nominal_type(&self, qualified_name: &str) -> Option<SwiftType> {
        self.lookup(qualified_name).map(SwiftType::nominal)
    }

    /// Whether `name` may prefix a qualified type name, as in `Swift.Int`.
    pub fn is_module_name(&self, name: &str) -> bool {
        name == self.module_name || name == "Swift" || name == "Foundation"
    }

    /// Parse a type expression such as `UnsafeBufferPointer<Int32>?`.
    pub fn parse_type(&self, text: &str) -> Result<SwiftType, TypeParseError> {
        self.parse_type_in_context(text, &[])
    }

    /// Parse a type expression in which `generic_parameters` name the
    /// generic parameters of the enclosing declaration.
    pub fn parse_type_in_context(
        &self,
        text: &str,
        generic_parameters: &[String],
    ) -> Result<SwiftType, TypeParseError> {
        TypeParser::new(text, self, generic_parameters)?.parse()
    }
}
