//! Per-run state shared by both backends.

use std::collections::BTreeMap;

use swift_java_abi::{KnownTypeKind, SwiftSelfParameter, SwiftType};

use crate::config::Configuration;
use crate::error::{Error, TranslationError};
use crate::logging::{debug, error, warn};
use crate::model::{DeclId, ImportedFunc, ImportedModule, ImportedNominalType};
use crate::naming::ThunkNameRegistry;

/// A declaration left out of the generated bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDeclaration {
    pub qualified_name: String,
    pub reason: TranslationError,
}

/// State owned by one generation run: the naming registry, the
/// declarations that were skipped and the filtered views of the module.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    pub module: &'a ImportedModule,
    pub config: &'a Configuration,
    thunk_names: ThunkNameRegistry,
    skipped: Vec<SkippedDeclaration>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(module: &'a ImportedModule, config: &'a Configuration) -> Self {
        Self {
            module,
            config,
            thunk_names: ThunkNameRegistry::new(),
            skipped: Vec::new(),
        }
    }

    pub fn module_name(&self) -> &'a str {
        &self.module.module_name
    }

    pub fn thunk_name(&mut self, decl: &ImportedFunc) -> String {
        self.thunk_names.function_thunk_name(decl)
    }

    /// Whether a type is visible enough to be extracted, together with
    /// every type enclosing it.
    pub fn is_type_included(&self, ty: &ImportedNominalType) -> bool {
        // External types map onto existing Java classes.
        if ty.decl.is_external || ty.access_level < self.config.minimum_input_access_level {
            return false;
        }
        match ty.decl.parent.as_deref().and_then(|parent| self.module.nominal_type(parent)) {
            Some(parent) => self.is_type_included(parent),
            None => true,
        }
    }

    pub fn is_included(&self, decl: &ImportedFunc) -> bool {
        if decl.access_level < self.config.minimum_input_access_level {
            return false;
        }
        match &decl.parent {
            Some(parent) => self
                .module
                .nominal_type(&parent.qualified_name())
                .is_some_and(|ty| self.is_type_included(ty)),
            None => true,
        }
    }

    /// Included types declared in `parent`, or at module scope.
    pub fn included_types(&self, parent: Option<&str>) -> Vec<&'a ImportedNominalType> {
        let module = self.module;
        module
            .types
            .iter()
            .filter(|ty| ty.decl.parent.as_deref() == parent && self.is_type_included(ty))
            .collect()
    }

    /// Translate every included declaration once, in declaration order.
    ///
    /// Declarations that fail are recorded and left out. Internal errors
    /// abort the run.
    pub fn translate_all<T>(
        &mut self,
        mut translate: impl FnMut(&mut Self, &'a ImportedFunc) -> Result<T, TranslationError>,
    ) -> Result<BTreeMap<DeclId, T>, Error> {
        let module = self.module;
        let mut translated = BTreeMap::new();
        for decl in &module.functions {
            if !self.is_included(decl) {
                debug!(decl = %decl.qualified_name(), access = %decl.access_level, "not extracted");
                continue;
            }
            match check_supported(decl).and_then(|()| translate(self, decl)) {
                Ok(value) => {
                    translated.insert(decl.id, value);
                }
                Err(reason) => self.skip(decl, reason)?,
            }
        }
        Ok(translated)
    }

    fn skip(&mut self, decl: &ImportedFunc, reason: TranslationError) -> Result<(), Error> {
        if reason.is_internal() {
            error!(decl = %decl.qualified_name(), error = %reason, "internal error while translating");
            return Err(reason.into());
        }
        warn!(decl = %decl.qualified_name(), reason = %reason, "skipping declaration");
        self.skipped.push(SkippedDeclaration {
            qualified_name: decl.qualified_name(),
            reason,
        });
        Ok(())
    }

    pub fn skipped(&self) -> &[SkippedDeclaration] {
        &self.skipped
    }

    pub fn into_skipped(self) -> Vec<SkippedDeclaration> {
        self.skipped
    }
}

/// Static members and initializers of protocols have no Java form.
pub fn check_supported(decl: &ImportedFunc) -> Result<(), TranslationError> {
    let is_static_requirement = matches!(
        decl.signature.self_parameter,
        Some(SwiftSelfParameter::StaticMethod(_) | SwiftSelfParameter::Initializer(_))
    );
    match &decl.parent {
        Some(parent) if decl.is_protocol_member() && is_static_requirement => {
            Err(TranslationError::ProtocolRequirementsNotSupported(parent.qualified_name()))
        }
        _ => Ok(()),
    }
}

/// Whether a signature mentions Foundation's `Data`, directly or as the
/// stand-in for `DataProtocol`.
pub fn mentions_data(decl: &ImportedFunc) -> bool {
    let signature = &decl.signature;
    signature
        .parameters
        .iter()
        .map(|parameter| &parameter.ty)
        .chain(std::iter::once(&signature.result))
        .any(|ty| mentions_known(ty, &[KnownTypeKind::Data, KnownTypeKind::DataProtocol]))
}

/// Whether a signature mentions Foundation's `UUID`.
pub fn mentions_uuid(decl: &ImportedFunc) -> bool {
    let signature = &decl.signature;
    signature
        .parameters
        .iter()
        .map(|parameter| &parameter.ty)
        .chain(std::iter::once(&signature.result))
        .any(|ty| mentions_known(ty, &[KnownTypeKind::Uuid]))
}

fn mentions_known(ty: &SwiftType, kinds: &[KnownTypeKind]) -> bool {
    match ty {
        SwiftType::Nominal(nominal) => {
            nominal.known_kind().is_some_and(|kind| kinds.contains(&kind))
                || nominal
                    .generic_arguments
                    .iter()
                    .any(|argument| mentions_known(argument, kinds))
        }
        SwiftType::Tuple(elements) | SwiftType::Composite(elements) => {
            elements.iter().any(|element| mentions_known(element, kinds))
        }
        SwiftType::Function(function) => {
            mentions_known(&function.result, kinds)
                || function
                    .parameters
                    .iter()
                    .any(|parameter| mentions_known(&parameter.ty, kinds))
        }
        SwiftType::Metatype(inner)
        | SwiftType::Optional(inner)
        | SwiftType::Existential(inner)
        | SwiftType::Opaque(inner) => mentions_known(inner, kinds),
        SwiftType::GenericParameter(_) => false,
    }
}
