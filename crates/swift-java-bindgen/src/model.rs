//! The declaration model: the Swift API surface of one module.
//!
//! [`ModuleDeclarations`] is the serialized form (JSON, types written as
//! Swift type expressions). [`ModuleDeclarations::resolve`] parses every
//! type against a [`SymbolTable`] and flattens variables, subscripts and
//! enum cases into accessor functions, producing an [`ImportedModule`] whose
//! [`ImportedFunc`]s are what the translators work on.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swift_java_abi::{
    KnownTypeKind, NominalKind, NominalTypeDecl, ParameterConvention, SwiftApiKind, SwiftEffect,
    SwiftFunctionSignature, SwiftGenericRequirement, SwiftParameter, SwiftSelfParameter, SwiftType, SymbolTable,
};

use crate::config::AccessLevel;
use crate::error::ModelError;

/// Serialized declarations of a Swift module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDeclarations {
    pub module: String,
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub functions: Vec<FunctionDeclaration>,
    #[serde(default)]
    pub variables: Vec<VariableDeclaration>,
    #[serde(default)]
    pub enum_cases: Vec<EnumCaseDeclaration>,
    #[serde(default)]
    pub subscripts: Vec<SubscriptDeclaration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Enum,
    Class,
    Actor,
    Protocol,
}

impl From<TypeKind> for NominalKind {
    fn from(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Struct => NominalKind::Struct,
            TypeKind::Enum => NominalKind::Enum,
            TypeKind::Class => NominalKind::Class,
            TypeKind::Actor => NominalKind::Actor,
            TypeKind::Protocol => NominalKind::Protocol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: TypeKind,
    /// Qualified name of the enclosing type.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    /// Declared in another module; mapped to a Java class by configuration.
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub access: AccessLevel,
    /// Protocols the type conforms to.
    #[serde(default)]
    pub conforms_to: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    #[default]
    Function,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    #[default]
    Borrowed,
    Owned,
    Inout,
}

impl From<Convention> for ParameterConvention {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::Borrowed => ParameterConvention::Borrowed,
            Convention::Owned => ParameterConvention::Owned,
            Convention::Inout => ParameterConvention::Inout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Async,
    Throws,
}

impl From<Effect> for SwiftEffect {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Async => SwiftEffect::Async,
            Effect::Throws => SwiftEffect::Throws,
        }
    }
}

/// A parameter. `label: "_"` makes it unlabeled; an absent label is the
/// same as the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub convention: Convention,
}

/// `T: P` when `conforms_to` is set, `T == U` when `same_type` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDeclaration {
    pub parameter: String,
    #[serde(default)]
    pub conforms_to: Option<String>,
    #[serde(default)]
    pub same_type: Option<String>,
}

fn void_type() -> String {
    "Void".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub kind: FunctionKind,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub mutating: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDeclaration>,
    #[serde(default = "void_type")]
    pub result: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<RequirementDeclaration>,
    #[serde(default)]
    pub access: AccessLevel,
    /// Source text echoed into generated documentation.
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Whether a setter is generated.
    #[serde(default)]
    pub settable: bool,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub signature: Option<String>,
}

/// `subscript(index: T) -> U`. Index parameters are unlabeled unless a
/// label is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptDeclaration {
    pub parent: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDeclaration>,
    pub result: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub settable: bool,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A payload-free enum case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCaseDeclaration {
    pub name: String,
    pub parent: String,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Stable identity of an imported function within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A nominal type of the module being extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedNominalType {
    pub decl: Arc<NominalTypeDecl>,
    pub access_level: AccessLevel,
    pub conforms_to: Vec<String>,
}

impl ImportedNominalType {
    pub fn swift_type(&self) -> SwiftType {
        SwiftType::nominal(Arc::clone(&self.decl))
    }

    pub fn qualified_name(&self) -> String {
        self.decl.qualified_name()
    }
}

/// A callable API: function, initializer, accessor or enum case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFunc {
    pub id: DeclId,
    pub module_name: String,
    /// Base name: `f`, `init`, the variable or the case name.
    pub name: String,
    pub parent: Option<Arc<NominalTypeDecl>>,
    pub api_kind: SwiftApiKind,
    pub signature: SwiftFunctionSignature,
    pub signature_string: String,
    pub access_level: AccessLevel,
}

impl ImportedFunc {
    /// `Parent.name`, or `name` for globals.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.qualified_name(), self.name),
            None => self.name.clone(),
        }
    }

    /// Whether the Java method is `static`.
    pub fn is_static(&self) -> bool {
        !matches!(self.signature.self_parameter, Some(SwiftSelfParameter::Instance(_)))
    }

    pub fn is_protocol_member(&self) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.kind == NominalKind::Protocol)
    }

    /// The Java method name: `getX`/`isX`/`setX` for accessors, the Swift
    /// name otherwise.
    pub fn java_name(&self) -> String {
        match self.api_kind {
            SwiftApiKind::Getter if self.signature.result.is_known(KnownTypeKind::Bool) => {
                if has_is_prefix(&self.name) {
                    self.name.clone()
                } else {
                    format!("is{}", capitalized(&self.name))
                }
            }
            SwiftApiKind::Getter => format!("get{}", capitalized(&self.name)),
            SwiftApiKind::Setter if has_is_prefix(&self.name) => {
                format!("set{}", self.name.get(2..).unwrap_or_default())
            }
            SwiftApiKind::Setter => format!("set{}", capitalized(&self.name)),
            SwiftApiKind::SubscriptGetter => "getSubscript".to_string(),
            SwiftApiKind::SubscriptSetter => "setSubscript".to_string(),
            SwiftApiKind::Function | SwiftApiKind::Initializer | SwiftApiKind::EnumCase => self.name.clone(),
        }
    }
}

fn has_is_prefix(name: &str) -> bool {
    name.strip_prefix("is")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_uppercase)
}

/// `count` becomes `Count`.
pub fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A module with every type resolved.
#[derive(Debug, Clone)]
pub struct ImportedModule {
    pub module_name: String,
    pub symbols: SymbolTable,
    pub types: Vec<ImportedNominalType>,
    pub functions: Vec<ImportedFunc>,
}

impl ImportedModule {
    pub fn function(&self, id: DeclId) -> Option<&ImportedFunc> {
        self.functions.get(id.0)
    }

    pub fn nominal_type(&self, qualified_name: &str) -> Option<&ImportedNominalType> {
        self.types
            .iter()
            .find(|ty| ty.decl.qualified_name() == qualified_name)
    }

    /// Functions and variables declared at module scope.
    pub fn global_functions(&self) -> impl Iterator<Item = &ImportedFunc> {
        self.functions.iter().filter(|func| func.parent.is_none())
    }

    /// Members declared directly in the given type.
    pub fn members_of<'a>(&'a self, qualified_name: &'a str) -> impl Iterator<Item = &'a ImportedFunc> {
        self.functions.iter().filter(move |func| {
            func.parent
                .as_ref()
                .is_some_and(|parent| parent.qualified_name() == qualified_name)
        })
    }
}

impl ModuleDeclarations {
    /// Load declarations from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ModelError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Resolve every type expression and flatten the declarations into
    /// functions. `module_name` overrides the declared module name.
    pub fn resolve(&self, module_name: Option<&str>) -> Result<ImportedModule, ModelError> {
        let module_name = module_name.unwrap_or(&self.module).to_string();
        let mut symbols = SymbolTable::new(module_name.clone());

        let mut types = Vec::with_capacity(self.types.len());
        for ty in &self.types {
            let mut decl = NominalTypeDecl::new(module_name.clone(), ty.name.clone(), ty.kind.into())
                .with_generic_parameters(ty.generic_parameters.clone());
            if let Some(parent) = &ty.parent {
                decl = decl.with_parent(parent.clone());
            }
            if ty.external {
                decl = decl.external();
            }
            let qualified_name = decl.qualified_name();
            if types
                .iter()
                .any(|existing: &ImportedNominalType| existing.decl.qualified_name() == qualified_name)
            {
                return Err(ModelError::DuplicateType(qualified_name));
            }
            types.push(ImportedNominalType {
                decl: symbols.register(decl),
                access_level: ty.access,
                conforms_to: ty.conforms_to.clone(),
            });
        }
        for ty in &types {
            if let Some(parent) = &ty.decl.parent
                && symbols.lookup(parent).is_none()
            {
                return Err(ModelError::UnknownParent {
                    parent: parent.clone(),
                    member: ty.decl.name.clone(),
                });
            }
        }

        let mut resolver = Resolver {
            module_name: &module_name,
            symbols: &symbols,
            functions: Vec::new(),
        };
        for function in &self.functions {
            resolver.function(function)?;
        }
        for variable in &self.variables {
            resolver.variable(variable)?;
        }
        for case in &self.enum_cases {
            resolver.enum_case(case)?;
        }
        for subscript in &self.subscripts {
            resolver.subscript(subscript)?;
        }
        let functions = resolver.functions;

        Ok(ImportedModule {
            module_name,
            symbols,
            types,
            functions,
        })
    }
}

struct Resolver<'a> {
    module_name: &'a str,
    symbols: &'a SymbolTable,
    functions: Vec<ImportedFunc>,
}

impl Resolver<'_> {
    fn parent(&self, parent: Option<&str>, member: &str) -> Result<Option<Arc<NominalTypeDecl>>, ModelError> {
        parent
            .map(|parent| {
                self.symbols.lookup(parent).ok_or_else(|| ModelError::UnknownParent {
                    parent: parent.to_string(),
                    member: member.to_string(),
                })
            })
            .transpose()
    }

    fn parse(&self, text: &str, generics: &[String], context: &str) -> Result<SwiftType, ModelError> {
        self.symbols
            .parse_type_in_context(text, generics)
            .map_err(|e| ModelError::type_parse(context, e))
    }

    fn push(
        &mut self,
        name: &str,
        parent: Option<Arc<NominalTypeDecl>>,
        api_kind: SwiftApiKind,
        signature: SwiftFunctionSignature,
        signature_string: String,
        access_level: AccessLevel,
    ) {
        let id = DeclId(self.functions.len());
        self.functions.push(ImportedFunc {
            id,
            module_name: self.module_name.to_string(),
            name: name.to_string(),
            parent,
            api_kind,
            signature,
            signature_string,
            access_level,
        });
    }

    fn function(&mut self, function: &FunctionDeclaration) -> Result<(), ModelError> {
        let parent = self.parent(function.parent.as_deref(), &function.name)?;
        let mut generics = parent
            .as_ref()
            .map(|parent| parent.generic_parameters.clone())
            .unwrap_or_default();
        generics.extend(function.generic_parameters.iter().cloned());
        let context = function.name.as_str();

        let parameters = function
            .parameters
            .iter()
            .map(|parameter| {
                let ty = self.parse(&parameter.ty, &generics, context)?;
                let label = match parameter.label.as_deref() {
                    Some("_") => None,
                    Some(label) => Some(label.to_string()),
                    None => parameter.name.clone(),
                };
                let name = parameter.name.clone().or_else(|| label.clone());
                Ok(SwiftParameter {
                    convention: parameter.convention.into(),
                    argument_label: label,
                    parameter_name: name,
                    ty,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let requirements = function
            .requirements
            .iter()
            .map(|requirement| {
                match (&requirement.conforms_to, &requirement.same_type) {
                    (Some(constraint), None) => Ok(SwiftGenericRequirement::Inherits {
                        parameter: requirement.parameter.clone(),
                        constraint: self.parse(constraint, &generics, context)?,
                    }),
                    (None, Some(ty)) => Ok(SwiftGenericRequirement::SameType {
                        parameter: requirement.parameter.clone(),
                        ty: self.parse(ty, &generics, context)?,
                    }),
                    _ => Err(ModelError::type_parse(
                        context,
                        swift_java_abi::TypeParseError::UnsupportedSyntax(format!(
                            "requirement on '{}' needs exactly one of conforms_to or same_type",
                            requirement.parameter
                        )),
                    )),
                }
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let (self_parameter, result, api_kind) = match (&parent, function.kind) {
            (Some(parent), FunctionKind::Initializer) => {
                let ty = SwiftType::nominal(Arc::clone(parent));
                (
                    Some(SwiftSelfParameter::Initializer(ty.clone())),
                    ty,
                    SwiftApiKind::Initializer,
                )
            }
            (None, FunctionKind::Initializer) => return Err(ModelError::MissingParent(function.name.clone())),
            (Some(parent), FunctionKind::Function) => {
                let ty = SwiftType::nominal(Arc::clone(parent));
                let self_parameter = if function.is_static {
                    SwiftSelfParameter::StaticMethod(ty)
                } else {
                    let convention = if function.mutating {
                        ParameterConvention::Inout
                    } else {
                        ParameterConvention::Borrowed
                    };
                    SwiftSelfParameter::Instance(SwiftParameter::unlabeled("self", ty).with_convention(convention))
                };
                (
                    Some(self_parameter),
                    self.parse(&function.result, &generics, context)?,
                    SwiftApiKind::Function,
                )
            }
            (None, FunctionKind::Function) => (
                None,
                self.parse(&function.result, &generics, context)?,
                SwiftApiKind::Function,
            ),
        };

        let signature = SwiftFunctionSignature {
            self_parameter,
            parameters,
            result,
            effects: function.effects.iter().copied().map(SwiftEffect::from).collect(),
            generic_parameters: function.generic_parameters.clone(),
            generic_requirements: requirements,
        };
        let signature_string = function
            .signature
            .clone()
            .unwrap_or_else(|| function_signature_string(function, &signature));
        let name = match function.kind {
            FunctionKind::Initializer => "init",
            FunctionKind::Function => function.name.as_str(),
        };
        self.push(name, parent, api_kind, signature, signature_string, function.access);
        Ok(())
    }

    fn variable(&mut self, variable: &VariableDeclaration) -> Result<(), ModelError> {
        let parent = self.parent(variable.parent.as_deref(), &variable.name)?;
        let generics = parent
            .as_ref()
            .map(|parent| parent.generic_parameters.clone())
            .unwrap_or_default();
        let ty = self.parse(&variable.ty, &generics, &variable.name)?;

        let self_parameter = parent.as_ref().map(|parent| {
            let parent_ty = SwiftType::nominal(Arc::clone(parent));
            if variable.is_static {
                SwiftSelfParameter::StaticMethod(parent_ty)
            } else {
                SwiftSelfParameter::Instance(SwiftParameter::unlabeled("self", parent_ty))
            }
        });
        let signature_string = variable.signature.clone().unwrap_or_else(|| {
            let introducer = if variable.settable { "var" } else { "let" };
            let modifier = if variable.is_static { "static " } else { "" };
            format!("{} {modifier}{introducer} {}: {}", variable.access, variable.name, ty)
        });

        let mut getter = SwiftFunctionSignature::new(Vec::new(), ty.clone());
        getter.self_parameter = self_parameter.clone();
        self.push(
            &variable.name,
            parent.clone(),
            SwiftApiKind::Getter,
            getter,
            signature_string.clone(),
            variable.access,
        );

        if variable.settable {
            // Setting a property of a value type mutates `self`.
            let self_parameter = self_parameter.map(|self_parameter| match self_parameter {
                SwiftSelfParameter::Instance(parameter) if !parameter.ty.is_reference_type() => {
                    SwiftSelfParameter::Instance(parameter.with_convention(ParameterConvention::Inout))
                }
                other => other,
            });
            let mut setter =
                SwiftFunctionSignature::new(vec![SwiftParameter::unlabeled("newValue", ty)], SwiftType::void());
            setter.self_parameter = self_parameter;
            self.push(
                &variable.name,
                parent,
                SwiftApiKind::Setter,
                setter,
                signature_string,
                variable.access,
            );
        }
        Ok(())
    }

    fn subscript(&mut self, subscript: &SubscriptDeclaration) -> Result<(), ModelError> {
        let parent = self
            .parent(Some(&subscript.parent), "subscript")?
            .ok_or_else(|| ModelError::MissingParent("subscript".to_string()))?;
        let generics = parent.generic_parameters.clone();
        let ty = self.parse(&subscript.result, &generics, "subscript")?;
        let parameters = subscript
            .parameters
            .iter()
            .map(|parameter| {
                let label = parameter.label.clone().filter(|label| label != "_");
                Ok(SwiftParameter {
                    convention: parameter.convention.into(),
                    parameter_name: parameter.name.clone().or_else(|| label.clone()),
                    argument_label: label,
                    ty: self.parse(&parameter.ty, &generics, "subscript")?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let parent_ty = SwiftType::nominal(Arc::clone(&parent));
        let self_parameter = |mutating: bool| {
            if subscript.is_static {
                SwiftSelfParameter::StaticMethod(parent_ty.clone())
            } else if mutating && !parent_ty.is_reference_type() {
                SwiftSelfParameter::Instance(
                    SwiftParameter::unlabeled("self", parent_ty.clone()).with_convention(ParameterConvention::Inout),
                )
            } else {
                SwiftSelfParameter::Instance(SwiftParameter::unlabeled("self", parent_ty.clone()))
            }
        };
        let signature_string = subscript.signature.clone().unwrap_or_else(|| {
            let modifier = if subscript.is_static { "static " } else { "" };
            let index: Vec<String> = parameters
                .iter()
                .map(|parameter| {
                    let name = parameter.parameter_name.as_deref().unwrap_or("_");
                    match parameter.argument_label.as_deref() {
                        Some(label) if label == name => format!("{label}: {}", parameter.ty),
                        Some(label) => format!("{label} {name}: {}", parameter.ty),
                        None => format!("{name}: {}", parameter.ty),
                    }
                })
                .collect();
            let accessors = if subscript.settable { " { get set }" } else { "" };
            format!(
                "{} {modifier}subscript({}) -> {ty}{accessors}",
                subscript.access,
                index.join(", ")
            )
        });

        let getter = SwiftFunctionSignature::new(parameters.clone(), ty.clone()).with_self(self_parameter(false));
        self.push(
            "subscript",
            Some(Arc::clone(&parent)),
            SwiftApiKind::SubscriptGetter,
            getter,
            signature_string.clone(),
            subscript.access,
        );

        if subscript.settable {
            let mut parameters = parameters;
            parameters.push(SwiftParameter::unlabeled("newValue", ty));
            let setter = SwiftFunctionSignature::new(parameters, SwiftType::void()).with_self(self_parameter(true));
            self.push(
                "subscript",
                Some(parent),
                SwiftApiKind::SubscriptSetter,
                setter,
                signature_string,
                subscript.access,
            );
        }
        Ok(())
    }

    fn enum_case(&mut self, case: &EnumCaseDeclaration) -> Result<(), ModelError> {
        let parent = self
            .parent(Some(&case.parent), &case.name)?
            .ok_or_else(|| ModelError::MissingParent(case.name.clone()))?;
        let ty = SwiftType::nominal(Arc::clone(&parent));
        let signature =
            SwiftFunctionSignature::new(Vec::new(), ty.clone()).with_self(SwiftSelfParameter::StaticMethod(ty));
        let signature_string = case
            .signature
            .clone()
            .unwrap_or_else(|| format!("case {}", case.name));
        self.push(
            &case.name,
            Some(parent),
            SwiftApiKind::EnumCase,
            signature,
            signature_string,
            case.access,
        );
        Ok(())
    }
}

/// `public func f(x: Int, _ y: Int) async throws -> Int`
fn function_signature_string(function: &FunctionDeclaration, signature: &SwiftFunctionSignature) -> String {
    let parameters: Vec<String> = signature
        .parameters
        .iter()
        .map(|parameter| {
            let label = parameter.argument_label.as_deref().unwrap_or("_");
            let name = parameter.parameter_name.as_deref().unwrap_or("_");
            let binding = if label == name {
                label.to_string()
            } else {
                format!("{label} {name}")
            };
            let inout = if parameter.is_inout() { "inout " } else { "" };
            let escaping = match &parameter.ty {
                SwiftType::Function(function) if function.is_escaping => "@escaping ",
                _ => "",
            };
            format!("{binding}: {inout}{escaping}{}", parameter.ty)
        })
        .collect();

    let mut text = format!("{} ", function.access);
    if function.is_static {
        text.push_str("static ");
    }
    if function.mutating {
        text.push_str("mutating ");
    }
    match function.kind {
        FunctionKind::Initializer => text.push_str("init"),
        FunctionKind::Function => {
            text.push_str("func ");
            text.push_str(&function.name);
        }
    }
    if !function.generic_parameters.is_empty() {
        text.push_str(&format!("<{}>", function.generic_parameters.join(", ")));
    }
    text.push_str(&format!("({})", parameters.join(", ")));
    for effect in &signature.effects {
        text.push_str(&format!(" {effect}"));
    }
    if function.kind == FunctionKind::Function && !signature.result.is_void() {
        text.push_str(&format!(" -> {}", signature.result));
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "module": "MySwiftLibrary",
        "types": [
            { "name": "MySwiftClass", "kind": "class" },
            { "name": "Point", "kind": "struct" },
            { "name": "Direction", "kind": "enum" }
        ],
        "functions": [
            { "name": "helloWorld" },
            {
                "name": "globalTakeInt",
                "parameters": [{ "label": "_", "name": "i", "type": "Int" }],
                "result": "Int32?",
                "effects": ["throws"]
            },
            { "name": "init", "kind": "initializer", "parent": "MySwiftClass",
              "parameters": [{ "name": "len", "type": "Int" }, { "name": "cap", "type": "Int" }] },
            { "name": "translate", "parent": "Point", "mutating": true,
              "parameters": [{ "label": "by", "name": "delta", "type": "(Double, Double)" }] }
        ],
        "variables": [
            { "name": "counter", "parent": "MySwiftClass", "type": "Int32", "settable": true },
            { "name": "isEmpty", "parent": "Point", "type": "Bool" }
        ],
        "enum_cases": [{ "name": "north", "parent": "Direction" }]
    }"#;

    fn module() -> ImportedModule {
        ModuleDeclarations::from_json(MODEL).unwrap().resolve(None).unwrap()
    }

    #[test]
    fn test_resolve_flattens_declarations() {
        let module = module();
        assert_eq!(module.module_name, "MySwiftLibrary");
        assert_eq!(module.types.len(), 3);
        let names: Vec<String> = module.functions.iter().map(ImportedFunc::java_name).collect();
        assert_eq!(
            names,
            ["helloWorld", "globalTakeInt", "init", "translate", "getCounter", "setCounter", "isEmpty", "north"]
        );
        for (index, func) in module.functions.iter().enumerate() {
            assert_eq!(func.id, DeclId(index));
        }
        assert_eq!(module.global_functions().count(), 2);
        assert_eq!(module.members_of("MySwiftClass").count(), 3);
    }

    #[test]
    fn test_synthesized_signature_strings() {
        let module = module();
        assert_eq!(module.functions[0].signature_string, "public func helloWorld()");
        assert_eq!(
            module.functions[1].signature_string,
            "public func globalTakeInt(_ i: Int) throws -> Int32?"
        );
        assert_eq!(module.functions[2].signature_string, "public init(len: Int, cap: Int)");
        assert_eq!(
            module.functions[3].signature_string,
            "public mutating func translate(by delta: (Double, Double))"
        );
        assert_eq!(module.functions[4].signature_string, "public var counter: Int32");
    }

    #[test]
    fn test_self_parameters() {
        let module = module();
        let init = &module.functions[2];
        assert_eq!(init.api_kind, SwiftApiKind::Initializer);
        assert!(init.is_static());
        assert!(matches!(init.signature.self_parameter, Some(SwiftSelfParameter::Initializer(_))));

        let translate = &module.functions[3];
        match &translate.signature.self_parameter {
            Some(SwiftSelfParameter::Instance(parameter)) => assert!(parameter.is_inout()),
            other => panic!("unexpected self: {other:?}"),
        }

        // Class setters do not need an inout self.
        let setter = &module.functions[5];
        match &setter.signature.self_parameter {
            Some(SwiftSelfParameter::Instance(parameter)) => assert!(!parameter.is_inout()),
            other => panic!("unexpected self: {other:?}"),
        }
        assert_eq!(setter.signature.parameters[0].parameter_name.as_deref(), Some("newValue"));
    }

    #[test]
    fn test_enum_case_is_static_getter_of_enum() {
        let module = module();
        let case = &module.functions[7];
        assert_eq!(case.api_kind, SwiftApiKind::EnumCase);
        assert_eq!(case.signature.result.to_string(), "Direction");
        assert_eq!(case.qualified_name(), "Direction.north");
    }

    #[test]
    fn test_subscripts_become_accessor_pairs() {
        let module = ModuleDeclarations::from_json(
            r#"{
                "module": "SwiftModule",
                "types": [{ "name": "MyStruct", "kind": "struct" }],
                "subscripts": [
                    { "parent": "MyStruct", "parameters": [{ "name": "index", "type": "Int32" }],
                      "result": "Int32", "settable": true }
                ]
            }"#,
        )
        .unwrap()
        .resolve(None)
        .unwrap();
        let [getter, setter] = module.functions.as_slice() else {
            panic!("expected a getter and a setter");
        };
        assert_eq!(getter.api_kind, SwiftApiKind::SubscriptGetter);
        assert_eq!(getter.java_name(), "getSubscript");
        assert_eq!(getter.signature.parameters.len(), 1);
        assert_eq!(getter.signature.parameters[0].argument_label, None);
        assert_eq!(
            getter.signature_string,
            "public subscript(index: Int32) -> Int32 { get set }"
        );

        assert_eq!(setter.api_kind, SwiftApiKind::SubscriptSetter);
        assert_eq!(setter.java_name(), "setSubscript");
        let names: Vec<_> = setter
            .signature
            .parameters
            .iter()
            .map(|parameter| parameter.parameter_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["index", "newValue"]);
        let Some(SwiftSelfParameter::Instance(self_parameter)) = &setter.signature.self_parameter else {
            panic!("expected an instance setter");
        };
        assert!(self_parameter.is_inout());
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let model = r#"{ "module": "M", "functions": [{ "name": "f", "parent": "Nope" }] }"#;
        let err = ModuleDeclarations::from_json(model).unwrap().resolve(None).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParent { .. }));
    }

    #[test]
    fn test_unparsable_type_names_the_declaration() {
        let model = r#"{ "module": "M", "functions": [{ "name": "f", "result": "Int<" }] }"#;
        let err = ModuleDeclarations::from_json(model).unwrap().resolve(None).unwrap_err();
        assert!(err.to_string().starts_with("Invalid type in 'f'"));
    }

    #[test]
    fn test_module_name_override() {
        let module = ModuleDeclarations::from_json(MODEL)
            .unwrap()
            .resolve(Some("Renamed"))
            .unwrap();
        assert_eq!(module.functions[0].module_name, "Renamed");
        assert_eq!(module.types[0].decl.module_name, "Renamed");
    }

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized("count"), "Count");
        assert_eq!(capitalized(""), "");
    }
}
