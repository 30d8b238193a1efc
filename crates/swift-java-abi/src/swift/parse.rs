//! A recursive-descent parser for Swift type expressions.
//!
//! Supports the sugar a declaration model needs: `T?`, `T!`, `[T]`,
//! `(A, B)`, `(A) -> B`, `@escaping`, `@convention(c)`, `any P`, `some P`,
//! `P & Q`, `T.Type`, generic arguments and dotted names.

use std::fmt;

use super::signature::{FunctionConvention, ParameterConvention, SwiftFunctionType, SwiftParameter};
use super::symbol_table::SymbolTable;
use super::types::{KnownTypeKind, SwiftNominalType, SwiftType};
use crate::error::TypeParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Punct(char),
    Arrow,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => f.write_str(name),
            Self::Punct(c) => write!(f, "{c}"),
            Self::Arrow => f.write_str("->"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, TypeParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphanumeric() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else if c == '-' {
            chars.next();
            match chars.next() {
                Some('>') => tokens.push(Token::Arrow),
                _ => return Err(TypeParseError::UnexpectedCharacter('-')),
            }
        } else if "()<>[],:?!.&@".contains(c) {
            tokens.push(Token::Punct(c));
            chars.next();
        } else {
            return Err(TypeParseError::UnexpectedCharacter(c));
        }
    }
    Ok(tokens)
}

/// One `Name<Args>` component of a dotted type name.
struct NameComponent {
    name: String,
    generic_arguments: Vec<SwiftType>,
}

pub(crate) struct TypeParser<'a> {
    tokens: Vec<Token>,
    position: usize,
    symbols: &'a SymbolTable,
    generic_parameters: &'a [String],
}

impl<'a> TypeParser<'a> {
    pub(crate) fn new(
        text: &str,
        symbols: &'a SymbolTable,
        generic_parameters: &'a [String],
    ) -> Result<Self, TypeParseError> {
        Ok(Self {
            tokens: tokenize(text)?,
            position: 0,
            symbols,
            generic_parameters,
        })
    }

    pub(crate) fn parse(mut self) -> Result<SwiftType, TypeParseError> {
        let ty = self.parse_type()?;
        match self.peek() {
            None => Ok(ty),
            Some(token) => Err(TypeParseError::UnexpectedToken {
                expected: "end of type",
                found: token.to_string(),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn at_ident(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.peek_at(offset), Some(Token::Ident(name)) if name == keyword)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char, expected: &'static str) -> Result<(), TypeParseError> {
        match self.advance() {
            Some(Token::Punct(found)) if found == c => Ok(()),
            Some(token) => Err(TypeParseError::UnexpectedToken {
                expected,
                found: token.to_string(),
            }),
            None => Err(TypeParseError::UnexpectedEnd(expected)),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, TypeParseError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(token) => Err(TypeParseError::UnexpectedToken {
                expected,
                found: token.to_string(),
            }),
            None => Err(TypeParseError::UnexpectedEnd(expected)),
        }
    }

    fn parse_type(&mut self) -> Result<SwiftType, TypeParseError> {
        let first = self.parse_postfix()?;
        if !self.at_punct('&') {
            return Ok(first);
        }
        let mut protocols = vec![first];
        while self.eat_punct('&') {
            protocols.push(self.parse_postfix()?);
        }
        Ok(SwiftType::Composite(protocols))
    }

    fn parse_postfix(&mut self) -> Result<SwiftType, TypeParseError> {
        let mut ty = self.parse_primary()?;
        loop {
            if self.eat_punct('?') || self.eat_punct('!') {
                ty = SwiftType::optional(ty);
            } else if self.at_punct('.') && self.at_ident(1, "Type") {
                self.position += 2;
                ty = SwiftType::Metatype(Box::new(ty));
            } else {
                return Ok(ty);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<SwiftType, TypeParseError> {
        match self.peek() {
            Some(Token::Punct('@')) => self.parse_attributed(),
            Some(Token::Punct('(')) => self.parse_parenthesized(),
            Some(Token::Punct('[')) => self.parse_array(),
            Some(Token::Ident(name)) if name == "any" => {
                self.position += 1;
                Ok(SwiftType::Existential(Box::new(self.parse_constraint()?)))
            }
            Some(Token::Ident(name)) if name == "some" => {
                self.position += 1;
                Ok(SwiftType::Opaque(Box::new(self.parse_constraint()?)))
            }
            Some(Token::Ident(_)) => self.parse_named(),
            Some(token) => Err(TypeParseError::UnexpectedToken {
                expected: "a type",
                found: token.to_string(),
            }),
            None => Err(TypeParseError::UnexpectedEnd("a type")),
        }
    }

    /// The constraint after `any` or `some`: one protocol or a composition.
    fn parse_constraint(&mut self) -> Result<SwiftType, TypeParseError> {
        let first = self.parse_primary()?;
        if !self.at_punct('&') {
            return Ok(first);
        }
        let mut protocols = vec![first];
        while self.eat_punct('&') {
            protocols.push(self.parse_primary()?);
        }
        Ok(SwiftType::Composite(protocols))
    }

    fn parse_attributed(&mut self) -> Result<SwiftType, TypeParseError> {
        let mut escaping = false;
        let mut convention = FunctionConvention::Swift;
        while self.eat_punct('@') {
            let attribute = self.expect_ident("an attribute name")?;
            match attribute.as_str() {
                "escaping" => escaping = true,
                "convention" => {
                    self.expect_punct('(', "'('")?;
                    let name = self.expect_ident("a calling convention")?;
                    convention = match name.as_str() {
                        "c" => FunctionConvention::C,
                        "swift" => FunctionConvention::Swift,
                        other => {
                            return Err(TypeParseError::UnsupportedSyntax(format!(
                                "@convention({other})"
                            )));
                        }
                    };
                    self.expect_punct(')', "')'")?;
                }
                other => return Err(TypeParseError::UnsupportedSyntax(format!("@{other}"))),
            }
        }
        match self.parse_primary()? {
            SwiftType::Function(function) => Ok(SwiftType::Function(SwiftFunctionType {
                convention,
                is_escaping: escaping,
                ..function
            })),
            other => Err(TypeParseError::UnsupportedSyntax(format!(
                "attribute applied to non-function type '{other}'"
            ))),
        }
    }

    fn parse_array(&mut self) -> Result<SwiftType, TypeParseError> {
        self.expect_punct('[', "'['")?;
        let element = self.parse_type()?;
        if self.at_punct(':') {
            return Err(TypeParseError::UnsupportedSyntax("dictionary types".to_string()));
        }
        self.expect_punct(']', "']'")?;
        let decl = self
            .symbols
            .lookup(KnownTypeKind::Array.name())
            .ok_or_else(|| TypeParseError::UnknownType(KnownTypeKind::Array.name().to_string()))?;
        Ok(SwiftType::Nominal(SwiftNominalType {
            decl,
            generic_arguments: vec![element],
        }))
    }

    fn parse_parenthesized(&mut self) -> Result<SwiftType, TypeParseError> {
        self.expect_punct('(', "'('")?;
        let mut elements = Vec::new();
        if !self.eat_punct(')') {
            loop {
                elements.push(self.parse_element()?);
                if self.eat_punct(',') {
                    continue;
                }
                self.expect_punct(')', "',' or ')'")?;
                break;
            }
        }

        if self.at_ident(0, "async") || self.at_ident(0, "throws") {
            return Err(TypeParseError::UnsupportedSyntax(
                "effectful function types".to_string(),
            ));
        }

        if self.peek() == Some(&Token::Arrow) {
            self.position += 1;
            let result = self.parse_type()?;
            return Ok(SwiftType::Function(SwiftFunctionType::new(elements, result)));
        }

        if elements.iter().any(SwiftParameter::is_inout) {
            return Err(TypeParseError::UnsupportedSyntax("inout tuple element".to_string()));
        }
        let mut types: Vec<SwiftType> = elements.into_iter().map(|element| element.ty).collect();
        if types.len() == 1 {
            if let Some(single) = types.pop() {
                return Ok(single);
            }
        }
        Ok(SwiftType::Tuple(types))
    }

    /// A tuple element or function parameter: `[label [name]:] [inout] T`.
    fn parse_element(&mut self) -> Result<SwiftParameter, TypeParseError> {
        let mut label = None;
        let mut name = None;
        let starts_with_ident = matches!(self.peek(), Some(Token::Ident(_)));
        if starts_with_ident && self.peek_at(1) == Some(&Token::Punct(':')) {
            let first = self.expect_ident("a label")?;
            self.position += 1;
            label = Some(first.clone());
            name = Some(first);
        } else if starts_with_ident
            && matches!(self.peek_at(1), Some(Token::Ident(_)))
            && self.peek_at(2) == Some(&Token::Punct(':'))
        {
            label = Some(self.expect_ident("a label")?);
            name = Some(self.expect_ident("a parameter name")?);
            self.position += 1;
        }
        let label = label.filter(|label| label != "_");

        let convention = if self.at_ident(0, "inout") {
            self.position += 1;
            ParameterConvention::Inout
        } else if self.at_ident(0, "consuming") || self.at_ident(0, "__owned") {
            self.position += 1;
            ParameterConvention::Owned
        } else if self.at_ident(0, "borrowing") {
            self.position += 1;
            ParameterConvention::Borrowed
        } else {
            ParameterConvention::Borrowed
        };

        let ty = self.parse_type()?;
        Ok(SwiftParameter {
            convention,
            argument_label: label,
            parameter_name: name,
            ty,
        })
    }

    fn parse_named(&mut self) -> Result<SwiftType, TypeParseError> {
        let mut components = Vec::new();
        loop {
            let name = self.expect_ident("a type name")?;
            let mut generic_arguments = Vec::new();
            if self.eat_punct('<') {
                loop {
                    generic_arguments.push(self.parse_type()?);
                    if self.eat_punct(',') {
                        continue;
                    }
                    self.expect_punct('>', "',' or '>'")?;
                    break;
                }
            }
            components.push(NameComponent {
                name,
                generic_arguments,
            });
            if self.at_punct('.') && !self.at_ident(1, "Type") {
                self.position += 1;
            } else {
                break;
            }
        }
        self.resolve(components)
    }

    fn resolve(&self, mut components: Vec<NameComponent>) -> Result<SwiftType, TypeParseError> {
        if let [single] = components.as_mut_slice() {
            let arguments = std::mem::take(&mut single.generic_arguments);
            match single.name.as_str() {
                name if self.generic_parameters.iter().any(|parameter| parameter == name) => {
                    if !arguments.is_empty() {
                        return Err(TypeParseError::UnsupportedSyntax(format!(
                            "generic arguments applied to generic parameter '{name}'"
                        )));
                    }
                    return Ok(SwiftType::GenericParameter(name.to_string()));
                }
                "Void" if arguments.is_empty() => return Ok(SwiftType::void()),
                "Optional" => {
                    let found = arguments.len();
                    let mut arguments = arguments.into_iter();
                    return match (arguments.next(), arguments.next()) {
                        (Some(wrapped), None) => Ok(SwiftType::optional(wrapped)),
                        _ => Err(TypeParseError::GenericArgumentCount {
                            name: "Optional".to_string(),
                            expected: 1,
                            found,
                        }),
                    };
                }
                _ => single.generic_arguments = arguments,
            }
        }

        if components.len() > 1
            && components
                .first()
                .is_some_and(|first| first.generic_arguments.is_empty() && self.symbols.is_module_name(&first.name))
        {
            components.remove(0);
        }

        let mut generic_arguments = Vec::new();
        let mut names = Vec::with_capacity(components.len());
        let count = components.len();
        for (index, component) in components.into_iter().enumerate() {
            if !component.generic_arguments.is_empty() {
                if index + 1 != count {
                    return Err(TypeParseError::UnsupportedSyntax(format!(
                        "generic arguments on enclosing type '{}'",
                        component.name
                    )));
                }
                generic_arguments = component.generic_arguments;
            }
            names.push(component.name);
        }
        let qualified_name = names.join(".");

        let decl = self
            .symbols
            .lookup(&qualified_name)
            .ok_or_else(|| TypeParseError::UnknownType(qualified_name.clone()))?;
        if decl.generic_parameters.len() != generic_arguments.len() {
            return Err(TypeParseError::GenericArgumentCount {
                name: qualified_name,
                expected: decl.generic_parameters.len(),
                found: generic_arguments.len(),
            });
        }
        Ok(SwiftType::Nominal(SwiftNominalType {
            decl,
            generic_arguments,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::swift::types::{NominalKind, NominalTypeDecl};

    fn symbols() -> SymbolTable {
        let mut table = SymbolTable::new("MyModule");
        table.register(NominalTypeDecl::new("MyModule", "Point", NominalKind::Struct));
        table.register(NominalTypeDecl::new("MyModule", "Inner", NominalKind::Class).with_parent("Outer"));
        table
    }

    fn round_trip(text: &str) -> String {
        symbols().parse_type(text).unwrap().to_string()
    }

    #[test]
    fn test_parse_scalars_and_sugar() {
        assert_eq!(round_trip("Int"), "Int");
        assert_eq!(round_trip("Swift.Int32?"), "Int32?");
        assert_eq!(round_trip("Optional<Point>"), "Point?");
        assert_eq!(round_trip("[Int8]"), "Array<Int8>");
        assert_eq!(round_trip("Point.Type"), "Point.Type");
        assert_eq!(round_trip("MyModule.Outer.Inner"), "Outer.Inner");
        assert_eq!(round_trip("()"), "Void");
        assert_eq!(round_trip("(Int)"), "Int");
    }

    #[test]
    fn test_parse_tuples_and_functions() {
        assert_eq!(round_trip("(Int, (Float, Double))"), "(Int, (Float, Double))");
        assert_eq!(round_trip("(Int64, Bool) -> Int64"), "(Int64, Bool) -> Int64");
        assert_eq!(round_trip("@convention(c) (Int32) -> Void"), "@convention(c) (Int32) -> Void");

        let escaping = symbols().parse_type("@escaping () -> ()").unwrap();
        assert!(matches!(escaping, SwiftType::Function(function) if function.is_escaping));
    }

    #[test]
    fn test_parse_existentials() {
        assert_eq!(round_trip("any DataProtocol"), "any DataProtocol");
        assert_eq!(round_trip("some DataProtocol"), "some DataProtocol");
        assert_eq!(round_trip("(any DataProtocol)?"), "(any DataProtocol)?");
    }

    #[test]
    fn test_parse_generic_parameter_in_context() {
        let table = symbols();
        let ty = table
            .parse_type_in_context("UnsafePointer<T>", &["T".to_string()])
            .unwrap();
        assert_eq!(ty.to_string(), "UnsafePointer<T>");
    }

    #[test]
    fn test_parse_errors() {
        let table = symbols();
        assert_eq!(
            table.parse_type("Unknown"),
            Err(TypeParseError::UnknownType("Unknown".to_string()))
        );
        assert!(matches!(
            table.parse_type("UnsafePointer"),
            Err(TypeParseError::GenericArgumentCount { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            table.parse_type("[String: Int]"),
            Err(TypeParseError::UnsupportedSyntax(_))
        ));
        assert!(matches!(
            table.parse_type("Int Int"),
            Err(TypeParseError::UnexpectedToken { .. })
        ));
        assert_eq!(table.parse_type("Int%"), Err(TypeParseError::UnexpectedCharacter('%')));
    }
}
