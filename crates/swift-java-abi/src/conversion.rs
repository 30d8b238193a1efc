//! Conversion programs for the Swift side of `@_cdecl` thunks.
//!
//! A [`ConversionStep`] describes how to turn the values a thunk receives
//! (or the value an API returns) into what the other side expects. Steps
//! are pure trees; [`ConversionStep::render`] walks a tree against a
//! placeholder expression, printing any supporting statements into a
//! [`CodePrinter`] and returning the resulting expression.
//!
//! # Example
//!
//! ```rust
//! use swift_java_abi::{CodePrinter, ConversionStep, KnownTypeKind, SwiftType};
//!
//! let step = ConversionStep::Pointee(Box::new(ConversionStep::TypedPointer(
//!     Box::new(ConversionStep::Placeholder),
//!     SwiftType::known(KnownTypeKind::Int32),
//! )));
//! let mut printer = CodePrinter::new();
//! let expr = step.render(&mut printer, "value");
//! assert_eq!(expr.as_deref(), Some("value.assumingMemoryBound(to: Int32.self).pointee"));
//! ```

use crate::printer::CodePrinter;
use crate::swift::SwiftType;

/// A call argument with an optional label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledArgument<T> {
    pub label: Option<String>,
    pub argument: T,
}

impl<T> LabeledArgument<T> {
    pub fn labeled(label: impl Into<String>, argument: T) -> Self {
        Self {
            label: Some(label.into()),
            argument,
        }
    }

    pub fn unlabeled(argument: T) -> Self {
        Self {
            label: None,
            argument,
        }
    }
}

/// A conversion program for the Swift side of a `@_cdecl` thunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversionStep {
    /// The value being converted.
    Placeholder,

    Constant(String),

    /// Render the inner step against `<placeholder>_<component>`, one of
    /// the C parameters a single Swift value was exploded into.
    ExplodedComponent(Box<ConversionStep>, String),

    /// `unsafeBitCast(x, to: T.self)`
    UnsafeCastPointer(Box<ConversionStep>, SwiftType),

    /// `x.assumingMemoryBound(to: T.self)`
    TypedPointer(Box<ConversionStep>, SwiftType),

    /// `x.pointee`
    Pointee(Box<ConversionStep>),

    /// `x?`
    OptionalChain(Box<ConversionStep>),

    /// `T(label: a, b)`
    Initialize(SwiftType, Vec<LabeledArgument<ConversionStep>>),

    /// `(a, b)` where element `i` is rendered against `<placeholder>_<i>`.
    Tuplify(Vec<ConversionStep>),

    /// Write the converted value into caller-provided storage:
    /// `name.assumingMemoryBound(to: T.self).initialize(to: x)`.
    PopulatePointer {
        name: String,
        assuming_type: Option<SwiftType>,
        to: Box<ConversionStep>,
    },

    /// Optionally bind the value to a name, then render element `i` of the
    /// tuple against `<value>.<i>`, each as a statement.
    TupleExplode(Vec<ConversionStep>, Option<String>),

    /// Optionally bind the value to a name, then render every step against
    /// it. All but the last are printed as statements; the last is the
    /// value of the whole program.
    Aggregate(Vec<ConversionStep>, Option<String>),

    /// `x.member`
    Member(Box<ConversionStep>, String),

    /// `function(x)`
    Call(Box<ConversionStep>, String),

    /// `if let binding = value { then }`, with `then` rendered against the
    /// binding.
    IfLet {
        value: Box<ConversionStep>,
        binding: String,
        then: Box<ConversionStep>,
    },

    /// `guard let binding = value else { fatalError("message") }`. The
    /// value of the step is the binding.
    UnwrapOptional {
        value: Box<ConversionStep>,
        binding: String,
        message: String,
    },

    /// `condition ? then : otherwise`
    Ternary {
        condition: Box<ConversionStep>,
        then: Box<ConversionStep>,
        otherwise: Box<ConversionStep>,
    },

    /// `lhs <operator> rhs`
    BinaryOp {
        lhs: Box<ConversionStep>,
        operator: String,
        rhs: Box<ConversionStep>,
    },

    /// A closure literal that lowers each of its parameters, calls the
    /// placeholder with the lowered arguments, and raises the result.
    ClosureLowering {
        parameters: Vec<ConversionStep>,
        result: Box<ConversionStep>,
    },
}

impl ConversionStep {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Number of independent input values the step consumes.
    ///
    /// For a lowered parameter this equals the number of C parameters.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Self::Placeholder
            | Self::TupleExplode(..)
            | Self::Aggregate(..)
            | Self::ClosureLowering { .. } => 1,
            Self::Constant(_) => 0,
            Self::ExplodedComponent(inner, _)
            | Self::UnsafeCastPointer(inner, _)
            | Self::TypedPointer(inner, _)
            | Self::Pointee(inner)
            | Self::OptionalChain(inner)
            | Self::Member(inner, _)
            | Self::Call(inner, _) => inner.placeholder_count(),
            Self::PopulatePointer { to, .. } => to.placeholder_count(),
            Self::IfLet { value, .. } | Self::UnwrapOptional { value, .. } => value.placeholder_count(),
            Self::Initialize(_, arguments) => arguments
                .iter()
                .map(|argument| argument.argument.placeholder_count())
                .sum(),
            Self::Tuplify(elements) => elements.iter().map(Self::placeholder_count).sum(),
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => condition.placeholder_count() + then.placeholder_count() + otherwise.placeholder_count(),
            Self::BinaryOp { lhs, rhs, .. } => lhs.placeholder_count() + rhs.placeholder_count(),
        }
    }

    /// Render the step against `placeholder`.
    ///
    /// Returns `None` for steps that only print statements.
    pub fn render(&self, printer: &mut CodePrinter, placeholder: &str) -> Option<String> {
        match self {
            Self::Placeholder => Some(placeholder.to_string()),
            Self::Constant(value) => Some(value.clone()),
            Self::ExplodedComponent(inner, component) => {
                inner.render(printer, &format!("{placeholder}_{component}"))
            }
            Self::UnsafeCastPointer(inner, ty) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("unsafeBitCast({value}, to: {ty}.self)"))
            }
            Self::TypedPointer(inner, ty) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("{value}.assumingMemoryBound(to: {ty}.self)"))
            }
            Self::Pointee(inner) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("{value}.pointee"))
            }
            Self::OptionalChain(inner) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("{value}?"))
            }
            Self::Initialize(ty, arguments) => {
                let arguments = arguments
                    .iter()
                    .map(|argument| {
                        let value = argument.argument.render(printer, placeholder)?;
                        Some(match &argument.label {
                            Some(label) => format!("{label}: {value}"),
                            None => value,
                        })
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("{ty}({})", arguments.join(", ")))
            }
            Self::Tuplify(elements) => {
                let elements = elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| element.render(printer, &format!("{placeholder}_{index}")))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("({})", elements.join(", ")))
            }
            Self::PopulatePointer {
                name,
                assuming_type,
                to,
            } => {
                let value = to.render(printer, placeholder)?;
                Some(match assuming_type {
                    Some(ty) => format!("{name}.assumingMemoryBound(to: {ty}.self).initialize(to: {value})"),
                    None => format!("{name}.initialize(to: {value})"),
                })
            }
            Self::TupleExplode(elements, name) => {
                let base = bind(printer, name.as_deref(), placeholder);
                for (index, element) in elements.iter().enumerate() {
                    if let Some(statement) = element.render(printer, &format!("{base}.{index}")) {
                        printer.print(statement);
                    }
                }
                None
            }
            Self::Aggregate(steps, name) => {
                let base = bind(printer, name.as_deref(), placeholder);
                let mut last = None;
                for step in steps {
                    if let Some(previous) = last.take() {
                        printer.print(previous);
                    }
                    last = step.render(printer, &base);
                }
                last
            }
            Self::Member(inner, member) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("{value}.{member}"))
            }
            Self::Call(inner, function) => {
                let value = inner.render(printer, placeholder)?;
                Some(format!("{function}({value})"))
            }
            Self::IfLet {
                value,
                binding,
                then,
            } => {
                let value = value.render(printer, placeholder)?;
                printer.print_brace_block(format!("if let {binding} = {value}"), |printer| {
                    if let Some(statement) = then.render(printer, binding) {
                        printer.print(statement);
                    }
                });
                None
            }
            Self::UnwrapOptional {
                value,
                binding,
                message,
            } => {
                let value = value.render(printer, placeholder)?;
                let header = if value == *binding {
                    format!("guard let {binding} else")
                } else {
                    format!("guard let {binding} = {value} else")
                };
                printer.print_brace_block(header, |printer| {
                    printer.print(format!("fatalError(\"{message}\")"));
                });
                Some(binding.clone())
            }
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = condition.render(printer, placeholder)?;
                let then = then.render(printer, placeholder)?;
                let otherwise = otherwise.render(printer, placeholder)?;
                Some(format!("{condition} ? {then} : {otherwise}"))
            }
            Self::BinaryOp { lhs, operator, rhs } => {
                let lhs = lhs.render(printer, placeholder)?;
                let rhs = rhs.render(printer, placeholder)?;
                Some(format!("{lhs} {operator} {rhs}"))
            }
            Self::ClosureLowering { parameters, result } => {
                Some(render_closure(parameters, result, placeholder))
            }
        }
    }
}

/// Print `let name = value` when a name is requested and return the
/// expression later steps should refer to.
fn bind(printer: &mut CodePrinter, name: Option<&str>, placeholder: &str) -> String {
    match name {
        Some(name) => {
            printer.print(format!("let {name} = {placeholder}"));
            name.to_string()
        }
        None => placeholder.to_string(),
    }
}

fn render_closure(parameters: &[ConversionStep], result: &ConversionStep, callee: &str) -> String {
    let mut body = CodePrinter::new();
    body.indent();

    let mut names = Vec::with_capacity(parameters.len());
    let mut arguments = Vec::new();
    for (index, parameter) in parameters.iter().enumerate() {
        let name = format!("_{index}");
        match parameter {
            // A tuplified parameter spreads into several C arguments.
            ConversionStep::Tuplify(elements) => {
                for element in elements {
                    arguments.extend(element.render(&mut body, &name));
                }
            }
            _ => arguments.extend(parameter.render(&mut body, &name)),
        }
        names.push(name);
    }

    let call = format!("{callee}({})", arguments.join(", "));
    if let Some(value) = result.render(&mut body, &call) {
        body.print(format!("return {value}"));
    }

    let header = if names.is_empty() {
        "{".to_string()
    } else {
        format!("{{ {} in", names.join(", "))
    };
    format!("{header}\n{}}}", body.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::swift::KnownTypeKind;

    fn render(step: &ConversionStep, placeholder: &str) -> (String, Option<String>) {
        let mut printer = CodePrinter::new();
        let value = step.render(&mut printer, placeholder);
        (printer.finalize(), value)
    }

    fn buffer_initialization() -> ConversionStep {
        let bool_type = SwiftType::known(KnownTypeKind::Bool);
        ConversionStep::Initialize(
            SwiftType::known_generic(KnownTypeKind::UnsafeBufferPointer, vec![bool_type.clone()]),
            vec![
                LabeledArgument::labeled(
                    "start",
                    ConversionStep::TypedPointer(
                        ConversionStep::ExplodedComponent(ConversionStep::Placeholder.boxed(), "pointer".to_string())
                            .boxed(),
                        bool_type,
                    ),
                ),
                LabeledArgument::labeled(
                    "count",
                    ConversionStep::ExplodedComponent(ConversionStep::Placeholder.boxed(), "count".to_string()),
                ),
            ],
        )
    }

    #[test]
    fn test_buffer_initialization() {
        let step = buffer_initialization();
        assert_eq!(step.placeholder_count(), 2);
        let (statements, value) = render(&step, "z");
        assert!(statements.is_empty());
        assert_eq!(
            value.unwrap(),
            "UnsafeBufferPointer<Bool>(start: z_pointer.assumingMemoryBound(to: Bool.self), count: z_count)"
        );
    }

    #[test]
    fn test_nested_tuplify() {
        let step = ConversionStep::Tuplify(vec![
            ConversionStep::Placeholder,
            ConversionStep::Tuplify(vec![ConversionStep::Placeholder, ConversionStep::Placeholder]),
        ]);
        assert_eq!(step.placeholder_count(), 3);
        assert_eq!(render(&step, "t").1.unwrap(), "(t_0, (t_1_0, t_1_1))");
    }

    #[test]
    fn test_tuple_explode_prints_statements() {
        let step = ConversionStep::TupleExplode(
            vec![
                ConversionStep::PopulatePointer {
                    name: "_result_0".to_string(),
                    assuming_type: Some(SwiftType::known(KnownTypeKind::Int)),
                    to: ConversionStep::Placeholder.boxed(),
                },
                ConversionStep::PopulatePointer {
                    name: "_result_1".to_string(),
                    assuming_type: Some(SwiftType::known(KnownTypeKind::Double)),
                    to: ConversionStep::Placeholder.boxed(),
                },
            ],
            Some("_result".to_string()),
        );
        assert_eq!(step.placeholder_count(), 1);
        let (statements, value) = render(&step, "f()");
        assert_eq!(value, None);
        assert_eq!(
            statements,
            "let _result = f()\n\
             _result_0.assumingMemoryBound(to: Int.self).initialize(to: _result.0)\n\
             _result_1.assumingMemoryBound(to: Double.self).initialize(to: _result.1)\n"
        );
    }

    #[test]
    fn test_aggregate_keeps_last_expression() {
        let step = ConversionStep::Aggregate(
            vec![
                ConversionStep::IfLet {
                    value: ConversionStep::Placeholder.boxed(),
                    binding: "value$".to_string(),
                    then: ConversionStep::PopulatePointer {
                        name: "_result".to_string(),
                        assuming_type: Some(SwiftType::known(KnownTypeKind::Int32)),
                        to: ConversionStep::Placeholder.boxed(),
                    }
                    .boxed(),
                },
                ConversionStep::Ternary {
                    condition: ConversionStep::BinaryOp {
                        lhs: ConversionStep::Placeholder.boxed(),
                        operator: "!=".to_string(),
                        rhs: ConversionStep::Constant("nil".to_string()).boxed(),
                    }
                    .boxed(),
                    then: ConversionStep::Constant("1".to_string()).boxed(),
                    otherwise: ConversionStep::Constant("0".to_string()).boxed(),
                },
            ],
            Some("result$".to_string()),
        );
        let (statements, value) = render(&step, "M.f()");
        assert_eq!(
            statements,
            "let result$ = M.f()\n\
             if let value$ = result$ {\n  _result.assumingMemoryBound(to: Int32.self).initialize(to: value$)\n}\n"
        );
        assert_eq!(value.unwrap(), "result$ != nil ? 1 : 0");
    }

    #[test]
    fn test_unwrap_optional_fails_fast() {
        let step = ConversionStep::UnwrapOptional {
            value: ConversionStep::Call(ConversionStep::Placeholder.boxed(), "UnsafeRawPointer".to_string()).boxed(),
            binding: "pointer$".to_string(),
            message: "pointer was null in call to \\(#function)!".to_string(),
        };
        assert_eq!(step.placeholder_count(), 1);
        let (statements, value) = render(&step, "raw");
        assert_eq!(value.unwrap(), "pointer$");
        assert_eq!(
            statements,
            "guard let pointer$ = UnsafeRawPointer(raw) else {\n  fatalError(\"pointer was null in call to \\(#function)!\")\n}\n"
        );

        // An already bound optional uses the shorthand.
        let step = ConversionStep::UnwrapOptional {
            value: ConversionStep::Placeholder.boxed(),
            binding: "value$".to_string(),
            message: "value$ was nil".to_string(),
        };
        let (statements, _) = render(&step, "value$");
        assert_eq!(statements, "guard let value$ else {\n  fatalError(\"value$ was nil\")\n}\n");
    }

    #[test]
    fn test_closure_lowering() {
        let step = ConversionStep::ClosureLowering {
            parameters: vec![
                ConversionStep::Placeholder,
                ConversionStep::Tuplify(vec![
                    ConversionStep::Member(ConversionStep::Placeholder.boxed(), "baseAddress".to_string()),
                    ConversionStep::Member(ConversionStep::Placeholder.boxed(), "count".to_string()),
                ]),
            ],
            result: ConversionStep::Placeholder.boxed(),
        };
        assert_eq!(step.placeholder_count(), 1);
        let (_, value) = render(&step, "callback");
        assert_eq!(
            value.unwrap(),
            "{ _0, _1 in\n  return callback(_0, _1.baseAddress, _1.count)\n}"
        );
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let step = buffer_initialization();
        assert_eq!(render(&step, "a"), render(&step, "a"));
        assert_ne!(render(&step, "a").1, render(&step, "b").1);
    }
}
