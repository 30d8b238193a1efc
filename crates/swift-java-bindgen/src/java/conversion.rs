//! Conversion programs for the Java side of a binding.
//!
//! A [`JavaConversionStep`] for a parameter turns the Java argument
//! (the placeholder) into the value(s) passed to the downcall; for a result
//! it turns the downcall expression (the placeholder) into the value the
//! Java method returns. Statements a conversion needs are printed into the
//! [`CodePrinter`] before the rendered expression is used.

use swift_java_abi::CodePrinter;

use super::types::JavaType;

/// Which arena an allocation is made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arena {
    /// A confined arena scoped to the call: `arena$`.
    Temporary,
    /// The caller supplied arena that owns returned values: `swiftArena$`.
    Swift,
}

impl Arena {
    pub fn variable(self) -> &'static str {
        match self {
            Self::Temporary => "arena$",
            Self::Swift => "swiftArena$",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaConversionStep {
    /// The value being converted.
    Placeholder,
    /// The placeholder with a suffix, e.g. `delta_0` for a tuple element.
    ExplodedName(String),
    Constant(String),
    /// `x.$memorySegment()`
    SwiftValueSelfSegment(Box<JavaConversionStep>),
    /// `x.$memoryAddress()`
    MemoryAddress(Box<JavaConversionStep>),
    /// `x.$typeMetadataAddress()`
    TypeMetadataAddress(Box<JavaConversionStep>),
    /// `function(inner[, arena])`
    Call {
        inner: Box<JavaConversionStep>,
        function: String,
        arena: Option<Arena>,
    },
    /// `inner.method(arguments[, arena])`
    Method {
        inner: Box<JavaConversionStep>,
        method: String,
        arguments: Vec<JavaConversionStep>,
        arena: Option<Arena>,
    },
    /// `new T(inner, swiftArena$)`
    ConstructSwiftValue {
        inner: Box<JavaConversionStep>,
        ty: JavaType,
    },
    /// `T.wrapMemoryAddressUnsafe(inner, swiftArena$)`
    WrapMemoryAddress {
        inner: Box<JavaConversionStep>,
        ty: JavaType,
    },
    /// `new T(inner)`
    Construct {
        inner: Box<JavaConversionStep>,
        ty: JavaType,
    },
    /// `(T) inner`
    Cast {
        inner: Box<JavaConversionStep>,
        ty: JavaType,
    },
    /// Several values passed as consecutive arguments.
    CommaSeparated(Vec<JavaConversionStep>),
    /// `inner.get(layout, 0)`
    ReadMemorySegment {
        inner: Box<JavaConversionStep>,
        layout: String,
    },
    Ternary {
        condition: Box<JavaConversionStep>,
        then: Box<JavaConversionStep>,
        otherwise: Box<JavaConversionStep>,
    },
    BinaryOp {
        lhs: Box<JavaConversionStep>,
        operator: String,
        rhs: Box<JavaConversionStep>,
    },
    /// Prints `T name = value;` and produces no value.
    Let {
        name: String,
        ty: JavaType,
        value: Box<JavaConversionStep>,
    },
    /// Prints `inner;` and produces no value.
    Print(Box<JavaConversionStep>),
    /// Renders every step in order; the value is the last step's.
    Aggregate(Vec<JavaConversionStep>),
    /// `(parameter) -> { ...; return body; }` with the lambda parameter as
    /// the body's placeholder.
    Lambda {
        parameter: String,
        body: Box<JavaConversionStep>,
    },
}

impl JavaConversionStep {
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    pub fn call(inner: JavaConversionStep, function: impl Into<String>) -> Self {
        Self::Call {
            inner: inner.boxed(),
            function: function.into(),
            arena: None,
        }
    }

    pub fn call_with_arena(inner: JavaConversionStep, function: impl Into<String>, arena: Arena) -> Self {
        Self::Call {
            inner: inner.boxed(),
            function: function.into(),
            arena: Some(arena),
        }
    }

    pub fn method(inner: JavaConversionStep, method: impl Into<String>, arguments: Vec<JavaConversionStep>) -> Self {
        Self::Method {
            inner: inner.boxed(),
            method: method.into(),
            arguments,
            arena: None,
        }
    }

    pub fn cast(inner: JavaConversionStep, ty: JavaType) -> Self {
        Self::Cast {
            inner: inner.boxed(),
            ty,
        }
    }

    pub fn binary(lhs: JavaConversionStep, operator: impl Into<String>, rhs: JavaConversionStep) -> Self {
        Self::BinaryOp {
            lhs: lhs.boxed(),
            operator: operator.into(),
            rhs: rhs.boxed(),
        }
    }

    pub fn ternary(condition: JavaConversionStep, then: JavaConversionStep, otherwise: JavaConversionStep) -> Self {
        Self::Ternary {
            condition: condition.boxed(),
            then: then.boxed(),
            otherwise: otherwise.boxed(),
        }
    }

    pub fn let_binding(name: impl Into<String>, ty: JavaType, value: JavaConversionStep) -> Self {
        Self::Let {
            name: name.into(),
            ty,
            value: value.boxed(),
        }
    }

    fn children(&self) -> Vec<&JavaConversionStep> {
        match self {
            Self::Placeholder | Self::ExplodedName(_) | Self::Constant(_) => Vec::new(),
            Self::SwiftValueSelfSegment(inner)
            | Self::MemoryAddress(inner)
            | Self::TypeMetadataAddress(inner)
            | Self::Call { inner, .. }
            | Self::ConstructSwiftValue { inner, .. }
            | Self::WrapMemoryAddress { inner, .. }
            | Self::Construct { inner, .. }
            | Self::Cast { inner, .. }
            | Self::ReadMemorySegment { inner, .. }
            | Self::Let { value: inner, .. }
            | Self::Print(inner) => vec![&**inner],
            Self::Method { inner, arguments, .. } => std::iter::once(&**inner).chain(arguments).collect(),
            Self::CommaSeparated(steps) | Self::Aggregate(steps) => steps.iter().collect(),
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => vec![&**condition, &**then, &**otherwise],
            Self::BinaryOp { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            // The lambda body is rendered against the lambda parameter.
            Self::Lambda { .. } => Vec::new(),
        }
    }

    /// Whether rendering refers to the caller supplied `swiftArena$`.
    pub fn requires_swift_arena(&self) -> bool {
        let own = match self {
            Self::ConstructSwiftValue { .. } | Self::WrapMemoryAddress { .. } => true,
            Self::Call { arena, .. } | Self::Method { arena, .. } => *arena == Some(Arena::Swift),
            Self::Lambda { body, .. } => body.requires_swift_arena(),
            _ => false,
        };
        own || self.children().into_iter().any(Self::requires_swift_arena)
    }

    /// Whether rendering refers to the call scoped `arena$`.
    pub fn requires_temporary_arena(&self) -> bool {
        let own = match self {
            Self::Call { arena, .. } | Self::Method { arena, .. } => *arena == Some(Arena::Temporary),
            Self::Lambda { body, .. } => body.requires_temporary_arena(),
            _ => false,
        };
        own || self.children().into_iter().any(Self::requires_temporary_arena)
    }

    /// Number of references to the placeholder.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Self::Placeholder | Self::ExplodedName(_) => 1,
            _ => self.children().into_iter().map(Self::placeholder_count).sum(),
        }
    }

    /// Number of comma separated values the rendered expression produces.
    pub fn argument_count(&self) -> usize {
        match self {
            Self::CommaSeparated(steps) => steps.iter().map(Self::argument_count).sum(),
            Self::Let { .. } | Self::Print(_) => 0,
            Self::Aggregate(steps) => steps.last().map_or(0, Self::argument_count),
            _ => 1,
        }
    }

    /// The same program over the placeholder suffixed with `suffix`, for
    /// one element of an exploded tuple.
    pub fn explode(self, suffix: &str) -> Self {
        let explode = |step: Box<Self>| step.explode(suffix).boxed();
        match self {
            Self::Placeholder => Self::ExplodedName(suffix.to_string()),
            Self::ExplodedName(inner) => Self::ExplodedName(format!("{suffix}{inner}")),
            Self::Constant(_) | Self::Lambda { .. } => self,
            Self::SwiftValueSelfSegment(inner) => Self::SwiftValueSelfSegment(explode(inner)),
            Self::MemoryAddress(inner) => Self::MemoryAddress(explode(inner)),
            Self::TypeMetadataAddress(inner) => Self::TypeMetadataAddress(explode(inner)),
            Self::Call { inner, function, arena } => Self::Call {
                inner: explode(inner),
                function,
                arena,
            },
            Self::Method {
                inner,
                method,
                arguments,
                arena,
            } => Self::Method {
                inner: explode(inner),
                method,
                arguments: arguments.into_iter().map(|step| step.explode(suffix)).collect(),
                arena,
            },
            Self::ConstructSwiftValue { inner, ty } => Self::ConstructSwiftValue {
                inner: explode(inner),
                ty,
            },
            Self::WrapMemoryAddress { inner, ty } => Self::WrapMemoryAddress {
                inner: explode(inner),
                ty,
            },
            Self::Construct { inner, ty } => Self::Construct {
                inner: explode(inner),
                ty,
            },
            Self::Cast { inner, ty } => Self::Cast {
                inner: explode(inner),
                ty,
            },
            Self::CommaSeparated(steps) => {
                Self::CommaSeparated(steps.into_iter().map(|step| step.explode(suffix)).collect())
            }
            Self::ReadMemorySegment { inner, layout } => Self::ReadMemorySegment {
                inner: explode(inner),
                layout,
            },
            Self::Ternary {
                condition,
                then,
                otherwise,
            } => Self::Ternary {
                condition: explode(condition),
                then: explode(then),
                otherwise: explode(otherwise),
            },
            Self::BinaryOp { lhs, operator, rhs } => Self::BinaryOp {
                lhs: explode(lhs),
                operator,
                rhs: explode(rhs),
            },
            Self::Let { name, ty, value } => Self::Let {
                name,
                ty,
                value: explode(value),
            },
            Self::Print(inner) => Self::Print(explode(inner)),
            Self::Aggregate(steps) => Self::Aggregate(steps.into_iter().map(|step| step.explode(suffix)).collect()),
        }
    }

    /// Render against `placeholder`, printing any statements first.
    ///
    /// Returns `None` for steps that only print.
    pub fn render(&self, printer: &mut CodePrinter, placeholder: &str) -> Option<String> {
        match self {
            Self::Placeholder => Some(placeholder.to_string()),
            Self::ExplodedName(suffix) => Some(format!("{placeholder}{suffix}")),
            Self::Constant(value) => Some(value.clone()),
            Self::SwiftValueSelfSegment(inner) => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("{inner}.$memorySegment()"))
            }
            Self::MemoryAddress(inner) => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("{inner}.$memoryAddress()"))
            }
            Self::TypeMetadataAddress(inner) => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("{inner}.$typeMetadataAddress()"))
            }
            Self::Call { inner, function, arena } => {
                let mut arguments = vec![inner.render(printer, placeholder)?];
                arguments.extend(arena.map(|arena| arena.variable().to_string()));
                Some(format!("{function}({})", arguments.join(", ")))
            }
            Self::Method {
                inner,
                method,
                arguments,
                arena,
            } => {
                let inner = inner.render(printer, placeholder)?;
                let mut rendered = arguments
                    .iter()
                    .map(|argument| argument.render(printer, placeholder))
                    .collect::<Option<Vec<_>>>()?;
                rendered.extend(arena.map(|arena| arena.variable().to_string()));
                Some(format!("{inner}.{method}({})", rendered.join(", ")))
            }
            Self::ConstructSwiftValue { inner, ty } => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("new {ty}({inner}, {})", Arena::Swift.variable()))
            }
            Self::WrapMemoryAddress { inner, ty } => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("{ty}.wrapMemoryAddressUnsafe({inner}, {})", Arena::Swift.variable()))
            }
            Self::Construct { inner, ty } => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("new {ty}({inner})"))
            }
            Self::Cast { inner, ty } => {
                let rendered = inner.render(printer, placeholder)?;
                if inner.is_atomic() {
                    Some(format!("({ty}) {rendered}"))
                } else {
                    Some(format!("({ty}) ({rendered})"))
                }
            }
            Self::CommaSeparated(steps) => {
                let rendered = steps
                    .iter()
                    .map(|step| step.render(printer, placeholder))
                    .collect::<Option<Vec<_>>>()?;
                Some(rendered.join(", "))
            }
            Self::ReadMemorySegment { inner, layout } => {
                let inner = inner.render(printer, placeholder)?;
                Some(format!("{inner}.get({layout}, 0)"))
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
            Self::Let { name, ty, value } => {
                if let Some(value) = value.render(printer, placeholder) {
                    printer.print(format!("{ty} {name} = {value};"));
                }
                None
            }
            Self::Print(inner) => {
                if let Some(inner) = inner.render(printer, placeholder) {
                    printer.print(format!("{inner};"));
                }
                None
            }
            Self::Aggregate(steps) => steps
                .iter()
                .fold(None, |_, step| step.render(printer, placeholder)),
            Self::Lambda { parameter, body } => {
                let mut inner = CodePrinter::new();
                inner.indent();
                match body.render(&mut inner, parameter) {
                    Some(value) => inner.print(format!("return {value};")),
                    None => inner.print("return null;"),
                }
                Some(format!("({parameter}) -> {{\n{}}}\n", inner.finalize()))
            }
        }
    }

    /// Renders without operators that would bind looser than a cast.
    fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Placeholder
                | Self::ExplodedName(_)
                | Self::Constant(_)
                | Self::SwiftValueSelfSegment(_)
                | Self::MemoryAddress(_)
                | Self::TypeMetadataAddress(_)
                | Self::Call { .. }
                | Self::Method { .. }
                | Self::ReadMemorySegment { .. }
        )
    }
}
