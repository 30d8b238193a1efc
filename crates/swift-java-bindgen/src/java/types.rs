//! The Java type model.

use std::fmt;

/// A Java class, possibly generic. Nested classes use `.` in `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JavaClass {
    /// `None` for classes referenced by simple name through an import.
    pub package: Option<String>,
    pub name: String,
    pub type_parameters: Vec<JavaType>,
}

/// A Java type as it appears in generated source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    Array(Box<JavaType>),
    Class(JavaClass),
}

impl JavaType {
    /// A class referenced by its fully qualified name.
    pub fn class(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Class(JavaClass {
            package: Some(package.into()),
            name: name.into(),
            type_parameters: Vec::new(),
        })
    }

    /// A class referenced by simple name; its package is imported.
    pub fn imported(name: impl Into<String>) -> Self {
        Self::Class(JavaClass {
            package: None,
            name: name.into(),
            type_parameters: Vec::new(),
        })
    }

    /// Parse `java.lang.Long` or `com.example.Outer.Inner` style names.
    /// The package ends at the first segment starting with an uppercase
    /// letter.
    pub fn from_qualified_name(qualified: &str) -> Self {
        let segments: Vec<&str> = qualified.split('.').collect();
        let split = segments
            .iter()
            .position(|segment| segment.chars().next().is_some_and(char::is_uppercase))
            .unwrap_or(segments.len().saturating_sub(1));
        let (package, name) = segments.split_at(split);
        if package.is_empty() {
            Self::imported(name.join("."))
        } else {
            Self::class(package.join("."), name.join("."))
        }
    }

    pub fn with_type_parameters(self, type_parameters: Vec<JavaType>) -> Self {
        match self {
            Self::Class(class) => Self::Class(JavaClass {
                type_parameters,
                ..class
            }),
            other => other,
        }
    }

    pub fn array(element: JavaType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn string() -> Self {
        Self::class("java.lang", "String")
    }

    pub fn uuid() -> Self {
        Self::class("java.util", "UUID")
    }

    pub fn memory_segment() -> Self {
        Self::class("java.lang.foreign", "MemorySegment")
    }

    pub fn optional(wrapped: JavaType) -> Self {
        Self::imported("Optional").with_type_parameters(vec![wrapped.boxed()])
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Void | Self::Array(_) | Self::Class(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// The wrapper class of a primitive; other types are returned as is.
    pub fn boxed(&self) -> JavaType {
        let name = match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Char => "Character",
            Self::Short => "Short",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Void => "Void",
            Self::Array(_) | Self::Class(_) => return self.clone(),
        };
        Self::class("java.lang", name)
    }

    /// Bit width of a primitive value.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Self::Boolean | Self::Byte => Some(8),
            Self::Char | Self::Short => Some(16),
            Self::Int | Self::Float => Some(32),
            Self::Long | Self::Double => Some(64),
            Self::Void | Self::Array(_) | Self::Class(_) => None,
        }
    }

    /// A literal of this type usable as a placeholder value.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            Self::Boolean => "false",
            Self::Byte => "(byte) 0",
            Self::Char => "(char) 0",
            Self::Short => "(short) 0",
            Self::Int => "0",
            Self::Long => "0L",
            Self::Float => "0.0f",
            Self::Double => "0.0",
            Self::Void | Self::Array(_) | Self::Class(_) => "null",
        }
    }

    /// The JVM type descriptor, e.g. `J` or `Ljava/lang/String;`.
    pub fn descriptor(&self) -> String {
        match self {
            Self::Boolean => "Z".to_string(),
            Self::Byte => "B".to_string(),
            Self::Char => "C".to_string(),
            Self::Short => "S".to_string(),
            Self::Int => "I".to_string(),
            Self::Long => "J".to_string(),
            Self::Float => "F".to_string(),
            Self::Double => "D".to_string(),
            Self::Void => "V".to_string(),
            Self::Array(element) => format!("[{}", element.descriptor()),
            Self::Class(class) => {
                let binary_name = class.name.replace('.', "$");
                match &class.package {
                    Some(package) => format!("L{}/{binary_name};", package.replace('.', "/")),
                    None => format!("L{binary_name};"),
                }
            }
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Byte => f.write_str("byte"),
            Self::Char => f.write_str("char"),
            Self::Short => f.write_str("short"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Void => f.write_str("void"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Class(class) => {
                if let Some(package) = &class.package {
                    write!(f, "{package}.")?;
                }
                f.write_str(&class.name)?;
                if !class.type_parameters.is_empty() {
                    let parameters: Vec<String> = class.type_parameters.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", parameters.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// A method descriptor such as `(JZ)J`.
pub fn method_descriptor(parameters: &[JavaType], result: &JavaType) -> String {
    let parameters: String = parameters.iter().map(JavaType::descriptor).collect();
    format!("({parameters}){}", result.descriptor())
}

/// A parameter of a generated Java method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaParameter {
    pub name: String,
    pub ty: JavaType,
    /// Annotations printed before the type, e.g. `@Unsigned`.
    pub annotations: Vec<String>,
}

impl JavaParameter {
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations = annotations;
        self
    }
}

impl fmt::Display for JavaParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for annotation in &self.annotations {
            write!(f, "{annotation} ")?;
        }
        write!(f, "{} {}", self.ty, self.name)
    }
}
