//! Type model.
//!
//! A [`Type`] is either a primitive [`ValueKind`] or a [`ClassType`] naming a
//! class or interface. Class references coming out of the parser may be
//! partially qualified (no namespace, or a namespace prefix); the registry
//! resolves them to a concrete definition.
//!
//! Compatibility between types (`TypeMatches`) needs the class graph and
//! therefore lives in the compiler's `conversion` module.

use std::fmt;

/// Namespace of the nil sentinel type.
pub const NIL_NAMESPACE: &str = "__";

/// Name of the nil sentinel type.
pub const NIL_NAME: &str = "Nullable";

// ============================================================================
// ValueKind
// ============================================================================

/// The closed set of primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    SByte,
    Byte,
    Char,
    Short,
    UShort,
    CStr,
    Inst,
    /// Numeric literal that has not been forced to a concrete width.
    UnknownNumber,
}

impl ValueKind {
    /// Every primitive a program can name (excludes the literal placeholder).
    pub const ALL: [ValueKind; 14] = [
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::UInt,
        ValueKind::Long,
        ValueKind::ULong,
        ValueKind::Float,
        ValueKind::Double,
        ValueKind::SByte,
        ValueKind::Byte,
        ValueKind::Char,
        ValueKind::Short,
        ValueKind::UShort,
        ValueKind::CStr,
        ValueKind::Inst,
    ];

    /// Look up a primitive by its source name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => ValueKind::Bool,
            "int" => ValueKind::Int,
            "uint" => ValueKind::UInt,
            "long" => ValueKind::Long,
            "ulong" => ValueKind::ULong,
            "float" => ValueKind::Float,
            "double" => ValueKind::Double,
            "sbyte" => ValueKind::SByte,
            "byte" => ValueKind::Byte,
            "char" => ValueKind::Char,
            "short" => ValueKind::Short,
            "ushort" => ValueKind::UShort,
            "cstr" => ValueKind::CStr,
            "inst" => ValueKind::Inst,
            "unknown_number" => ValueKind::UnknownNumber,
            _ => return None,
        })
    }

    /// Source name, also used as the metadata encoding.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Long => "long",
            ValueKind::ULong => "ulong",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::SByte => "sbyte",
            ValueKind::Byte => "byte",
            ValueKind::Char => "char",
            ValueKind::Short => "short",
            ValueKind::UShort => "ushort",
            ValueKind::CStr => "cstr",
            ValueKind::Inst => "inst",
            ValueKind::UnknownNumber => "unknown_number",
        }
    }

    /// The C spelling of this primitive.
    ///
    /// Returns `None` for the literal placeholder, which never appears in a
    /// declaration.
    pub fn c_type(self) -> Option<&'static str> {
        Some(match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int32_t",
            ValueKind::UInt => "uint32_t",
            ValueKind::Long => "int64_t",
            ValueKind::ULong => "uint64_t",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::SByte => "int8_t",
            ValueKind::Byte => "uint8_t",
            ValueKind::Char => "char",
            ValueKind::Short => "int16_t",
            ValueKind::UShort => "uint16_t",
            ValueKind::CStr => "const char*",
            ValueKind::Inst => "Instance*",
            ValueKind::UnknownNumber => return None,
        })
    }

    #[inline]
    pub fn is_unknown_number(self) -> bool {
        self == ValueKind::UnknownNumber
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ClassType
// ============================================================================

/// A reference to a class or interface by (possibly partial) name.
///
/// `namespace` is `None` for an unqualified reference and may be a prefix of
/// the real namespace. Nullability is orthogonal to identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub namespace: Option<String>,
    pub name: String,
    pub nullable: bool,
}

impl ClassType {
    /// A fully qualified, non-nullable reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            nullable: false,
        }
    }

    /// A reference by bare name, resolved later against the module's imports.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            nullable: false,
        }
    }

    /// The untyped `nil` sentinel.
    pub fn nil() -> Self {
        Self {
            namespace: Some(NIL_NAMESPACE.to_string()),
            name: NIL_NAME.to_string(),
            nullable: true,
        }
    }

    pub fn is_nil(&self) -> bool {
        self.name == NIL_NAME && self.namespace.as_deref() == Some(NIL_NAMESPACE)
    }

    /// Builder: mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Copy with a different nullability.
    pub fn with_nullable(&self, nullable: bool) -> Self {
        Self {
            nullable,
            ..self.clone()
        }
    }

    /// Copy with the namespace filled in.
    pub fn qualified(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..self.clone()
        }
    }

    /// Whether the namespace has been resolved (or was written out).
    pub fn is_qualified(&self) -> bool {
        self.namespace.as_deref().is_some_and(|ns| !ns.trim().is_empty())
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}::{}", ns, self.name)?,
            None => f.write_str(&self.name)?,
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Type
// ============================================================================

/// A value or class type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Value(ValueKind),
    Class(ClassType),
}

impl Type {
    /// Shorthand for a primitive type.
    pub fn value(kind: ValueKind) -> Self {
        Type::Value(kind)
    }

    /// Shorthand for a fully qualified, non-nullable class type.
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Class(ClassType::new(namespace, name))
    }

    /// The type of the `nil` literal.
    pub fn nil() -> Self {
        Type::Class(ClassType::nil())
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            Type::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<ValueKind> {
        match self {
            Type::Value(kind) => Some(*kind),
            Type::Class(_) => None,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }

    /// Whether this is a nullable class type. Values are never nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Class(class) if class.nullable)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Type::Class(class) if class.is_nil())
    }
}

impl From<ValueKind> for Type {
    fn from(kind: ValueKind) -> Self {
        Type::Value(kind)
    }
}

impl From<ClassType> for Type {
    fn from(class: ClassType) -> Self {
        Type::Class(class)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Value(kind) => kind.fmt(f),
            Type::Class(class) => class.fmt(f),
        }
    }
}
