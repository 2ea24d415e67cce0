//! Methods and fields.

use crate::ast::Stmt;
use crate::types::Type;

/// A static or instance field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub line: u32,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>, line: u32) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            line,
        }
    }
}

/// What a method's generated C function does.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    /// Source statements.
    Source(Stmt),
    /// Synthesized: wrap the instance in `STD::Any`.
    Box,
    /// Synthesized: checked extraction from `STD::Any`.
    Unbox,
    /// Signature only, compiled in another package.
    External,
}

/// A method signature plus body.
///
/// Instance methods carry their receiver as the first parameter. The
/// `ordinal` is the method's slot in its class's method table and is stable
/// across serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Option<Type>,
    pub body: MethodBody,
    pub ordinal: usize,
    pub line: u32,
}

impl Method {
    /// A method with a source body. The ordinal is assigned when the method
    /// is added to a class.
    pub fn new(
        name: impl Into<String>,
        params: Vec<Type>,
        return_type: Option<Type>,
        body: Stmt,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body: MethodBody::Source(body),
            ordinal: 0,
            line,
        }
    }

    /// A signature-only method, as read back from package metadata.
    pub fn external(
        name: impl Into<String>,
        params: Vec<Type>,
        return_type: Option<Type>,
        ordinal: usize,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body: MethodBody::External,
            ordinal,
            line: 0,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.body, MethodBody::External)
    }

    /// Same name, parameter list and return type.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.return_type == other.return_type
    }
}
