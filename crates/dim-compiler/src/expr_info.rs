//! Result of compiling one expression.

use dim_core::{CompilationError, Span, Type};

/// The C text of an expression and its static type.
///
/// `ty` is `None` only for calls to methods without a return type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    pub ty: Option<Type>,
    pub code: String,
}

impl ExprInfo {
    pub fn value(ty: Type, code: impl Into<String>) -> Self {
        Self {
            ty: Some(ty),
            code: code.into(),
        }
    }

    pub fn void(code: impl Into<String>) -> Self {
        Self {
            ty: None,
            code: code.into(),
        }
    }

    /// The type, or a mismatch error when the expression produces nothing.
    pub fn value_type(&self, span: impl Into<Span>) -> Result<&Type, CompilationError> {
        self.ty.as_ref().ok_or_else(|| {
            CompilationError::mismatch(format!("void call {} used as a value", self.code), span)
        })
    }
}
