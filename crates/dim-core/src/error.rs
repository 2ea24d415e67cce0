//! Compilation errors.
//!
//! Every semantic check in the compiler fails with a [`CompilationError`].
//! Compilation is fail-fast: the first error aborts the unit and is the one
//! diagnostic reported for it.
//!
//! ## Taxonomy
//!
//! ```text
//! CompilationError
//! ├── resolution  UnknownType, AmbiguousSymbol, UnknownMethod, UnknownField,
//! │               UnknownVariable, CircularInheritance, DuplicateField,
//! │               DuplicateDefinition
//! ├── type        TypeMismatch, InvalidOperation, InvalidTarget
//! └── structural  MalformedTry, Internal
//! ```

use thiserror::Error;

use crate::Span;

/// Errors raised while resolving or lowering a compilation unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// No class or interface matches a type reference.
    #[error("at {span}: no class found for {name}")]
    UnknownType {
        /// The reference as written.
        name: String,
        span: Span,
    },

    /// More than one definition matches a reference.
    #[error("at {span}: ambiguous {kind} '{name}': could be {candidates}")]
    AmbiguousSymbol {
        /// What kind of symbol ("class", "static field").
        kind: String,
        name: String,
        /// Comma-separated candidate list.
        candidates: String,
        span: Span,
    },

    /// Overload resolution found zero or several candidates.
    #[error("at {span}: ambiguous or nonexistent method call {name}({args})")]
    UnknownMethod {
        name: String,
        /// Rendered argument types.
        args: String,
        span: Span,
    },

    /// A field is not declared on the type (or its ancestors).
    #[error("at {span}: {kind} field '{field}' not found on {type_name}")]
    UnknownField {
        /// "static" or "instance".
        kind: &'static str,
        field: String,
        type_name: String,
        span: Span,
    },

    /// A local or argument id is not in scope.
    #[error("at {span}: {kind} {id} not found")]
    UnknownVariable {
        /// "local" or "argument".
        kind: &'static str,
        id: usize,
        span: Span,
    },

    /// Walking the base chain revisited a class.
    #[error("at {span}: inheritance cycle detected at {name}")]
    CircularInheritance { name: String, span: Span },

    /// An instance field name is declared twice along an inheritance chain.
    #[error("at {span}: duplicate inherited instance field {field} on class {class}")]
    DuplicateField {
        field: String,
        class: String,
        span: Span,
    },

    /// A class or interface with the same qualified name is already known.
    #[error("at {span}: duplicate definition '{name}'")]
    DuplicateDefinition { name: String, span: Span },

    /// Two types that must be compatible are not.
    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// An operator or construct is applied to an operand it does not accept.
    #[error("at {span}: {message}")]
    InvalidOperation { message: String, span: Span },

    /// Assignment or call target is not valid.
    #[error("at {span}: invalid {what}")]
    InvalidTarget { what: String, span: Span },

    /// A `try` does not wrap a single call or has no `catch`.
    #[error("at {span}: {message}")]
    MalformedTry { message: String, span: Span },

    /// Invariant violation inside the compiler.
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Where the error occurred. Internal errors have no location.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnknownType { span, .. }
            | CompilationError::AmbiguousSymbol { span, .. }
            | CompilationError::UnknownMethod { span, .. }
            | CompilationError::UnknownField { span, .. }
            | CompilationError::UnknownVariable { span, .. }
            | CompilationError::CircularInheritance { span, .. }
            | CompilationError::DuplicateField { span, .. }
            | CompilationError::DuplicateDefinition { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::InvalidOperation { span, .. }
            | CompilationError::InvalidTarget { span, .. }
            | CompilationError::MalformedTry { span, .. } => *span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }

    /// Shorthand for [`CompilationError::TypeMismatch`].
    pub fn mismatch(message: impl Into<String>, span: impl Into<Span>) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span: span.into(),
        }
    }

    /// Shorthand for [`CompilationError::InvalidOperation`].
    pub fn invalid(message: impl Into<String>, span: impl Into<Span>) -> Self {
        CompilationError::InvalidOperation {
            message: message.into(),
            span: span.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal {
            message: message.into(),
        }
    }
}
