//! Core types for the dim compiler.
//!
//! This crate holds the data every other crate agrees on:
//!
//! - [`types`]: the type model ([`Type`], [`ValueKind`], [`ClassType`])
//! - [`ast`]: method body expressions and statements
//! - [`entries`]: classes, interfaces, methods, fields and modules
//! - [`error`]: [`CompilationError`]
//! - [`Span`] and [`QualifiedName`]
//!
//! It has no knowledge of name resolution; see `dim-registry`.

pub mod ast;
pub mod entries;
pub mod error;
mod qualified_name;
mod span;
pub mod types;

pub use ast::{
    BinaryOp, Block, CatchClause, Expr, ExprKind, IsStmt, LocalId, NodeKey, Stmt, StmtKind,
    TryStmt, UnaryOp,
};
pub use entries::{
    BOX_METHOD, Class, Field, InterfaceDef, InterfaceMethod, Method, MethodBody, Module,
    STANDARD_USING_TYPE, UNBOX_METHOD,
};
pub use error::CompilationError;
pub use qualified_name::QualifiedName;
pub use span::Span;
pub use types::{ClassType, NIL_NAME, NIL_NAMESPACE, Type, ValueKind};
