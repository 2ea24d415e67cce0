//! Expression compiler.
//!
//! [`ExprCompiler::infer`] types an expression bottom-up and produces its C
//! text in the same walk. Every compound expression is fully parenthesised,
//! so callers can splice the text anywhere.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(&mut ctx);
//! let info = compiler.infer(&expr)?;
//! let ty = info.value_type(expr.line)?;
//! ```

mod binary;
mod calls;
pub(crate) mod identifiers;
mod literals;
pub(crate) mod member;
pub(crate) mod narrowing;
mod ternary;
mod unary;

use dim_core::{ClassType, CompilationError, Expr, ExprKind, NodeKey, Span, Type};

use crate::context::CompilationContext;
use crate::emit::strip_parens;
use crate::expr_info::ExprInfo;

pub use narrowing::identity_check;

type Result<T> = std::result::Result<T, CompilationError>;

/// Types and lowers expressions against a compilation context.
pub struct ExprCompiler<'a, 'r> {
    ctx: &'a mut CompilationContext<'r>,
}

impl<'a, 'r> ExprCompiler<'a, 'r> {
    pub fn new(ctx: &'a mut CompilationContext<'r>) -> Self {
        Self { ctx }
    }

    pub(crate) fn ctx(&self) -> &CompilationContext<'r> {
        self.ctx
    }

    pub(crate) fn ctx_mut(&mut self) -> &mut CompilationContext<'r> {
        self.ctx
    }

    /// Type and lower an expression.
    pub fn infer(&mut self, expr: &Expr) -> Result<ExprInfo> {
        let span = Span::line(expr.line);
        match &expr.kind {
            ExprKind::Local(id) => identifiers::compile_local(self, *id, span),
            ExprKind::Argument(index) => identifiers::compile_argument(self, *index, span),
            ExprKind::Class(name) => identifiers::compile_bare_static_field(self, &name.name, span),

            ExprKind::Call { name, args } => {
                calls::compile_call(self, NodeKey::of(expr), name, args, span)
            }
            ExprKind::CallStatic { callee, name, args } => {
                calls::compile_static_call(self, NodeKey::of(expr), callee, name, args, span)
            }
            ExprKind::CallInstance { name, args } => {
                calls::compile_instance_call(self, NodeKey::of(expr), name, args, span)
            }

            ExprKind::StaticField { class, field } => {
                member::compile_static_field(self, class, field, span)
            }
            ExprKind::InstanceField { instance, field } => {
                member::compile_instance_field(self, instance, field, span)
            }

            ExprKind::Number(text) => Ok(literals::compile_number(text)),
            ExprKind::String(text) => Ok(literals::compile_string(text)),
            ExprKind::Nil => Ok(literals::compile_nil()),
            ExprKind::New => literals::compile_new(self),

            ExprKind::Binary { left, op, right } => binary::compile_binary(self, left, *op, right, span),
            ExprKind::Unary { op, operand } => unary::compile_unary(self, *op, operand, span),
            ExprKind::Unwrap(operand) => unary::compile_unwrap(self, operand, span),

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => ternary::compile_if(self, condition, then_branch, else_branch, span),
            ExprKind::Is {
                target,
                bind,
                source,
                then_branch,
                else_branch,
            } => narrowing::compile_is(self, target, *bind, source, then_branch, else_branch, span),
            ExprKind::As { source, target } => narrowing::compile_as(self, source, target, span),
        }
    }

    /// Lower an expression that must produce a value.
    pub fn value(&mut self, expr: &Expr) -> Result<(Type, String)> {
        let info = self.infer(expr)?;
        let ty = info.value_type(expr.line)?.clone();
        Ok((ty, info.code))
    }

    /// Lower an expression that must produce a class-typed value.
    pub fn class_value(&mut self, expr: &Expr, what: &str) -> Result<(ClassType, String)> {
        match self.value(expr)? {
            (Type::Class(class), code) => Ok((class, code)),
            (other, _) => Err(CompilationError::mismatch(
                format!("{what} requires a class type, found {other}"),
                expr.line,
            )),
        }
    }

    /// Lower a condition for `if`/`while`, without the redundant outer
    /// parentheses.
    pub fn condition(&mut self, expr: &Expr) -> Result<String> {
        let code = self.condition_code(expr)?;
        Ok(strip_parens(&code).to_string())
    }

    /// A value-typed condition, parenthesised like any other expression.
    pub(crate) fn condition_code(&mut self, expr: &Expr) -> Result<String> {
        let (ty, code) = self.value(expr)?;
        if ty.is_class() {
            return Err(CompilationError::mismatch(
                format!("condition must be a value type, found {ty}"),
                expr.line,
            ));
        }
        Ok(code)
    }

    /// `(T)(code)`: cast a class-typed value to the C type of `target`.
    pub(crate) fn cast_to(&self, target: &Type, code: &str, span: Span) -> Result<String> {
        Ok(format!("({})({})", self.ctx.c_type(target, span)?, code))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use dim_core::{BinaryOp, ValueKind};

    #[test]
    fn condition_drops_outer_parens() {
        let registry = registry();
        let mut ctx = context(&registry, &[ValueKind::Int.into()]);
        let cond = Expr::binary(Expr::argument(0, 1), BinaryOp::Lt, Expr::number("10", 1));
        let code = ExprCompiler::new(&mut ctx).condition(&cond).unwrap();
        assert_eq!(code, "p_0 < 10");
    }

    #[test]
    fn class_condition_rejected() {
        let registry = registry();
        let mut ctx = context(&registry, &[geo("Circle")]);
        assert!(matches!(
            ExprCompiler::new(&mut ctx).condition(&Expr::argument(0, 3)),
            Err(CompilationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn void_call_is_not_a_value() {
        let registry = registry();
        let mut ctx = context(&registry, &[]);
        let call = Expr::call("Run", vec![], 4);
        assert!(matches!(
            ExprCompiler::new(&mut ctx).value(&call),
            Err(CompilationError::TypeMismatch { span, .. }) if span.line == 4
        ));
    }
}
