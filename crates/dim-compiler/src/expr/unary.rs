//! Prefix operators and postfix `@`.

use dim_core::{CompilationError, Expr, Span, Type, UnaryOp};

use super::ExprCompiler;
use crate::expr_info::ExprInfo;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_unary(
    compiler: &mut ExprCompiler<'_, '_>,
    op: UnaryOp,
    operand: &Expr,
    span: Span,
) -> Result<ExprInfo> {
    let (ty, code) = compiler.value(operand)?;
    if ty.is_class() {
        return Err(CompilationError::invalid(
            format!("cannot apply {} to {ty}", op.as_str()),
            span,
        ));
    }
    Ok(ExprInfo::value(ty, format!("({}({code}))", op.as_str())))
}

/// `x@`: abort at runtime when `x` is nil, otherwise `x` as non-nullable.
pub(super) fn compile_unwrap(compiler: &mut ExprCompiler<'_, '_>, operand: &Expr, span: Span) -> Result<ExprInfo> {
    let (class, code) = compiler.class_value(operand, "@")?;
    if class.is_nil() || !class.nullable {
        return Err(CompilationError::invalid(
            format!("cannot use @ on non-nullable {class}"),
            span,
        ));
    }
    let result = Type::Class(class.with_nullable(false));
    let c_type = compiler.ctx().c_type(&result, span)?;
    Ok(ExprInfo::value(
        result,
        format!("(({c_type})runtime_unwrap((void*)({code}), {}))", span.line),
    ))
}
