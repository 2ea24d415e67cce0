//! Conditional expressions and branch unification.

use dim_core::{CompilationError, Expr, Span, Type};

use super::ExprCompiler;
use crate::conversion::type_matches;
use crate::expr_info::ExprInfo;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_if(
    compiler: &mut ExprCompiler<'_, '_>,
    condition: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
    span: Span,
) -> Result<ExprInfo> {
    let condition = compiler.condition_code(condition)?;
    let then_arm = compiler.value(then_branch)?;
    let else_arm = compiler.value(else_branch)?;
    let (ty, then_code, else_code) = unify_branches(compiler, then_arm, else_arm, span)?;
    Ok(ExprInfo::value(ty, format!("({condition} ? {then_code} : {else_code})")))
}

/// Common type of two conditional arms, and the arms' C text cast to it.
///
/// The arms must match in one direction with nullability ignored; the
/// wider one wins and the result is nullable if either arm is. A `nil` arm
/// takes the other arm's type.
pub(crate) fn unify_branches(
    compiler: &ExprCompiler<'_, '_>,
    (then_ty, then_code): (Type, String),
    (else_ty, else_code): (Type, String),
    span: Span,
) -> Result<(Type, String, String)> {
    let ctx = compiler.ctx();
    let mismatch = || {
        CompilationError::mismatch(
            format!("branch types differ: {then_ty} and {else_ty}"),
            span,
        )
    };

    match (&then_ty, &else_ty) {
        (Type::Value(t), Type::Value(e)) => {
            let result = if t == e || e.is_unknown_number() {
                *t
            } else if t.is_unknown_number() {
                *e
            } else {
                return Err(mismatch());
            };
            Ok((Type::Value(result), then_code, else_code))
        }
        (Type::Class(t), Type::Class(e)) => {
            let nullable = t.nullable || e.nullable;
            let wider = if t.is_nil() {
                e
            } else if e.is_nil() || type_matches(ctx, &then_ty, &else_ty, true, span)? {
                t
            } else if type_matches(ctx, &else_ty, &then_ty, true, span)? {
                e
            } else {
                return Err(mismatch());
            };
            let result = Type::Class(wider.with_nullable(nullable));
            if wider.is_nil() {
                return Ok((result, then_code, else_code));
            }
            let then_code = compiler.cast_to(&result, &then_code, span)?;
            let else_code = compiler.cast_to(&result, &else_code, span)?;
            Ok((result, then_code, else_code))
        }
        _ => Err(mismatch()),
    }
}
