//! Binary operators.

use dim_core::{BinaryOp, ClassType, CompilationError, Expr, Span, Type, ValueKind};

use super::ExprCompiler;
use crate::conversion::{same_identity, type_matches};
use crate::expr_info::ExprInfo;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_binary(
    compiler: &mut ExprCompiler<'_, '_>,
    left: &Expr,
    op: BinaryOp,
    right: &Expr,
    span: Span,
) -> Result<ExprInfo> {
    let (lty, lcode) = compiler.value(left)?;
    let (rty, rcode) = compiler.value(right)?;

    match (op, &lty, &rty) {
        (BinaryOp::Coalesce, Type::Class(l), Type::Class(r)) => {
            let result = coalesce_type(compiler, l, r, span)?;
            let c_type = compiler.ctx().c_type(&result, span)?;
            Ok(ExprInfo::value(
                result,
                format!("(({c_type})runtime_null_coalesce((void*)({lcode}), (void*)({rcode})))"),
            ))
        }
        (BinaryOp::Coalesce, _, _) => Err(CompilationError::invalid(
            format!("cannot use ?? on {lty} and {rty}"),
            span,
        )),

        (BinaryOp::Eq | BinaryOp::Ne, Type::Class(l), Type::Class(r)) => {
            if !references_comparable(compiler, l, r, span)? {
                return Err(CompilationError::mismatch(
                    format!("cannot compare {l} with {r}"),
                    span,
                ));
            }
            Ok(ExprInfo::value(
                Type::value(ValueKind::Bool),
                format!("((Instance*)({lcode}) {} (Instance*)({rcode}))", op.as_str()),
            ))
        }

        (_, Type::Value(l), Type::Value(r)) => {
            let operand = value_operand_type(*l, *r).ok_or_else(|| {
                CompilationError::mismatch(
                    format!("type mismatch in {}: left is {l}, right is {r}", op.as_str()),
                    span,
                )
            })?;
            let result = if op.yields_bool() {
                ValueKind::Bool
            } else {
                operand
            };
            let code = match op {
                BinaryOp::And => format!("({lcode} ? {rcode} : 0)"),
                BinaryOp::Or => format!("({lcode} ? 1 : {rcode})"),
                _ => format!("({lcode} {} {rcode})", op.as_str()),
            };
            Ok(ExprInfo::value(Type::value(result), code))
        }

        _ => Err(CompilationError::invalid(
            format!("cannot use {} on {lty} and {rty}", op.as_str()),
            span,
        )),
    }
}

/// Both operands of an arithmetic or comparison operator name the same
/// value kind; an unsized literal takes the other side's kind.
fn value_operand_type(left: ValueKind, right: ValueKind) -> Option<ValueKind> {
    if left == right {
        Some(left)
    } else if right.is_unknown_number() {
        Some(left)
    } else if left.is_unknown_number() {
        Some(right)
    } else {
        None
    }
}

/// `a ?? b`: both sides name the same class, or one side is `nil`. The
/// result is nullable only when the fallback is.
fn coalesce_type(compiler: &ExprCompiler<'_, '_>, left: &ClassType, right: &ClassType, span: Span) -> Result<Type> {
    let identity = match (left.is_nil(), right.is_nil()) {
        (true, true) => {
            return Err(CompilationError::invalid("cannot use ?? on nil and nil", span));
        }
        (true, false) => right,
        (false, true) => left,
        (false, false) => {
            if !same_identity(compiler.ctx(), left, right, span)? {
                return Err(CompilationError::mismatch(
                    format!("?? operands differ: {left} and {right}"),
                    span,
                ));
            }
            left
        }
    };
    Ok(Type::Class(identity.with_nullable(right.nullable)))
}

/// Reference equality is allowed against `nil` or between related types.
fn references_comparable(
    compiler: &ExprCompiler<'_, '_>,
    left: &ClassType,
    right: &ClassType,
    span: Span,
) -> Result<bool> {
    if left.is_nil() || right.is_nil() {
        return Ok(true);
    }
    let ctx = compiler.ctx();
    let (l, r) = (Type::Class(left.clone()), Type::Class(right.clone()));
    Ok(type_matches(ctx, &l, &r, true, span)? || type_matches(ctx, &r, &l, true, span)?)
}
