//! Static and instance field reads.

use dim_core::{ClassType, CompilationError, Expr, Span, Type};
use dim_registry::TypeTarget;

use super::ExprCompiler;
use super::identifiers::static_field_access;
use crate::expr_info::ExprInfo;
use crate::overload::resolve_static_field;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_static_field(
    compiler: &ExprCompiler<'_, '_>,
    class: &ClassType,
    field: &str,
    span: Span,
) -> Result<ExprInfo> {
    let ctx = compiler.ctx();
    let resolved = resolve_static_field(ctx, class, field, span)?;
    Ok(ExprInfo::value(
        resolved.field.ty.clone(),
        static_field_access(&ctx.class(resolved.owner).c_name(), resolved.index),
    ))
}

pub(super) fn compile_instance_field(
    compiler: &mut ExprCompiler<'_, '_>,
    instance: &Expr,
    field: &str,
    span: Span,
) -> Result<ExprInfo> {
    let (class, code) = compiler.class_value(instance, "instance field access")?;
    let (ty, access) = instance_field_access(compiler, &class, &code, field, span)?;
    Ok(ExprInfo::value(ty, access))
}

/// Type and C lvalue of `receiver.field`, where `receiver` already lowered
/// to `code` with static type `class`.
///
/// The slot index is the field's position in the flattened layout, so
/// inherited fields keep their ancestor's slot.
pub(crate) fn instance_field_access(
    compiler: &ExprCompiler<'_, '_>,
    class: &ClassType,
    code: &str,
    field: &str,
    span: Span,
) -> Result<(Type, String)> {
    if class.is_nil() {
        return Err(CompilationError::invalid(
            format!("cannot access field '{field}' on nil"),
            span,
        ));
    }
    let ctx = compiler.ctx();
    let id = match ctx.resolve_target(class, span)? {
        TypeTarget::Class(id) => id,
        TypeTarget::Interface(_) => {
            return Err(CompilationError::invalid(
                format!("cannot access field '{field}' on interface {class}"),
                span,
            ));
        }
    };

    let owner = ctx.class(id);
    let (index, declared) = ctx
        .resolver()
        .instance_field(id, field)?
        .ok_or_else(|| CompilationError::UnknownField {
            kind: "instance",
            field: field.to_string(),
            type_name: owner.qualified_name().to_string(),
            span,
        })?;
    Ok((
        declared.ty.clone(),
        format!("(({}*)({}))->f_{}", owner.c_name(), code, index),
    ))
}
