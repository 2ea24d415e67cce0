//! Locals, arguments and bare static field names.

use dim_core::{CompilationError, LocalId, Span};

use super::ExprCompiler;
use crate::expr_info::ExprInfo;
use crate::overload::resolve_unqualified_static_field;
use crate::scope::LocalLookup;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_local(compiler: &ExprCompiler<'_, '_>, id: LocalId, span: Span) -> Result<ExprInfo> {
    Ok(match compiler.ctx().scope().lookup(id, span)? {
        LocalLookup::Declared(ty) => ExprInfo::value(ty.clone(), format!("l_{id}")),
        LocalLookup::Inline { ty, code } => ExprInfo::value(ty.clone(), code),
    })
}

pub(super) fn compile_argument(compiler: &ExprCompiler<'_, '_>, index: usize, span: Span) -> Result<ExprInfo> {
    let ty = compiler.ctx().scope().argument(index, span)?;
    Ok(ExprInfo::value(ty.clone(), format!("p_{index}")))
}

/// A bare name in expression position reads a static field of the current
/// class or one of the using types.
pub(super) fn compile_bare_static_field(compiler: &ExprCompiler<'_, '_>, name: &str, span: Span) -> Result<ExprInfo> {
    let ctx = compiler.ctx();
    let resolved = resolve_unqualified_static_field(ctx, name, span)?;
    Ok(ExprInfo::value(
        resolved.field.ty.clone(),
        static_field_access(&ctx.class(resolved.owner).c_name(), resolved.index),
    ))
}

/// `static_data(NS_Name)->f_<index>`.
pub(crate) fn static_field_access(class_c_name: &str, index: usize) -> String {
    format!("static_data({class_c_name})->f_{index}")
}
