//! Literals and allocation.

use dim_core::{CompilationError, Type, ValueKind};

use super::ExprCompiler;
use crate::emit::escape_string;
use crate::expr_info::ExprInfo;

/// Numbers keep their source text and stay unsized until they meet a slot.
pub(super) fn compile_number(text: &str) -> ExprInfo {
    ExprInfo::value(Type::value(ValueKind::UnknownNumber), text)
}

pub(super) fn compile_string(text: &str) -> ExprInfo {
    ExprInfo::value(Type::value(ValueKind::CStr), escape_string(text))
}

pub(super) fn compile_nil() -> ExprInfo {
    ExprInfo::value(Type::nil(), "NULL")
}

/// `new` always allocates the class being compiled.
pub(super) fn compile_new(compiler: &ExprCompiler<'_, '_>) -> Result<ExprInfo, CompilationError> {
    let ctx = compiler.ctx();
    let class = ctx.class(ctx.current_class()?);
    Ok(ExprInfo::value(
        Type::Class(class.self_type()),
        format!(
            "(({}*)runtime_new(state, \"{}\", \"{}\"))",
            class.c_name(),
            class.namespace,
            class.name
        ),
    ))
}
