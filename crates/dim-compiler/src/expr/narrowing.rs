//! Runtime narrowing: `is` and `as`.
//!
//! A narrowing check compares the object's definition pointer against every
//! concrete class that satisfies the target, in registry order:
//!
//! ```text
//! (((Instance*)(x))->definition == get_Geo_Circle() || ((Instance*)(x))->definition == get_Geo_Ring())
//! ```
//!
//! An empty satisfying set lowers to `0`. Nullable sources are tested for
//! nil before their definition is read. A source with side effects is
//! stored in a scratch root `l_t<n>` first, and every test reads the root.

use dim_core::{ClassType, CompilationError, Expr, ExprKind, LocalId, Span, Type};

use super::ExprCompiler;
use super::ternary::unify_branches;
use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;

type Result<T> = std::result::Result<T, CompilationError>;

/// The identity check for `instance` (an `Instance*` expression) against
/// `target`.
pub fn identity_check(
    ctx: &CompilationContext<'_>,
    instance: &str,
    target: &ClassType,
    span: impl Into<Span>,
) -> Result<String> {
    let target = ctx.resolve_target(target, span)?;
    let satisfying = ctx.resolver().satisfying_classes(target)?;
    if satisfying.is_empty() {
        return Ok("0".to_string());
    }
    let terms = satisfying
        .iter()
        .map(|id| format!("{instance}->definition == get_{}()", ctx.class(*id).c_name()))
        .collect::<Vec<_>>()
        .join(" || ");
    Ok(format!("({terms})"))
}

/// A lowered `is`/`as` source, ready to be read more than once.
#[derive(Debug, Clone)]
pub(crate) struct NarrowingSource {
    pub class: ClassType,
    /// Spelling of the source value. A scratch root when `store` is set.
    pub code: String,
    /// Assignment that evaluates the source into its scratch root.
    pub store: Option<String>,
}

/// The full narrowing condition for a class-typed `source`.
pub(crate) fn narrowing_check(
    ctx: &CompilationContext<'_>,
    source: &NarrowingSource,
    target: &ClassType,
    span: Span,
) -> Result<String> {
    let instance = format!("((Instance*)({}))", source.code);
    let check = identity_check(ctx, &instance, target, span)?;
    let check = if source.class.nullable {
        format!("({instance} && {check})")
    } else {
        check
    };
    match &source.store {
        Some(store) => Ok(format!("({store}, {check})")),
        None => Ok(check),
    }
}

/// Lower the source of an `is`/`as`, which must be a non-nil class value.
///
/// Sources other than plain reads of arguments, locals and fields are
/// evaluated once into a scratch root.
pub(crate) fn narrowing_source(
    compiler: &mut ExprCompiler<'_, '_>,
    source: &Expr,
    what: &str,
) -> Result<NarrowingSource> {
    let (class, code) = compiler.class_value(source, what)?;
    if class.is_nil() {
        return Err(CompilationError::invalid(format!("{what} on nil"), source.line));
    }
    if is_plain_read(source) {
        return Ok(NarrowingSource { class, code, store: None });
    }
    let slot = compiler.ctx_mut().scope_mut().scratch();
    Ok(NarrowingSource {
        class,
        code: format!("l_t{slot}"),
        store: Some(format!("l_t{slot} = (Instance*)({code})")),
    })
}

fn is_plain_read(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Local(_)
        | ExprKind::Argument(_)
        | ExprKind::Class(_)
        | ExprKind::StaticField { .. } => true,
        ExprKind::InstanceField { instance, .. } => is_plain_read(instance),
        _ => false,
    }
}

/// `is Target bind = source ? then : else`.
///
/// `bind` is not a C local: inside the true arm it stands for the source
/// cast to the target type.
pub(super) fn compile_is(
    compiler: &mut ExprCompiler<'_, '_>,
    target: &ClassType,
    bind: LocalId,
    source: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
    span: Span,
) -> Result<ExprInfo> {
    let source = narrowing_source(compiler, source, "is")?;
    let check = narrowing_check(compiler.ctx(), &source, target, span)?;

    let bound = Type::Class(target.with_nullable(false));
    let narrowed = format!("({})", compiler.cast_to(&bound, &source.code, span)?);

    compiler.ctx_mut().scope_mut().push_inline(bind, bound, narrowed);
    let then_arm = compiler.value(then_branch);
    compiler.ctx_mut().scope_mut().pop_inline();
    let then_arm = then_arm?;
    let else_arm = compiler.value(else_branch)?;

    let (ty, then_code, else_code) = unify_branches(compiler, then_arm, else_arm, span)?;
    Ok(ExprInfo::value(ty, format!("({check} ? {then_code} : {else_code})")))
}

/// `source as Target`: the source if it satisfies the target, else nil.
pub(super) fn compile_as(
    compiler: &mut ExprCompiler<'_, '_>,
    source: &Expr,
    target: &ClassType,
    span: Span,
) -> Result<ExprInfo> {
    let source = narrowing_source(compiler, source, "as")?;
    let check = narrowing_check(compiler.ctx(), &source, target, span)?;
    let result = Type::Class(target.with_nullable(true));
    let c_type = compiler.ctx().c_type(&result, span)?;
    Ok(ExprInfo::value(
        result,
        format!("(({c_type})({check} ? (Instance*)({}) : NULL))", source.code),
    ))
}
