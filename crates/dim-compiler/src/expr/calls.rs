//! Method calls.
//!
//! All three call forms lower to the same shape: an indirect call through
//! the owner's method table at the bound method's ordinal, with every
//! argument cast to its parameter's C type.

use dim_core::{ClassType, CompilationError, Expr, NodeKey, Span, Type};

use super::ExprCompiler;
use crate::context::CompilationContext;
use crate::emit::fn_pointer_cast;
use crate::expr_info::ExprInfo;
use crate::overload::{MethodLookup, ResolvedMethod, resolve_method};

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn compile_call(
    compiler: &mut ExprCompiler<'_, '_>,
    node: NodeKey,
    name: &str,
    args: &[Expr],
    span: Span,
) -> Result<ExprInfo> {
    let (types, codes) = compile_args(compiler, args)?;
    let resolved = bind(compiler, node, MethodLookup::Unqualified, name, &types, span)?;
    lower_call(compiler.ctx(), resolved, &codes, span)
}

pub(super) fn compile_static_call(
    compiler: &mut ExprCompiler<'_, '_>,
    node: NodeKey,
    callee: &ClassType,
    name: &str,
    args: &[Expr],
    span: Span,
) -> Result<ExprInfo> {
    let class = compiler.ctx().resolve_class(callee, span)?;
    let (types, codes) = compile_args(compiler, args)?;
    let resolved = bind(compiler, node, MethodLookup::Static(class), name, &types, span)?;
    lower_call(compiler.ctx(), resolved, &codes, span)
}

/// `receiver.Name(rest)`; `args[0]` is the receiver.
pub(super) fn compile_instance_call(
    compiler: &mut ExprCompiler<'_, '_>,
    node: NodeKey,
    name: &str,
    args: &[Expr],
    span: Span,
) -> Result<ExprInfo> {
    let receiver = args
        .first()
        .ok_or_else(|| CompilationError::internal(format!("instance call {name} without receiver")))?;
    let (types, codes) = compile_args(compiler, args)?;

    let ty = match &types[0] {
        Type::Class(class) => class,
        other => {
            return Err(CompilationError::invalid(
                format!("cannot call {name} on value type {other}"),
                receiver.line,
            ));
        }
    };
    if ty.is_nil() || ty.nullable {
        return Err(CompilationError::invalid(
            format!("cannot call {name} on nullable {ty}"),
            span,
        ));
    }
    if compiler.ctx().is_interface(ty) {
        return Err(CompilationError::invalid(
            format!("cannot call {name} on interface-typed value {ty}"),
            span,
        ));
    }

    let class = compiler.ctx().resolve_class(ty, span)?;
    let resolved = bind(compiler, node, MethodLookup::Instance(class), name, &types, span)?;
    lower_call(compiler.ctx(), resolved, &codes, span)
}

/// Resolve a call once per node; later visits reuse the binding.
fn bind<'r>(
    compiler: &mut ExprCompiler<'_, 'r>,
    node: NodeKey,
    lookup: MethodLookup,
    name: &str,
    types: &[Type],
    span: Span,
) -> Result<ResolvedMethod<'r>> {
    if let Some(bound) = compiler.ctx().bound_call(node) {
        return Ok(bound);
    }
    let resolved = resolve_method(compiler.ctx(), lookup, name, types, span)?;
    compiler.ctx_mut().bind_call(node, resolved);
    Ok(resolved)
}

fn compile_args(compiler: &mut ExprCompiler<'_, '_>, args: &[Expr]) -> Result<(Vec<Type>, Vec<String>)> {
    let mut types = Vec::with_capacity(args.len());
    let mut codes = Vec::with_capacity(args.len());
    for arg in args {
        let (ty, code) = compiler.value(arg)?;
        types.push(ty);
        codes.push(code);
    }
    Ok((types, codes))
}

/// `(static_method_call((R (*)(P..)), NS_Name, ordinal, (P0)(a0), ...))`.
fn lower_call(
    ctx: &CompilationContext<'_>,
    resolved: ResolvedMethod<'_>,
    args: &[String],
    span: Span,
) -> Result<ExprInfo> {
    let method = resolved.method;
    let params = method
        .params
        .iter()
        .map(|p| ctx.c_type(p, span))
        .collect::<Result<Vec<_>>>()?;
    let ret = ctx.c_return_type(method.return_type.as_ref(), span)?;

    let casted = params
        .iter()
        .zip(args)
        .map(|(param, arg)| format!("({param})({arg})"))
        .collect::<Vec<_>>()
        .join(", ");
    let code = format!(
        "(static_method_call({}, {}, {}, {}))",
        fn_pointer_cast(&ret, &params),
        ctx.class(resolved.owner).c_name(),
        method.ordinal,
        casted
    );

    Ok(match &method.return_type {
        Some(ty) => ExprInfo::value(ty.clone(), code),
        None => ExprInfo::void(code),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use dim_core::ValueKind;

    #[test]
    fn unqualified_call_through_using_type() {
        let registry = registry();
        let mut ctx = context(&registry, &[]);
        let call = Expr::call("Print", vec![Expr::string("a", 3)], 3);
        let info = ExprCompiler::new(&mut ctx).infer(&call).unwrap();
        assert_eq!(
            info.code,
            "(static_method_call((void (*)(const char*)), STD_STD, 0, (const char*)(\"\\x61\")))"
        );
        assert_eq!(info.ty, None);
    }

    #[test]
    fn call_without_arguments() {
        let registry = registry();
        let mut ctx = context(&registry, &[]);
        let info = ExprCompiler::new(&mut ctx).infer(&Expr::call("Make", vec![], 1)).unwrap();
        assert_eq!(info.code, "(static_method_call((Geo_Circle* (*)(void)), Geo_Main, 1, ))");
        assert_eq!(info.ty, Some(geo("Circle")));
    }

    #[test]
    fn literal_argument_cast_to_parameter() {
        let registry = registry();
        let mut ctx = context(&registry, &[]);
        let call = Expr::call_static(ClassType::unqualified("STD"), "Sqrt", vec![Expr::number("2", 1)], 1);
        let info = ExprCompiler::new(&mut ctx).infer(&call).unwrap();
        assert!(info.code.ends_with("STD_STD, 1, (double)(2)))"), "{}", info.code);
        assert_eq!(info.ty, Some(Type::value(ValueKind::Double)));
    }

    #[test]
    fn base_typed_receiver_binds_override() {
        let registry = registry();
        let mut ctx = context(&registry, &[geo("Shape")]);
        let call = Expr::call_instance(Expr::argument(0, 4), "Area", vec![], 4);
        let info = ExprCompiler::new(&mut ctx).infer(&call).unwrap();
        assert_eq!(
            info.code,
            "(static_method_call((double (*)(Geo_Circle*)), Geo_Circle, 0, (Geo_Circle*)(p_0)))"
        );
    }

    #[test]
    fn nullable_receiver_rejected() {
        let registry = registry();
        let mut ctx = context(&registry, &[geo_nullable("Circle")]);
        let call = Expr::call_instance(Expr::argument(0, 6), "Area", vec![], 6);
        match ExprCompiler::new(&mut ctx).infer(&call) {
            Err(CompilationError::InvalidOperation { message, span }) => {
                assert!(message.contains("nullable"));
                assert_eq!(span.line, 6);
            }
            other => panic!("expected nullable receiver error, got {other:?}"),
        }
    }

    #[test]
    fn interface_receiver_rejected() {
        let registry = registry();
        let mut ctx = context(&registry, &[geo("Drawable")]);
        let call = Expr::call_instance(Expr::argument(0, 2), "Area", vec![], 2);
        assert!(matches!(
            ExprCompiler::new(&mut ctx).infer(&call),
            Err(CompilationError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn argument_type_checked() {
        let registry = registry();
        let mut ctx = context(&registry, &[geo("Circle")]);
        let call = Expr::call_instance(Expr::argument(0, 2), "Grow", vec![Expr::string("x", 2)], 2);
        assert!(matches!(
            ExprCompiler::new(&mut ctx).infer(&call),
            Err(CompilationError::UnknownMethod { .. })
        ));
    }
}
