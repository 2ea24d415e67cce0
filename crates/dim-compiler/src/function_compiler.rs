//! Method lowering.
//!
//! Wraps a lowered body in the calling convention the runtime header
//! expects:
//!
//! ```text
//! // Geo::Circle.Scale
//! Geo_Circle* Geo_Circle_Scale(Geo_Circle* p_0, double p_1)
//! {
//!     if (!p_0)
//!     {
//!         printf("Geo::Circle argument to Scale is nil\n");
//!         abort();
//!     }
//!     class_ret(Geo_Circle*)
//!     method_start;
//!     class_arg(0)
//!     ...body...
//!     method_end
//!     method_end_class_ret;
//!     ret_value;
//! }
//! ```
//!
//! The synthesized `Box`/`Unbox` methods get fixed bodies instead of a
//! lowered statement tree.

use dim_core::{Class, ClassType, CompilationError, Method, MethodBody, Span, Type};
use dim_registry::ClassId;
use tracing::debug;

use crate::context::CompilationContext;
use crate::emit::{CEmitter, method_symbol, signature};
use crate::passes::volatile_locals;
use crate::stmt::StmtCompiler;

type Result<T> = std::result::Result<T, CompilationError>;

const ANY_NAMESPACE: &str = "STD";
const ANY_NAME: &str = "Any";

/// C function name of `method` within `class`.
pub fn method_c_name(class: &Class, method: &Method) -> String {
    let overloaded = class.methods_named(&method.name).nth(1).is_some();
    method_symbol(&class.c_name(), &method.name, method.ordinal, overloaded)
}

/// `R NS_Name_Method(P0 p_0, ...)`.
pub fn method_signature(ctx: &CompilationContext<'_>, class: &Class, method: &Method) -> Result<String> {
    let span = Span::line(method.line);
    let ret = ctx.c_return_type(method.return_type.as_ref(), span)?;
    let params = method
        .params
        .iter()
        .map(|p| ctx.c_type(p, span))
        .collect::<Result<Vec<_>>>()?;
    Ok(signature(&ret, &method_c_name(class, method), &params))
}

/// Lower one method of `class` into `out`.
#[tracing::instrument(
    level = "debug",
    skip(ctx, out, method),
    fields(method = %method.name, ordinal = method.ordinal)
)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_method(
    ctx: &mut CompilationContext<'_>,
    class_id: ClassId,
    method: &Method,
    out: &mut CEmitter,
) -> Result<()> {
    let class = ctx.class(class_id);
    let span = Span::line(method.line);
    ctx.set_current_class(Some(class_id));
    ctx.scope_mut().enter_method(&method.params);

    out.line(format!("// {}.{}", class.qualified_name(), method.name));
    out.line(method_signature(ctx, class, method)?);
    out.open();

    emit_nil_guards(ctx, method, out)?;
    match &method.return_type {
        Some(ret @ Type::Class(_)) => out.line(format!("class_ret({})", ctx.c_type(ret, span)?)),
        Some(ret) => out.line(format!("value_ret({})", ctx.c_type(ret, span)?)),
        None => {}
    }
    out.line("method_start;");
    for (index, param) in method.params.iter().enumerate() {
        if param.is_class() {
            out.line(format!("class_arg({index})"));
        }
    }

    match &method.body {
        MethodBody::Source(body) => {
            let volatiles = volatile_locals(body);
            if !volatiles.is_empty() {
                debug!(count = volatiles.len(), "locals live across a try");
            }
            let mut lowered = out.nested();
            StmtCompiler::new(ctx, &mut lowered, method.return_type.as_ref(), &volatiles).compile(body)?;
            for slot in 0..ctx.scope().scratch_count() {
                out.line(format!("class_local(Instance*, t{slot})"));
            }
            out.append(lowered);
        }
        MethodBody::Box => emit_box(ctx, class, out, span)?,
        MethodBody::Unbox => emit_unbox(ctx, class, out, span)?,
        MethodBody::External => {
            return Err(CompilationError::internal(format!(
                "external method {}.{} has no body to compile",
                class.qualified_name(),
                method.name
            )));
        }
    }

    out.line("method_end");
    match &method.return_type {
        Some(Type::Class(_)) => {
            out.line("method_end_class_ret;");
            out.line("ret_value;");
        }
        Some(_) => out.line("ret_value;"),
        None => out.line("ret_void;"),
    }
    out.close();
    Ok(())
}

fn emit_nil_guards(ctx: &CompilationContext<'_>, method: &Method, out: &mut CEmitter) -> Result<()> {
    let span = Span::line(method.line);
    for (index, param) in method.params.iter().enumerate() {
        let Type::Class(class) = param else { continue };
        if class.nullable {
            continue;
        }
        let name = ctx.display_name(class, span)?;
        out.line(format!("if (!p_{index})"));
        out.open();
        out.line(format!("printf(\"{name} argument to {} is nil\\n\");", method.name));
        out.line("abort();");
        out.close();
    }
    Ok(())
}

fn any_c_name(ctx: &CompilationContext<'_>, span: Span) -> Result<String> {
    let any = ClassType::new(ANY_NAMESPACE, ANY_NAME);
    ctx.c_name(&any, span)
}

fn emit_box(ctx: &CompilationContext<'_>, class: &Class, out: &mut CEmitter, span: Span) -> Result<()> {
    let any = any_c_name(ctx, span)?;
    out.line(format!(
        "l_retval = ({any}*)runtime_new(state, \"{ANY_NAMESPACE}\", \"{ANY_NAME}\");"
    ));
    out.line(format!("(({any}*)l_retval)->f_0 = (Instance*)p_0;"));
    out.line("goto _ret;");
    debug!(class = %class.qualified_name(), "emitted Box");
    Ok(())
}

fn emit_unbox(ctx: &CompilationContext<'_>, class: &Class, out: &mut CEmitter, span: Span) -> Result<()> {
    let any = any_c_name(ctx, span)?;
    let c_name = class.c_name();
    out.line("if (!p_0)");
    out.open();
    out.line("l_retval = NULL;");
    out.line("goto _ret;");
    out.close();
    out.line(format!("{any} *l_any = ({any}*)p_0;"));
    out.line("if (!l_any->f_0)");
    out.indent();
    out.line("l_retval = NULL;");
    out.dedent();
    out.line(format!(
        "else if (((Instance*)l_any->f_0)->definition == get_{c_name}())"
    ));
    out.indent();
    out.line(format!("l_retval = ({c_name}*)l_any->f_0;"));
    out.dedent();
    out.line("else");
    out.indent();
    out.line("l_retval = NULL;");
    out.dedent();
    out.line("goto _ret;");
    Ok(())
}
