//! Member resolution for calls and unqualified static fields.
//!
//! ## Algorithm
//!
//! A method is a candidate when its name and arity match and every
//! parameter accepts the corresponding argument under
//! [`type_matches`](crate::conversion::type_matches). Which classes are
//! searched depends on the call form:
//!
//! 1. **Unqualified** `F(x)`: the class being compiled. If that yields
//!    exactly one candidate the search stops; otherwise the module's using
//!    types are searched too and the union must hold exactly one.
//! 2. **Qualified** `T.F(x)`: the methods declared by `T` only.
//! 3. **Instance** `x.F()`: static binding through the receiver's
//!    hierarchy, see [`hierarchy`].
//!
//! Any count other than one is reported as an ambiguous or nonexistent call.

mod fields;
mod hierarchy;

pub use fields::{ResolvedStaticField, resolve_static_field, resolve_unqualified_static_field};

use dim_core::{CompilationError, Method, Span, Type};
use dim_registry::ClassId;
use tracing::debug;

use crate::context::CompilationContext;
use crate::conversion::type_matches;

type Result<T> = std::result::Result<T, CompilationError>;

/// How a call names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodLookup {
    /// `F(args)`.
    Unqualified,
    /// `Type.F(args)`.
    Static(ClassId),
    /// `receiver.F(args)` where the receiver's static type is this class.
    Instance(ClassId),
}

/// The method a call binds to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMethod<'r> {
    pub owner: ClassId,
    pub method: &'r Method,
}

impl PartialEq for ResolvedMethod<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.method.ordinal == other.method.ordinal
    }
}

/// Bind a call to exactly one method.
#[tracing::instrument(level = "debug", skip(ctx, args), fields(args = %render_args(args)))]
pub fn resolve_method<'r>(
    ctx: &CompilationContext<'r>,
    lookup: MethodLookup,
    name: &str,
    args: &[Type],
    span: Span,
) -> Result<ResolvedMethod<'r>> {
    let found = match lookup {
        MethodLookup::Unqualified => {
            let current = ctx.current_class()?;
            let mut found = candidates_in(ctx, current, name, args, false, span)?;
            if found.len() != 1 {
                for using in ctx.using_types() {
                    for candidate in candidates_in(ctx, *using, name, args, false, span)? {
                        if !found.contains(&candidate) {
                            found.push(candidate);
                        }
                    }
                }
            }
            single(found)
        }
        MethodLookup::Static(class) => single(candidates_in(ctx, class, name, args, false, span)?),
        MethodLookup::Instance(receiver) => hierarchy::resolve(ctx, receiver, name, args, span)?,
    };

    match found {
        Some(resolved) => {
            debug!(
                owner = %ctx.class(resolved.owner).qualified_name(),
                ordinal = resolved.method.ordinal,
                "bound call"
            );
            Ok(resolved)
        }
        None => Err(unknown_method(name, args, span)),
    }
}

/// Methods of `class` that accept `args`.
///
/// With `skip_receiver`, the first argument is not type checked; the
/// caller has already established that the receiver fits the class.
pub(crate) fn candidates_in<'r>(
    ctx: &CompilationContext<'r>,
    class: ClassId,
    name: &str,
    args: &[Type],
    skip_receiver: bool,
    span: Span,
) -> Result<Vec<ResolvedMethod<'r>>> {
    let skip = usize::from(skip_receiver);
    let mut found = Vec::new();
    for method in ctx.class(class).methods_named(name) {
        if method.params.len() != args.len() || method.params.len() < skip {
            continue;
        }
        let mut accepted = true;
        for (param, arg) in method.params.iter().zip(args).skip(skip) {
            if !type_matches(ctx, param, arg, false, span)? {
                accepted = false;
                break;
            }
        }
        if accepted {
            found.push(ResolvedMethod { owner: class, method });
        }
    }
    Ok(found)
}

fn single(mut found: Vec<ResolvedMethod<'_>>) -> Option<ResolvedMethod<'_>> {
    if found.len() == 1 { found.pop() } else { None }
}

pub(crate) fn unknown_method(name: &str, args: &[Type], span: Span) -> CompilationError {
    CompilationError::UnknownMethod {
        name: name.to_string(),
        args: render_args(args),
        span,
    }
}

fn render_args(args: &[Type]) -> String {
    args.iter().map(Type::to_string).collect::<Vec<_>>().join(", ")
}
