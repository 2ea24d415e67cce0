//! Static binding of instance calls.
//!
//! There are no vtables. An instance call binds to one method body at
//! compile time by searching the receiver's inheritance tree:
//!
//! 1. Find the root of the receiver's chain and its matches `R`.
//!    More than one is ambiguous.
//! 2. Collect the matches `O` declared in the receiver's subtree (the
//!    receiver and its subclasses, excluding the root).
//! 3. If `R` has one match: with no overrides bind to it; with one override
//!    bind to the override; with several, bind to the receiver's own
//!    declaration if it has one, else the call is ambiguous.
//! 4. If the root declares nothing: the unique match among all subclasses
//!    of the root, else the receiver's own declaration, else ambiguous.
//!
//! The receiver argument is not type checked against each candidate's first
//! parameter; subtree membership already establishes it.

use dim_core::{CompilationError, Span, Type};
use dim_registry::{ClassId, TypeTarget};
use tracing::trace;

use super::{ResolvedMethod, candidates_in};
use crate::context::CompilationContext;

type Result<T> = std::result::Result<T, CompilationError>;

pub(super) fn resolve<'r>(
    ctx: &CompilationContext<'r>,
    receiver: ClassId,
    name: &str,
    args: &[Type],
    span: Span,
) -> Result<Option<ResolvedMethod<'r>>> {
    let resolver = ctx.resolver();
    let root = resolver.top_base_class(receiver)?;

    let at_root = candidates_in(ctx, root, name, args, true, span)?;
    if at_root.len() > 1 {
        return Ok(None);
    }

    let declared_by_receiver = |found: &[ResolvedMethod<'r>]| -> Option<ResolvedMethod<'r>> {
        let mut own = found.iter().filter(|m| m.owner == receiver);
        match (own.next(), own.next()) {
            (Some(only), None) => Some(*only),
            _ => None,
        }
    };

    match at_root.first() {
        Some(root_method) => {
            let mut overrides = Vec::new();
            for class in resolver.satisfying_classes(TypeTarget::Class(receiver))? {
                if class != root {
                    overrides.extend(candidates_in(ctx, class, name, args, true, span)?);
                }
            }
            trace!(overrides = overrides.len(), "root declares {name}");
            Ok(match overrides.len() {
                0 => Some(*root_method),
                1 => overrides.pop(),
                _ => declared_by_receiver(&overrides),
            })
        }
        None => {
            let mut found = Vec::new();
            for class in resolver.proper_subclasses(root)? {
                found.extend(candidates_in(ctx, class, name, args, true, span)?);
            }
            trace!(found = found.len(), "root does not declare {name}");
            Ok(match found.len() {
                1 => found.pop(),
                _ => declared_by_receiver(&found),
            })
        }
    }
}
