use dim_core::{ClassType, CompilationError, Field, Span};
use dim_registry::ClassId;

use crate::context::CompilationContext;

type Result<T> = std::result::Result<T, CompilationError>;

/// A static field and the class whose static data holds it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedStaticField<'r> {
    pub owner: ClassId,
    /// Slot in the owner's static struct (`f_<index>`).
    pub index: usize,
    pub field: &'r Field,
}

/// `Type.field`: the field must be declared by `Type` itself.
pub fn resolve_static_field<'r>(
    ctx: &CompilationContext<'r>,
    class: &ClassType,
    name: &str,
    span: Span,
) -> Result<ResolvedStaticField<'r>> {
    let owner = ctx.resolve_class(class, span)?;
    lookup(ctx, owner, name).ok_or_else(|| CompilationError::UnknownField {
        kind: "static",
        field: name.to_string(),
        type_name: ctx.class(owner).qualified_name().to_string(),
        span,
    })
}

/// A bare name: the current class and every using type are searched, and
/// exactly one of them must declare the field.
pub fn resolve_unqualified_static_field<'r>(
    ctx: &CompilationContext<'r>,
    name: &str,
    span: Span,
) -> Result<ResolvedStaticField<'r>> {
    let current = ctx.current_class()?;
    let mut owners = vec![current];
    owners.extend(ctx.using_types().iter().copied().filter(|id| *id != current));

    let found: Vec<_> = owners
        .into_iter()
        .filter_map(|owner| lookup(ctx, owner, name))
        .collect();

    match found.as_slice() {
        [only] => Ok(*only),
        [] => Err(CompilationError::UnknownField {
            kind: "static",
            field: name.to_string(),
            type_name: ctx.class(current).qualified_name().to_string(),
            span,
        }),
        many => Err(CompilationError::AmbiguousSymbol {
            kind: "static field".to_string(),
            name: name.to_string(),
            candidates: many
                .iter()
                .map(|f| format!("{}.{}", ctx.class(f.owner).qualified_name(), f.field.name))
                .collect::<Vec<_>>()
                .join(", "),
            span,
        }),
    }
}

fn lookup<'r>(ctx: &CompilationContext<'r>, owner: ClassId, name: &str) -> Option<ResolvedStaticField<'r>> {
    let class = ctx.class(owner);
    class.static_field_index(name).map(|index| ResolvedStaticField {
        owner,
        index,
        field: &class.static_fields[index],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{Class, Module, ValueKind};
    use dim_registry::ClassRegistry;

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register_class(Class::new("STD", "STD", 1).with_static_field(Field::new("Pi", ValueKind::Double, 1)))
            .unwrap();
        registry
            .register_class(
                Class::new("Demo", "Config", 1)
                    .with_static_field(Field::new("Pi", ValueKind::Double, 2))
                    .with_static_field(Field::new("Count", ValueKind::Int, 3)),
            )
            .unwrap();
        registry
            .register_class(Class::new("Demo", "Main", 1).with_static_field(Field::new("total", ValueKind::Int, 4)))
            .unwrap();
        registry
    }

    fn ctx<'r>(registry: &'r ClassRegistry, using: &[&str]) -> CompilationContext<'r> {
        let mut module = Module::new("main.dim").with_class(Class::new("Demo", "Main", 1));
        for name in using {
            module = module.with_using(ClassType::unqualified(*name));
        }
        let mut ctx = CompilationContext::for_module(registry, &module).unwrap();
        let main = ctx.resolve_class(&ClassType::unqualified("Main"), 1).unwrap();
        ctx.set_current_class(Some(main));
        ctx
    }

    #[test]
    fn own_field_found() {
        let registry = registry();
        let ctx = ctx(&registry, &[]);
        let found = resolve_unqualified_static_field(&ctx, "total", Span::line(1)).unwrap();
        assert_eq!(ctx.class(found.owner).name, "Main");
        assert_eq!(found.index, 0);
    }

    #[test]
    fn using_type_field_found_with_index() {
        let registry = registry();
        let ctx = ctx(&registry, &["Config"]);
        let found = resolve_unqualified_static_field(&ctx, "Count", Span::line(1)).unwrap();
        assert_eq!(ctx.class(found.owner).name, "Config");
        assert_eq!(found.index, 1);
    }

    #[test]
    fn two_owners_are_ambiguous() {
        let registry = registry();
        let ctx = ctx(&registry, &["Config"]);
        match resolve_unqualified_static_field(&ctx, "Pi", Span::line(6)) {
            Err(CompilationError::AmbiguousSymbol { candidates, span, .. }) => {
                assert_eq!(candidates, "STD::STD.Pi, Demo::Config.Pi");
                assert_eq!(span.line, 6);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_not_found() {
        let registry = registry();
        let ctx = ctx(&registry, &[]);
        assert!(matches!(
            resolve_unqualified_static_field(&ctx, "nothing", Span::line(2)),
            Err(CompilationError::UnknownField { kind: "static", .. })
        ));
    }

    #[test]
    fn qualified_static_field() {
        let registry = registry();
        let ctx = ctx(&registry, &[]);
        let found = resolve_static_field(&ctx, &ClassType::unqualified("Config"), "Count", Span::line(1)).unwrap();
        assert_eq!(found.index, 1);
        assert!(resolve_static_field(&ctx, &ClassType::unqualified("Config"), "total", Span::line(1)).is_err());
    }
}
