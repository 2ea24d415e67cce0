//! Type compatibility.
//!
//! [`type_matches`] decides whether a value of type `actual` may flow into a
//! slot of type `expected`. The relation is not symmetric:
//!
//! - values match on equal kinds, or when `actual` is an unsized numeric
//!   literal
//! - `nil` only flows into nullable class slots, and never is a slot
//! - an interface slot accepts the interface itself or any class implementing
//!   it; a class slot accepts the class or a subclass, never an interface
//! - a nullable value never flows into a non-nullable slot unless
//!   `ignore_nullable` is set

use dim_core::{ClassType, CompilationError, Span, Type};
use dim_registry::TypeTarget;

use crate::context::CompilationContext;

type Result<T> = std::result::Result<T, CompilationError>;

/// Whether `actual` is assignable to `expected`.
///
/// Fails only when a class name in either type cannot be resolved.
pub fn type_matches(
    ctx: &CompilationContext<'_>,
    expected: &Type,
    actual: &Type,
    ignore_nullable: bool,
    span: impl Into<Span>,
) -> Result<bool> {
    match (expected, actual) {
        (Type::Value(e), Type::Value(a)) => Ok(e == a || a.is_unknown_number()),
        (Type::Class(e), Type::Class(a)) => {
            class_matches(ctx, e, a, ignore_nullable, span.into())
        }
        _ => Ok(false),
    }
}

fn class_matches(
    ctx: &CompilationContext<'_>,
    expected: &ClassType,
    actual: &ClassType,
    ignore_nullable: bool,
    span: Span,
) -> Result<bool> {
    if expected.is_nil() {
        return Ok(false);
    }
    if actual.is_nil() {
        return Ok(expected.nullable);
    }

    let identity = match ctx.resolve_target(expected, span)? {
        TypeTarget::Interface(interface) => match ctx.resolve_target(actual, span)? {
            TypeTarget::Interface(other) => other == interface,
            TypeTarget::Class(class) => ctx.resolver().implements_interface(class, interface)?,
        },
        TypeTarget::Class(class) => match ctx.resolve_target(actual, span)? {
            TypeTarget::Interface(_) => false,
            TypeTarget::Class(other) => ctx.resolver().is_subclass_of(other, class)?,
        },
    };

    Ok(identity && (ignore_nullable || expected.nullable || !actual.nullable))
}

/// Whether two types name the same class or interface (nullability ignored).
pub fn same_identity(
    ctx: &CompilationContext<'_>,
    a: &ClassType,
    b: &ClassType,
    span: impl Into<Span>,
) -> Result<bool> {
    let span = span.into();
    Ok(ctx.resolve_target(a, span)? == ctx.resolve_target(b, span)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{Class, InterfaceDef, ValueKind};
    use dim_registry::{ClassRegistry, Visibility};

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register_interface(InterfaceDef::new("Geo", "Drawable", 1))
            .unwrap();
        registry
            .register_interface(InterfaceDef::new("Geo", "Sized", 1))
            .unwrap();
        registry.register_class(Class::new("Geo", "Shape", 1)).unwrap();
        registry
            .register_class(
                Class::new("Geo", "Circle", 2)
                    .with_base(ClassType::unqualified("Shape"))
                    .with_interface(ClassType::unqualified("Drawable")),
            )
            .unwrap();
        registry
            .register_class(Class::new("Geo", "Ring", 3).with_base(ClassType::unqualified("Circle")))
            .unwrap();
        registry.register_class(Class::new("Geo", "Plain", 4)).unwrap();
        registry
    }

    fn ctx(registry: &ClassRegistry) -> CompilationContext<'_> {
        CompilationContext::new(registry, Visibility::new("Geo", Vec::new()))
    }

    fn class(name: &str) -> Type {
        Type::Class(ClassType::unqualified(name))
    }

    fn nullable(name: &str) -> Type {
        Type::Class(ClassType::unqualified(name).nullable())
    }

    fn matches(ctx: &CompilationContext<'_>, expected: &Type, actual: &Type) -> bool {
        type_matches(ctx, expected, actual, false, 1).unwrap()
    }

    #[test]
    fn primitives_reflexive_and_distinct() {
        let registry = registry();
        let ctx = ctx(&registry);
        for a in ValueKind::ALL {
            for b in ValueKind::ALL {
                assert_eq!(matches(&ctx, &a.into(), &b.into()), a == b, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn number_literal_is_a_wildcard_actual() {
        let registry = registry();
        let ctx = ctx(&registry);
        let literal: Type = ValueKind::UnknownNumber.into();
        assert!(matches(&ctx, &ValueKind::Double.into(), &literal));
        assert!(!matches(&ctx, &literal, &ValueKind::Double.into()));
    }

    #[test]
    fn values_and_classes_never_match() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(!matches(&ctx, &ValueKind::Inst.into(), &class("Shape")));
        assert!(!matches(&ctx, &class("Shape"), &ValueKind::Inst.into()));
    }

    #[test]
    fn subclass_flows_into_base_only() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(matches(&ctx, &class("Shape"), &class("Ring")));
        assert!(matches(&ctx, &class("Shape"), &class("Circle")));
        assert!(!matches(&ctx, &class("Ring"), &class("Shape")));
        assert!(!matches(&ctx, &class("Shape"), &class("Plain")));
    }

    #[test]
    fn implementers_flow_into_interface() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(matches(&ctx, &class("Drawable"), &class("Circle")));
        assert!(matches(&ctx, &class("Drawable"), &class("Ring")));
        assert!(matches(&ctx, &class("Drawable"), &class("Drawable")));
        assert!(!matches(&ctx, &class("Drawable"), &class("Plain")));
        assert!(!matches(&ctx, &class("Drawable"), &class("Sized")));
        assert!(!matches(&ctx, &class("Shape"), &class("Drawable")));
    }

    #[test]
    fn nullability_rules() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(!matches(&ctx, &class("Shape"), &nullable("Circle")));
        assert!(matches(&ctx, &nullable("Shape"), &nullable("Circle")));
        assert!(matches(&ctx, &nullable("Shape"), &class("Circle")));
        assert!(type_matches(&ctx, &class("Shape"), &nullable("Circle"), true, 1).unwrap());
    }

    #[test]
    fn nil_only_into_nullable_slots() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(matches(&ctx, &nullable("Shape"), &Type::nil()));
        assert!(!matches(&ctx, &class("Shape"), &Type::nil()));
        assert!(!matches(&ctx, &Type::nil(), &nullable("Shape")));
        assert!(!matches(&ctx, &Type::nil(), &Type::nil()));
    }

    #[test]
    fn unknown_class_is_an_error() {
        let registry = registry();
        let ctx = ctx(&registry);
        assert!(matches!(
            type_matches(&ctx, &class("Shape"), &class("Missing"), false, 7),
            Err(CompilationError::UnknownType { span, .. }) if span.line == 7
        ));
    }

    #[test]
    fn identity_ignores_nullability() {
        let registry = registry();
        let ctx = ctx(&registry);
        let a = ClassType::unqualified("Circle");
        let b = ClassType::new("Geo", "Circle").nullable();
        assert!(same_identity(&ctx, &a, &b, 1).unwrap());
        assert!(!same_identity(&ctx, &a, &ClassType::unqualified("Shape"), 1).unwrap());
    }
}
