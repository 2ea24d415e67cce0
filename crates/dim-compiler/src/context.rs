//! CompilationContext - per-unit state for lowering one module.
//!
//! A context pairs a [`Resolver`] (name lookup from the module's point of
//! view) with everything that changes while walking a method: the class being
//! compiled, the module's using types and the local scope. One context is
//! created per module and never shared between threads; only the underlying
//! [`ClassRegistry`] is.

use dim_core::{
    Class, ClassType, CompilationError, Module, NodeKey, STANDARD_USING_TYPE, Span, Type,
};
use dim_registry::{ClassId, ClassRegistry, Resolver, TypeTarget, Visibility};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::overload::ResolvedMethod;
use crate::scope::LocalScope;

type Result<T> = std::result::Result<T, CompilationError>;

/// Mutable state for compiling one module.
pub struct CompilationContext<'r> {
    resolver: Resolver<'r>,
    /// Resolved using types, implicit standard type first.
    using_types: Vec<ClassId>,
    current_class: Option<ClassId>,
    scope: LocalScope,
    /// Call node to the method it binds to.
    bound_calls: FxHashMap<NodeKey, ResolvedMethod<'r>>,
}

impl<'r> CompilationContext<'r> {
    /// Build the context for `module`, resolving its using types up front.
    ///
    /// The implicit standard using type is skipped when no such class is
    /// loaded. Explicit using types must resolve.
    pub fn for_module(registry: &'r ClassRegistry, module: &Module) -> Result<Self> {
        let visibility = Visibility::new(module.namespace(), module.imported_namespaces.clone());
        let mut ctx = Self::new(registry, visibility);

        let (std_ns, std_name) = STANDARD_USING_TYPE;
        for ty in module.effective_using_types() {
            let implicit = ty.namespace.as_deref() == Some(std_ns) && ty.name == std_name;
            match ctx.resolver.resolve_class(&ty, Span::default()) {
                Ok(id) => {
                    if !ctx.using_types.contains(&id) {
                        ctx.using_types.push(id);
                    }
                }
                Err(CompilationError::UnknownType { .. }) if implicit => {
                    debug!("standard using type not loaded, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(ctx)
    }

    pub fn new(registry: &'r ClassRegistry, visibility: Visibility) -> Self {
        Self {
            resolver: Resolver::new(registry, visibility),
            using_types: Vec::new(),
            current_class: None,
            scope: LocalScope::new(),
            bound_calls: FxHashMap::default(),
        }
    }

    // === Resolution ===

    pub fn resolver(&self) -> &Resolver<'r> {
        &self.resolver
    }

    pub fn registry(&self) -> &'r ClassRegistry {
        self.resolver.registry()
    }

    pub fn class(&self, id: ClassId) -> &'r Class {
        self.registry().class(id)
    }

    pub fn resolve_class(&self, ty: &ClassType, span: impl Into<Span>) -> Result<ClassId> {
        self.resolver.resolve_class(ty, span)
    }

    pub fn resolve_target(&self, ty: &ClassType, span: impl Into<Span>) -> Result<TypeTarget> {
        self.resolver.resolve_target(ty, span)
    }

    pub fn is_interface(&self, ty: &ClassType) -> bool {
        self.resolver.is_interface(ty)
    }

    pub fn using_types(&self) -> &[ClassId] {
        &self.using_types
    }

    // === Current class ===

    pub fn current_class(&self) -> Result<ClassId> {
        self.current_class
            .ok_or_else(|| CompilationError::internal("no class is being compiled"))
    }

    /// Switch the class being compiled. Call bindings resolved for the
    /// previous method are dropped.
    pub fn set_current_class(&mut self, id: Option<ClassId>) {
        self.current_class = id;
        self.bound_calls.clear();
    }

    /// The non-nullable type of the class being compiled.
    pub fn current_type(&self) -> Result<ClassType> {
        Ok(self.class(self.current_class()?).self_type())
    }

    // === Scope ===

    pub fn scope(&self) -> &LocalScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut LocalScope {
        &mut self.scope
    }

    // === Call bindings ===

    pub fn bound_call(&self, node: NodeKey) -> Option<ResolvedMethod<'r>> {
        self.bound_calls.get(&node).copied()
    }

    pub fn bind_call(&mut self, node: NodeKey, method: ResolvedMethod<'r>) {
        trace!(ordinal = method.method.ordinal, "call bound");
        self.bound_calls.insert(node, method);
    }

    // === Naming ===

    /// `NS_Name` of the class or interface a type refers to.
    pub fn c_name(&self, ty: &ClassType, span: impl Into<Span>) -> Result<String> {
        Ok(match self.resolve_target(ty, span)? {
            TypeTarget::Class(id) => self.class(id).c_name(),
            TypeTarget::Interface(id) => self.registry().interface(id).qualified_name().c_name(),
        })
    }

    /// `NS::Name` of the class or interface a type refers to.
    pub fn display_name(&self, ty: &ClassType, span: impl Into<Span>) -> Result<String> {
        Ok(match self.resolve_target(ty, span)? {
            TypeTarget::Class(id) => self.class(id).qualified_name().to_string(),
            TypeTarget::Interface(id) => self.registry().interface(id).qualified_name().to_string(),
        })
    }

    /// The C spelling of a type.
    ///
    /// Classes become `NS_Name*`. Interface-typed values have no struct of
    /// their own and are carried as `Instance*`.
    pub fn c_type(&self, ty: &Type, span: impl Into<Span>) -> Result<String> {
        let span = span.into();
        match ty {
            Type::Value(kind) => kind.c_type().map(str::to_string).ok_or_else(|| {
                CompilationError::mismatch(format!("{kind} has no storage type"), span)
            }),
            Type::Class(class) if class.is_nil() => Ok("void*".to_string()),
            Type::Class(class) => match self.resolve_target(class, span)? {
                TypeTarget::Class(id) => Ok(format!("{}*", self.class(id).c_name())),
                TypeTarget::Interface(_) => Ok("Instance*".to_string()),
            },
        }
    }

    /// The C return type of a method (`void` for none).
    pub fn c_return_type(&self, ty: Option<&Type>, span: impl Into<Span>) -> Result<String> {
        match ty {
            Some(ty) => self.c_type(ty, span),
            None => Ok("void".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{InterfaceDef, ValueKind};

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register_class(Class::new("STD", "STD", 1)).unwrap();
        registry.register_class(Class::new("Geo", "Circle", 1)).unwrap();
        registry.register_class(Class::new("Geo", "Math", 1)).unwrap();
        registry
            .register_interface(InterfaceDef::new("Geo", "Drawable", 1))
            .unwrap();
        registry
    }

    #[test]
    fn using_types_resolved_with_standard_first() {
        let registry = registry();
        let module = Module::new("a.dim")
            .with_class(Class::new("Geo", "Main", 1))
            .with_using(ClassType::unqualified("Math"));
        let ctx = CompilationContext::for_module(&registry, &module).unwrap();
        let names: Vec<_> = ctx
            .using_types()
            .iter()
            .map(|id| ctx.class(*id).name.as_str())
            .collect();
        assert_eq!(names, vec!["STD", "Math"]);
    }

    #[test]
    fn missing_standard_type_is_skipped() {
        let mut registry = ClassRegistry::new();
        registry.register_class(Class::new("Geo", "Main", 1)).unwrap();
        let module = Module::new("a.dim").with_class(Class::new("Geo", "Main", 1));
        let ctx = CompilationContext::for_module(&registry, &module).unwrap();
        assert!(ctx.using_types().is_empty());
    }

    #[test]
    fn missing_explicit_using_type_fails() {
        let registry = registry();
        let module = Module::new("a.dim")
            .with_class(Class::new("Geo", "Main", 1))
            .with_using(ClassType::unqualified("Nope"));
        assert!(matches!(
            CompilationContext::for_module(&registry, &module),
            Err(CompilationError::UnknownType { .. })
        ));
    }

    #[test]
    fn c_types() {
        let registry = registry();
        let ctx = CompilationContext::new(&registry, Visibility::new("Geo", Vec::new()));
        assert_eq!(ctx.c_type(&ValueKind::Int.into(), 1).unwrap(), "int32_t");
        assert_eq!(
            ctx.c_type(&ClassType::unqualified("Circle").nullable().into(), 1).unwrap(),
            "Geo_Circle*"
        );
        assert_eq!(
            ctx.c_type(&ClassType::unqualified("Drawable").into(), 1).unwrap(),
            "Instance*"
        );
        assert!(ctx.c_type(&ValueKind::UnknownNumber.into(), 1).is_err());
        assert_eq!(ctx.c_return_type(None, 1).unwrap(), "void");
    }

    #[test]
    fn no_current_class_is_internal_error() {
        let registry = registry();
        let ctx = CompilationContext::new(&registry, Visibility::default());
        assert!(matches!(ctx.current_class(), Err(CompilationError::Internal { .. })));
    }
}
