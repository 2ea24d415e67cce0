//! Name resolution from the point of view of one module.
//!
//! A reference such as `Circle` or `Ge::Circle` is resolved in three
//! narrowing steps:
//!
//! 1. every class or interface with that bare name
//! 2. those whose namespace starts with the written qualifier (if any)
//! 3. those in a namespace the module can see
//!
//! If step 3 leaves nothing, step 2's result is used instead. Exactly one
//! candidate must remain. Classes and interfaces compete in the same
//! candidate set, except in [`Resolver::resolve_class`], which only looks
//! at classes. Successful lookups are memoized per resolver.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use dim_core::{ClassType, CompilationError, QualifiedName, Span};

use crate::{ClassId, ClassRegistry, InterfaceId, Visibility};

type CacheKey = (Option<String>, String);

/// What a class type reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTarget {
    Class(ClassId),
    Interface(InterfaceId),
}

/// Resolves type references for one module against a shared registry.
///
/// Not `Sync`: each compilation unit owns its resolver.
pub struct Resolver<'r> {
    registry: &'r ClassRegistry,
    visibility: Visibility,
    classes: RefCell<FxHashMap<CacheKey, ClassId>>,
    targets: RefCell<FxHashMap<CacheKey, TypeTarget>>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r ClassRegistry, visibility: Visibility) -> Self {
        Self {
            registry,
            visibility,
            classes: RefCell::default(),
            targets: RefCell::default(),
        }
    }

    pub fn registry(&self) -> &'r ClassRegistry {
        self.registry
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Resolve a reference to exactly one class, ignoring interfaces.
    pub fn resolve_class(
        &self,
        ty: &ClassType,
        span: impl Into<Span>,
    ) -> Result<ClassId, CompilationError> {
        let key = (ty.namespace.clone(), ty.name.clone());
        if let Some(id) = self.classes.borrow().get(&key) {
            return Ok(*id);
        }

        let candidates = self
            .registry
            .classes_named(&ty.name)
            .iter()
            .map(|id| (*id, self.registry.class(*id).qualified_name()))
            .collect();
        let id = self.select(ty, candidates, "class", span.into())?;
        self.classes.borrow_mut().insert(key, id);
        Ok(id)
    }

    /// Resolve a reference to exactly one class or interface.
    pub fn resolve_target(
        &self,
        ty: &ClassType,
        span: impl Into<Span>,
    ) -> Result<TypeTarget, CompilationError> {
        let key = (ty.namespace.clone(), ty.name.clone());
        if let Some(target) = self.targets.borrow().get(&key) {
            return Ok(*target);
        }

        let interfaces = self.registry.interfaces_named(&ty.name).iter().map(|id| {
            (
                TypeTarget::Interface(*id),
                self.registry.interface(*id).qualified_name(),
            )
        });
        let classes = self
            .registry
            .classes_named(&ty.name)
            .iter()
            .map(|id| (TypeTarget::Class(*id), self.registry.class(*id).qualified_name()));
        let target = self.select(ty, interfaces.chain(classes).collect(), "type", span.into())?;
        self.targets.borrow_mut().insert(key, target);
        Ok(target)
    }

    pub fn resolve_interface(
        &self,
        ty: &ClassType,
        span: impl Into<Span>,
    ) -> Result<InterfaceId, CompilationError> {
        let span = span.into();
        match self.resolve_target(ty, span)? {
            TypeTarget::Interface(id) => Ok(id),
            TypeTarget::Class(_) => Err(CompilationError::TypeMismatch {
                message: format!("`{ty}` is a class, expected an interface"),
                span,
            }),
        }
    }

    /// Whether the reference resolves to an interface. Unresolvable and
    /// ambiguous references are not interfaces.
    pub fn is_interface(&self, ty: &ClassType) -> bool {
        matches!(
            self.resolve_target(ty, Span::default()),
            Ok(TypeTarget::Interface(_))
        )
    }

    /// Prefix filter, then visibility filter with fallback, then exactly
    /// one candidate.
    fn select<T: Copy>(
        &self,
        ty: &ClassType,
        candidates: Vec<(T, QualifiedName)>,
        kind: &str,
        span: Span,
    ) -> Result<T, CompilationError> {
        let prefixed: Vec<(T, QualifiedName)> = candidates
            .into_iter()
            .filter(|(_, name)| name.matches_prefix(ty.namespace.as_deref()))
            .collect();
        let visible: Vec<&(T, QualifiedName)> = prefixed
            .iter()
            .filter(|(_, name)| self.visibility.can_see(&name.namespace))
            .collect();

        let remaining: Vec<&(T, QualifiedName)> = if visible.is_empty() {
            if !prefixed.is_empty() {
                warn!(ty = %ty, "no visible candidate, falling back to all namespaces");
            }
            prefixed.iter().collect()
        } else {
            visible
        };

        match remaining.as_slice() {
            [] => Err(CompilationError::UnknownType {
                name: ty.to_string(),
                span,
            }),
            [(found, name)] => {
                trace!(ty = %ty, resolved = %name, kind, "resolved");
                Ok(*found)
            }
            many => Err(CompilationError::AmbiguousSymbol {
                kind: kind.to_string(),
                name: ty.to_string(),
                candidates: many
                    .iter()
                    .map(|(_, name)| name.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                span,
            }),
        }
    }

    /// The fully qualified form of a reference, keeping its nullability.
    pub fn qualify(
        &self,
        ty: &ClassType,
        span: impl Into<Span>,
    ) -> Result<ClassType, CompilationError> {
        if ty.is_nil() {
            return Ok(ty.clone());
        }
        let namespace = match self.resolve_target(ty, span)? {
            TypeTarget::Class(id) => &self.registry.class(id).namespace,
            TypeTarget::Interface(id) => &self.registry.interface(id).namespace,
        };
        Ok(ty.qualified(namespace.clone()))
    }
}
