//! Inheritance queries.
//!
//! A class has at most one base class and any number of interfaces. A
//! declared base that resolves to an interface is not a base class; it only
//! joins the implemented set. Every walk up the chain tracks visited classes
//! and fails with [`CompilationError::CircularInheritance`] on a revisit.

use rustc_hash::FxHashSet;

use dim_core::{ClassType, CompilationError, Field, Span};

use crate::{ClassId, InterfaceId, Resolver, TypeTarget};

impl<'r> Resolver<'r> {
    /// The resolved base class, or `None` for roots and interface bases.
    pub fn base_class(&self, id: ClassId) -> Result<Option<ClassId>, CompilationError> {
        let class = self.registry().class(id);
        match &class.base {
            None => Ok(None),
            Some(base) => match self.resolve_target(base, class.line)? {
                TypeTarget::Interface(_) => Ok(None),
                TypeTarget::Class(id) => Ok(Some(id)),
            },
        }
    }

    /// Interfaces named directly by a class: an interface base first, then
    /// the `interfaces` list.
    pub fn declared_interfaces(&self, id: ClassId) -> Vec<&'r ClassType> {
        let class = self.registry().class(id);
        class
            .base
            .iter()
            .filter(|base| self.is_interface(base))
            .chain(class.interfaces.iter())
            .collect()
    }

    /// `id` followed by each ancestor up to the root.
    pub fn ancestry(&self, id: ClassId) -> Result<Vec<ClassId>, CompilationError> {
        let mut chain = vec![id];
        let mut visited = FxHashSet::default();
        visited.insert(id);

        let mut current = id;
        while let Some(base) = self.base_class(current)? {
            if !visited.insert(base) {
                let class = self.registry().class(base);
                return Err(CompilationError::CircularInheritance {
                    name: class.qualified_name().to_string(),
                    span: Span::line(class.line),
                });
            }
            chain.push(base);
            current = base;
        }
        Ok(chain)
    }

    /// Whether `id` is `ancestor` or inherits from it.
    pub fn is_subclass_of(&self, id: ClassId, ancestor: ClassId) -> Result<bool, CompilationError> {
        Ok(self.ancestry(id)?.contains(&ancestor))
    }

    /// The root of the chain `id` belongs to (`id` itself for roots).
    pub fn top_base_class(&self, id: ClassId) -> Result<ClassId, CompilationError> {
        let chain = self.ancestry(id)?;
        Ok(chain.last().copied().unwrap_or(id))
    }

    /// Whether `id` or one of its ancestors declares `interface`.
    pub fn implements_interface(
        &self,
        id: ClassId,
        interface: InterfaceId,
    ) -> Result<bool, CompilationError> {
        for class in self.ancestry(id)? {
            let line = self.registry().class(class).line;
            for declared in self.declared_interfaces(class) {
                if self.resolve_interface(declared, line)? == interface {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Instance fields of `id` and its ancestors, root first.
    ///
    /// Field positions in this list are the `f_<i>` slot numbers of the
    /// generated struct.
    pub fn all_instance_fields(&self, id: ClassId) -> Result<Vec<&'r Field>, CompilationError> {
        let registry = self.registry();
        let mut seen = FxHashSet::default();
        let mut fields = Vec::new();

        for class in self.ancestry(id)?.into_iter().rev() {
            for field in &registry.class(class).instance_fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(CompilationError::DuplicateField {
                        field: field.name.clone(),
                        class: registry.class(id).qualified_name().to_string(),
                        span: Span::line(field.line),
                    });
                }
                fields.push(field);
            }
        }
        Ok(fields)
    }

    /// Slot and declaration of an instance field, searching ancestors too.
    pub fn instance_field(
        &self,
        id: ClassId,
        name: &str,
    ) -> Result<Option<(usize, &'r Field)>, CompilationError> {
        Ok(self
            .all_instance_fields(id)?
            .into_iter()
            .enumerate()
            .find(|(_, f)| f.name == name))
    }

    /// Every class a value of `target` may be at runtime, in registry order.
    ///
    /// For an interface: each implementing class. For a class: the class and
    /// all of its subclasses.
    pub fn satisfying_classes(&self, target: TypeTarget) -> Result<Vec<ClassId>, CompilationError> {
        let mut result = Vec::new();
        for (id, _) in self.registry().classes() {
            let satisfies = match target {
                TypeTarget::Interface(interface) => self.implements_interface(id, interface)?,
                TypeTarget::Class(class) => self.is_subclass_of(id, class)?,
            };
            if satisfies {
                result.push(id);
            }
        }
        Ok(result)
    }

    /// Subclasses of `root`, excluding `root`, in registry order.
    pub fn proper_subclasses(&self, root: ClassId) -> Result<Vec<ClassId>, CompilationError> {
        Ok(self
            .satisfying_classes(TypeTarget::Class(root))?
            .into_iter()
            .filter(|id| *id != root)
            .collect())
    }
}
