//! ClassRegistry - storage for every class and interface of a package.
//!
//! Classes and interfaces live in insertion-ordered vectors addressed by
//! [`ClassId`] / [`InterfaceId`]. Two indexes sit on top: exact qualified
//! name, and bare name (the first step of every lookup). Iteration order is
//! registration order, which callers rely on for deterministic output.
//!
//! The registry is immutable once compilation starts and is shared across
//! worker threads by reference.

use rustc_hash::FxHashMap;

use dim_core::{Class, CompilationError, InterfaceDef, QualifiedName, Span};

/// Index of a class in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

/// Index of an interface in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl InterfaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every class and interface visible to a package build.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Class>,
    interfaces: Vec<InterfaceDef>,

    // === Indexes ===
    class_by_name: FxHashMap<QualifiedName, ClassId>,
    interface_by_name: FxHashMap<QualifiedName, InterfaceId>,
    classes_by_simple_name: FxHashMap<String, Vec<ClassId>>,
    interfaces_by_simple_name: FxHashMap<String, Vec<InterfaceId>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    /// Add a class. Its qualified name must be new.
    pub fn register_class(&mut self, class: Class) -> Result<ClassId, CompilationError> {
        let qualified = class.qualified_name();
        if self.class_by_name.contains_key(&qualified) {
            return Err(CompilationError::DuplicateDefinition {
                name: qualified.to_string(),
                span: Span::line(class.line),
            });
        }

        let id = ClassId(self.classes.len() as u32);
        self.classes_by_simple_name
            .entry(class.name.clone())
            .or_default()
            .push(id);
        self.class_by_name.insert(qualified, id);
        self.classes.push(class);
        Ok(id)
    }

    /// Add an interface. Its qualified name must be new.
    pub fn register_interface(
        &mut self,
        interface: InterfaceDef,
    ) -> Result<InterfaceId, CompilationError> {
        let qualified = interface.qualified_name();
        if self.interface_by_name.contains_key(&qualified) {
            return Err(CompilationError::DuplicateDefinition {
                name: qualified.to_string(),
                span: Span::line(interface.line),
            });
        }

        let id = InterfaceId(self.interfaces.len() as u32);
        self.interfaces_by_simple_name
            .entry(interface.name.clone())
            .or_default()
            .push(id);
        self.interface_by_name.insert(qualified, id);
        self.interfaces.push(interface);
        Ok(id)
    }

    // === Lookup ===

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceDef {
        &self.interfaces[id.index()]
    }

    pub fn class_id(&self, name: &QualifiedName) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn interface_id(&self, name: &QualifiedName) -> Option<InterfaceId> {
        self.interface_by_name.get(name).copied()
    }

    pub fn contains_class(&self, name: &QualifiedName) -> bool {
        self.class_by_name.contains_key(name)
    }

    /// Classes with the given bare name, in registration order.
    pub fn classes_named(&self, name: &str) -> &[ClassId] {
        self.classes_by_simple_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Interfaces with the given bare name, in registration order.
    pub fn interfaces_named(&self, name: &str) -> &[InterfaceId] {
        self.interfaces_by_simple_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // === Iteration ===

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = (InterfaceId, &InterfaceDef)> {
        self.interfaces
            .iter()
            .enumerate()
            .map(|(i, c)| (InterfaceId(i as u32), c))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }
}
