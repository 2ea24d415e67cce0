//! Parsed source file.

use std::path::PathBuf;

use crate::types::ClassType;

use super::{Class, InterfaceDef};

/// The standard helper type every module searches for unqualified calls
/// and static fields.
pub const STANDARD_USING_TYPE: (&str, &str) = ("STD", "STD");

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub path: PathBuf,
    pub classes: Vec<Class>,
    pub interfaces: Vec<InterfaceDef>,
    /// Namespaces brought into view by `import`.
    pub imported_namespaces: Vec<String>,
    /// Types declared with `using`. The standard helper type is added
    /// implicitly by [`Module::effective_using_types`].
    pub using_types: Vec<ClassType>,
}

impl Module {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_interface(mut self, interface: InterfaceDef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_import(mut self, namespace: impl Into<String>) -> Self {
        self.imported_namespaces.push(namespace.into());
        self
    }

    pub fn with_using(mut self, ty: ClassType) -> Self {
        self.using_types.push(ty);
        self
    }

    /// The standard helper type followed by the declared using types.
    pub fn effective_using_types(&self) -> Vec<ClassType> {
        let (ns, name) = STANDARD_USING_TYPE;
        let standard = ClassType::new(ns, name);
        let mut types = vec![standard.clone()];
        types.extend(
            self.using_types
                .iter()
                .filter(|t| **t != standard)
                .cloned(),
        );
        types
    }

    /// The namespace the module's own classes live in.
    ///
    /// All classes of a module share one namespace; a module without
    /// classes falls back to its interfaces, then to the empty namespace.
    pub fn namespace(&self) -> &str {
        self.classes
            .first()
            .map(|c| c.namespace.as_str())
            .or_else(|| self.interfaces.first().map(|i| i.namespace.as_str()))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_using_type_always_first() {
        let module = Module::new("main.dim").with_using(ClassType::new("Geo", "Math"));
        let using = module.effective_using_types();
        assert_eq!(using[0], ClassType::new("STD", "STD"));
        assert_eq!(using[1], ClassType::new("Geo", "Math"));
    }

    #[test]
    fn standard_using_type_not_duplicated() {
        let module = Module::new("main.dim").with_using(ClassType::new("STD", "STD"));
        assert_eq!(module.effective_using_types().len(), 1);
    }

    #[test]
    fn namespace_from_first_class() {
        let module = Module::new("a.dim").with_class(Class::new("Geo", "Circle", 1));
        assert_eq!(module.namespace(), "Geo");
        assert_eq!(Module::new("b.dim").namespace(), "");
    }
}
