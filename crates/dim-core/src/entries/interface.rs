//! Interface entries.

use crate::QualifiedName;
use crate::types::Type;

/// A method signature declared by an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Option<Type>,
    pub line: u32,
}

/// An interface: a named set of method signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub namespace: String,
    pub name: String,
    pub line: u32,
    pub methods: Vec<InterfaceMethod>,
}

impl InterfaceDef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, line: u32) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            line,
            methods: Vec::new(),
        }
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        params: Vec<Type>,
        return_type: Option<Type>,
    ) -> Self {
        self.methods.push(InterfaceMethod {
            name: name.into(),
            params,
            return_type,
            line: self.line,
        });
        self
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.namespace, &self.name)
    }
}
