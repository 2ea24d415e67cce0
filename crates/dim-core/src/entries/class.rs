//! Class entry.

use crate::error::CompilationError;
use crate::types::{ClassType, Type};
use crate::{QualifiedName, Span};

use super::{Field, Method, MethodBody};

/// Name of the synthesized boxing method.
pub const BOX_METHOD: &str = "Box";

/// Name of the synthesized unboxing method.
pub const UNBOX_METHOD: &str = "Unbox";

/// A class as produced by the parser or read back from package metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub namespace: String,
    pub name: String,
    pub line: u32,

    // === Members ===
    /// Methods in ordinal order.
    pub methods: Vec<Method>,
    pub static_fields: Vec<Field>,
    /// Fields declared by this class only (ancestors' fields excluded).
    pub instance_fields: Vec<Field>,

    // === Inheritance ===
    /// Declared base. May name an interface, in which case it only
    /// contributes to the implemented set.
    pub base: Option<ClassType>,
    pub interfaces: Vec<ClassType>,
}

impl Class {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, line: u32) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            line,
            methods: Vec::new(),
            static_fields: Vec::new(),
            instance_fields: Vec::new(),
            base: None,
            interfaces: Vec::new(),
        }
    }

    // === Builder Methods ===

    pub fn with_base(mut self, base: ClassType) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: ClassType) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Append a method, assigning it the next ordinal.
    pub fn with_method(mut self, method: Method) -> Self {
        self.push_method(method);
        self
    }

    pub fn with_static_field(mut self, field: Field) -> Self {
        self.static_fields.push(field);
        self
    }

    pub fn with_instance_field(mut self, field: Field) -> Self {
        self.instance_fields.push(field);
        self
    }

    /// Append a method, assigning it the next ordinal.
    pub fn push_method(&mut self, mut method: Method) {
        method.ordinal = self.methods.len();
        self.methods.push(method);
    }

    // === Identity ===

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.namespace, &self.name)
    }

    /// `NS_Name`.
    pub fn c_name(&self) -> String {
        format!("{}_{}", self.namespace, self.name)
    }

    /// The non-nullable type naming this class.
    pub fn self_type(&self) -> ClassType {
        ClassType::new(&self.namespace, &self.name)
    }

    // === Boxing ===

    /// Classes with instance state or a base get `Box`/`Unbox`.
    pub fn needs_boxing(&self) -> bool {
        !self.instance_fields.is_empty() || self.base.is_some()
    }

    /// Whether the pair is already present, synthesized here or read back
    /// from metadata as external methods.
    pub fn has_boxing(&self) -> bool {
        self.methods.iter().any(|m| {
            matches!(m.body, MethodBody::Box | MethodBody::Unbox)
                || (m.is_external() && (m.name == BOX_METHOD || m.name == UNBOX_METHOD))
        })
    }

    /// Append the synthesized `Box`/`Unbox` pair after the declared methods.
    ///
    /// Both names are reserved: a source method or field using either is an
    /// error. Does nothing for classes that do not need boxing or already
    /// carry the pair.
    pub fn synthesize_boxing(&mut self) -> Result<(), CompilationError> {
        let reserved = |name: &str| name == BOX_METHOD || name == UNBOX_METHOD;
        if let Some(member) = self
            .methods
            .iter()
            .filter(|m| matches!(m.body, MethodBody::Source(_)))
            .map(|m| (&m.name, m.line))
            .chain(
                self.static_fields
                    .iter()
                    .chain(&self.instance_fields)
                    .map(|f| (&f.name, f.line)),
            )
            .find(|(name, _)| reserved(name))
        {
            return Err(CompilationError::InvalidOperation {
                message: format!(
                    "cannot use {} as a member name in {}::{}",
                    member.0, self.namespace, self.name
                ),
                span: Span::line(member.1),
            });
        }

        if !self.needs_boxing() || self.has_boxing() {
            return Ok(());
        }

        let any = ClassType::new("STD", "Any");
        let line = self.line;
        self.push_method(Method {
            name: BOX_METHOD.to_string(),
            params: vec![Type::Class(self.self_type().nullable())],
            return_type: Some(Type::Class(any.clone())),
            body: MethodBody::Box,
            ordinal: 0,
            line,
        });
        self.push_method(Method {
            name: UNBOX_METHOD.to_string(),
            params: vec![Type::Class(any.nullable())],
            return_type: Some(Type::Class(self.self_type().nullable())),
            body: MethodBody::Unbox,
            ordinal: 0,
            line,
        });
        Ok(())
    }

    // === Lookup ===

    pub fn static_field_index(&self, name: &str) -> Option<usize> {
        self.static_fields.iter().position(|f| f.name == name)
    }

    pub fn methods_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Method> + use<'a, 'n> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn has_class_typed_instance_fields(&self) -> bool {
        self.instance_fields.iter().any(|f| f.ty.is_class())
    }

    pub fn has_class_typed_static_fields(&self) -> bool {
        self.static_fields.iter().any(|f| f.ty.is_class())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::types::ValueKind;

    fn vector2() -> Class {
        Class::new("Demo", "Vector2", 1)
            .with_instance_field(Field::new("x", ValueKind::Double, 2))
            .with_instance_field(Field::new("y", ValueKind::Double, 3))
            .with_method(Method::new(
                "Length",
                vec![Type::class("Demo", "Vector2")],
                Some(Type::value(ValueKind::Double)),
                Stmt::empty(4),
                4,
            ))
    }

    #[test]
    fn ordinals_follow_insertion_order() {
        let class = vector2().with_method(Method::new("Other", vec![], None, Stmt::empty(5), 5));
        let ordinals: Vec<_> = class.methods.iter().map(|m| m.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[test]
    fn methods_named_outlive_the_looked_up_name() {
        let class = vector2().with_method(Method::new("Other", vec![], None, Stmt::empty(5), 5));
        let found: Vec<&Method> = {
            let name = String::from("Length");
            class.methods_named(&name).collect()
        };
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ordinal, 0);
    }

    #[test]
    fn boxing_appended_after_declared_methods() {
        let mut class = vector2();
        class.synthesize_boxing().unwrap();
        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Length", "Box", "Unbox"]);
        assert_eq!(class.methods[1].ordinal, 1);
        assert_eq!(class.methods[2].ordinal, 2);
        assert_eq!(
            class.methods[2].return_type,
            Some(Type::Class(ClassType::new("Demo", "Vector2").nullable()))
        );
    }

    #[test]
    fn boxing_is_idempotent() {
        let mut class = vector2();
        class.synthesize_boxing().unwrap();
        class.synthesize_boxing().unwrap();
        assert_eq!(class.methods.len(), 3);
    }

    #[test]
    fn static_only_class_is_not_boxed() {
        let mut class = Class::new("Demo", "Util", 1)
            .with_static_field(Field::new("count", ValueKind::Int, 2));
        class.synthesize_boxing().unwrap();
        assert!(class.methods.is_empty());
    }

    #[test]
    fn derived_class_without_fields_is_boxed() {
        let mut class = Class::new("Demo", "Child", 1).with_base(ClassType::unqualified("Parent"));
        class.synthesize_boxing().unwrap();
        assert!(class.has_boxing());
    }

    #[test]
    fn reserved_member_name_rejected() {
        let mut class = vector2().with_method(Method::new("Box", vec![], None, Stmt::empty(9), 9));
        match class.synthesize_boxing().unwrap_err() {
            CompilationError::InvalidOperation { message, span } => {
                assert!(message.contains("Box"));
                assert_eq!(span.line, 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
