/// The namespaces a module can see without qualification: its own plus
/// everything it imports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    namespace: String,
    imports: Vec<String>,
}

impl Visibility {
    pub fn new(namespace: impl Into<String>, imports: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            imports,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn can_see(&self, namespace: &str) -> bool {
        namespace == self.namespace || self.imports.iter().any(|i| i == namespace)
    }
}
