use std::fmt;

/// Fully resolved identity of a class or interface.
///
/// # Examples
///
/// ```
/// use dim_core::QualifiedName;
///
/// let name = QualifiedName::new("Demo", "Vector2");
/// assert_eq!(name.to_string(), "Demo::Vector2");
/// assert_eq!(name.c_name(), "Demo_Vector2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Lookup key used by the registry and by cycle detection (`"NS Name"`).
    pub fn key(&self) -> String {
        format!("{} {}", self.namespace, self.name)
    }

    /// Identifier used for every generated C symbol of this type (`NS_Name`).
    pub fn c_name(&self) -> String {
        format!("{}_{}", self.namespace, self.name)
    }

    /// Whether a (possibly partial) namespace reference selects this name.
    ///
    /// Qualification is prefix based: `Ge` selects `Geo`.
    pub fn matches_prefix(&self, namespace: Option<&str>) -> bool {
        namespace.is_none_or(|prefix| self.namespace.starts_with(prefix))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}
