//! Class and interface graph for the dim compiler.
//!
//! [`ClassRegistry`] owns every class and interface known to a package,
//! whether compiled from source or imported from metadata. Name lookup
//! depends on the module doing the looking, so it goes through a
//! [`Resolver`], which pairs the registry with a [`Visibility`] and
//! memoizes results.
//!
//! # Example
//!
//! ```
//! use dim_core::{Class, ClassType};
//! use dim_registry::{ClassRegistry, Resolver, Visibility};
//!
//! let mut registry = ClassRegistry::new();
//! registry.register_class(Class::new("Geo", "Shape", 1)).unwrap();
//! registry
//!     .register_class(Class::new("Geo", "Circle", 5).with_base(ClassType::unqualified("Shape")))
//!     .unwrap();
//!
//! let resolver = Resolver::new(&registry, Visibility::new("Geo", Vec::new()));
//! let circle = resolver.resolve_class(&ClassType::unqualified("Circle"), 9).unwrap();
//! let shape = resolver.top_base_class(circle).unwrap();
//! assert_eq!(registry.class(shape).name, "Shape");
//! ```

mod hierarchy;
mod registry;
mod resolver;
mod visibility;

pub use registry::{ClassId, ClassRegistry, InterfaceId};
pub use resolver::{Resolver, TypeTarget};
pub use visibility::Visibility;
