//! Package metadata codec.
//!
//! A compiled package ships a metadata file describing the signatures of its
//! classes, so dependent packages can type check calls into it without the
//! source. The encoding follows .NET `BinaryWriter` conventions:
//!
//! | Item   | Encoding                                        |
//! |--------|-------------------------------------------------|
//! | string | 7-bit varint byte length, then UTF-8 bytes      |
//! | i32    | 4 bytes little endian                           |
//! | bool   | 1 byte, `0` or `1`                              |
//!
//! The file is an `i32` class count followed by one record per class; see
//! [`write_classes`] for the record layout. A package that declares
//! interfaces appends an interface section (see [`write_package`]); readers
//! treat a file that ends after the class records as having none.
//!
//! # Example
//!
//! ```
//! use dim_core::{Class, ClassType, Field, ValueKind};
//! use dim_metadata::{read_classes, write_classes};
//!
//! let class = Class::new("Geo", "Point", 1)
//!     .with_instance_field(Field::new("x", ValueKind::Int, 2))
//!     .with_base(ClassType::new("Geo", "Shape"));
//! let bytes = write_classes(&[class]).unwrap();
//! let classes = read_classes(&bytes).unwrap();
//! assert_eq!(classes[0].instance_fields[0].name, "x");
//! ```

mod error;
mod reader;
mod writer;

use dim_core::{Class, InterfaceDef};

pub use error::MetadataError;
pub use reader::{read_classes, read_classes_from, read_package, read_package_from};
pub use writer::{write_classes, write_classes_to, write_package, write_package_to};

/// Signatures a compiled package exposes to its dependents.
#[derive(Debug, Clone, Default)]
pub struct PackageMetadata {
    pub classes: Vec<Class>,
    pub interfaces: Vec<InterfaceDef>,
}

impl PackageMetadata {
    pub fn new(classes: Vec<Class>, interfaces: Vec<InterfaceDef>) -> Self {
        Self { classes, interfaces }
    }
}
