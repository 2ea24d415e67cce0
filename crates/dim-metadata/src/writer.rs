use std::io::Write;

use dim_core::{Class, ClassType, InterfaceDef, Type};
use tracing::debug;

use crate::{MetadataError, PackageMetadata};

type Result<T> = std::result::Result<T, MetadataError>;

/// Encode `classes` into a metadata file.
///
/// Record layout, per class:
///
/// ```text
/// string ns, string name
/// typeref base                       (exists = false when absent)
/// i32 interface_count, typeref * n
/// i32 method_count, i32 static_count, i32 instance_count
/// per method:   string name, i32 argc, typeref * argc,
///               bool has_return, [typeref]
/// per static:   string name, typeref
/// per instance: string name, typeref
/// ```
///
/// A type reference is `bool exists, bool is_class`, then `string ns,
/// string name, bool nullable` for a class or `string name` for a value.
/// Class references must be qualified.
pub fn write_classes(classes: &[Class]) -> Result<Vec<u8>> {
    let mut writer = MetadataWriter::default();
    writer.classes(classes)?;
    debug!(classes = classes.len(), bytes = writer.buf.len(), "encoded metadata");
    Ok(writer.buf)
}

/// Encode `classes` into `out`.
pub fn write_classes_to(out: &mut impl Write, classes: &[Class]) -> Result<()> {
    out.write_all(&write_classes(classes)?)?;
    Ok(())
}

/// Encode a whole package: the class records, then the interface section
/// when the package declares interfaces.
///
/// ```text
/// i32 interface_count
/// per interface: string ns, string name, i32 method_count,
///                per method: string name, i32 argc, typeref * argc,
///                            bool has_return, [typeref]
/// ```
///
/// Without interfaces the output is exactly [`write_classes`].
pub fn write_package(package: &PackageMetadata) -> Result<Vec<u8>> {
    let mut writer = MetadataWriter::default();
    writer.classes(&package.classes)?;
    if !package.interfaces.is_empty() {
        writer.i32(len(package.interfaces.len())?);
        for interface in &package.interfaces {
            writer.interface(interface)?;
        }
    }
    debug!(
        classes = package.classes.len(),
        interfaces = package.interfaces.len(),
        bytes = writer.buf.len(),
        "encoded package metadata"
    );
    Ok(writer.buf)
}

pub fn write_package_to(out: &mut impl Write, package: &PackageMetadata) -> Result<()> {
    out.write_all(&write_package(package)?)?;
    Ok(())
}

fn len(n: usize) -> Result<i32> {
    i32::try_from(n).map_err(|_| MetadataError::InvalidLength {
        length: n as i64,
        offset: 0,
    })
}

#[derive(Default)]
struct MetadataWriter {
    buf: Vec<u8>,
}

impl MetadataWriter {
    fn classes(&mut self, classes: &[Class]) -> Result<()> {
        self.i32(len(classes.len())?);
        for class in classes {
            self.class(class)?;
        }
        Ok(())
    }

    fn class(&mut self, class: &Class) -> Result<()> {
        self.string(&class.namespace);
        self.string(&class.name);

        match &class.base {
            Some(base) => self.class_ref(base)?,
            None => self.absent(),
        }

        self.i32(len(class.interfaces.len())?);
        for interface in &class.interfaces {
            self.class_ref(interface)?;
        }

        self.i32(len(class.methods.len())?);
        self.i32(len(class.static_fields.len())?);
        self.i32(len(class.instance_fields.len())?);

        for method in &class.methods {
            self.signature(&method.name, &method.params, method.return_type.as_ref())?;
        }

        for field in class.static_fields.iter().chain(&class.instance_fields) {
            self.string(&field.name);
            self.type_ref(&field.ty)?;
        }
        Ok(())
    }

    fn interface(&mut self, interface: &InterfaceDef) -> Result<()> {
        self.string(&interface.namespace);
        self.string(&interface.name);
        self.i32(len(interface.methods.len())?);
        for method in &interface.methods {
            self.signature(&method.name, &method.params, method.return_type.as_ref())?;
        }
        Ok(())
    }

    fn signature(&mut self, name: &str, params: &[Type], return_type: Option<&Type>) -> Result<()> {
        self.string(name);
        self.i32(len(params.len())?);
        for param in params {
            self.type_ref(param)?;
        }
        match return_type {
            Some(ret) => {
                self.bool(true);
                self.type_ref(ret)
            }
            None => {
                self.bool(false);
                Ok(())
            }
        }
    }

    fn type_ref(&mut self, ty: &Type) -> Result<()> {
        match ty {
            Type::Class(class) => self.class_ref(class),
            Type::Value(kind) => {
                self.bool(true);
                self.bool(false);
                self.string(kind.name());
                Ok(())
            }
        }
    }

    fn class_ref(&mut self, ty: &ClassType) -> Result<()> {
        let namespace = match &ty.namespace {
            Some(ns) if ty.is_qualified() => ns,
            _ => {
                return Err(MetadataError::UnresolvedType {
                    name: ty.to_string(),
                });
            }
        };
        self.bool(true);
        self.bool(true);
        self.string(namespace);
        self.string(&ty.name);
        self.bool(ty.nullable);
        Ok(())
    }

    fn absent(&mut self) {
        self.bool(false);
    }

    // === Primitives ===

    fn bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// 7-bit encoded length prefix, low groups first.
    fn string(&mut self, value: &str) {
        let mut n = value.len();
        while n >= 0x80 {
            self.buf.push((n as u8) | 0x80);
            n >>= 7;
        }
        self.buf.push(n as u8);
        self.buf.extend_from_slice(value.as_bytes());
    }
}
