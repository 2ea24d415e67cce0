use std::io::Read;

use dim_core::{Class, ClassType, Field, InterfaceDef, Method, Type, ValueKind};
use tracing::debug;

use crate::{MetadataError, PackageMetadata};

type Result<T> = std::result::Result<T, MetadataError>;

/// Decode a metadata file.
///
/// Methods come back signature-only with their position as ordinal, so a
/// class's synthesized `Box`/`Unbox` reappear as ordinary entries. Source
/// lines are not stored and read back as `0`.
///
/// Only the class records are read; an interface section is ignored.
pub fn read_classes(bytes: &[u8]) -> Result<Vec<Class>> {
    let mut reader = MetadataReader { bytes, pos: 0 };
    let classes = reader.classes()?;
    debug!(classes = classes.len(), "decoded metadata");
    Ok(classes)
}

/// Decode a metadata file from `input`.
pub fn read_classes_from(input: &mut impl Read) -> Result<Vec<Class>> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    read_classes(&bytes)
}

/// Decode classes and, when present, the interface section.
///
/// Interface methods come back with line `0`.
pub fn read_package(bytes: &[u8]) -> Result<PackageMetadata> {
    let mut reader = MetadataReader { bytes, pos: 0 };
    let classes = reader.classes()?;
    let mut interfaces = Vec::new();
    if !reader.at_end() {
        for _ in 0..reader.count()? {
            interfaces.push(reader.interface()?);
        }
    }
    debug!(
        classes = classes.len(),
        interfaces = interfaces.len(),
        "decoded package metadata"
    );
    Ok(PackageMetadata::new(classes, interfaces))
}

pub fn read_package_from(input: &mut impl Read) -> Result<PackageMetadata> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    read_package(&bytes)
}

struct MetadataReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl MetadataReader<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn classes(&mut self) -> Result<Vec<Class>> {
        let count = self.count()?;
        let mut classes = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            classes.push(self.class()?);
        }
        Ok(classes)
    }

    fn class(&mut self) -> Result<Class> {
        let namespace = self.string()?;
        let name = self.string()?;
        let mut class = Class::new(namespace, name, 0);

        class.base = match self.type_ref()? {
            Some(Type::Class(base)) => Some(base),
            Some(Type::Value(kind)) => {
                return Err(MetadataError::UnresolvedType {
                    name: kind.name().to_string(),
                });
            }
            None => None,
        };

        for _ in 0..self.count()? {
            class.interfaces.push(self.required_class_ref()?);
        }

        let methods = self.count()?;
        let statics = self.count()?;
        let instances = self.count()?;

        for ordinal in 0..methods {
            let (name, params, return_type) = self.signature()?;
            class.methods.push(Method::external(name, params, return_type, ordinal));
        }
        for _ in 0..statics {
            let field = self.field()?;
            class.static_fields.push(field);
        }
        for _ in 0..instances {
            let field = self.field()?;
            class.instance_fields.push(field);
        }
        Ok(class)
    }

    fn interface(&mut self) -> Result<InterfaceDef> {
        let namespace = self.string()?;
        let name = self.string()?;
        let mut interface = InterfaceDef::new(namespace, name, 0);
        for _ in 0..self.count()? {
            let (name, params, return_type) = self.signature()?;
            interface = interface.with_method(name, params, return_type);
        }
        Ok(interface)
    }

    fn signature(&mut self) -> Result<(String, Vec<Type>, Option<Type>)> {
        let name = self.string()?;
        let mut params = Vec::new();
        for _ in 0..self.count()? {
            params.push(self.required_type()?);
        }
        let return_type = if self.bool()? { Some(self.required_type()?) } else { None };
        Ok((name, params, return_type))
    }

    fn field(&mut self) -> Result<Field> {
        let name = self.string()?;
        let ty = self.required_type()?;
        Ok(Field::new(name, ty, 0))
    }

    fn required_type(&mut self) -> Result<Type> {
        let offset = self.pos;
        self.type_ref()?.ok_or(MetadataError::MissingType { offset })
    }

    fn required_class_ref(&mut self) -> Result<ClassType> {
        match self.required_type()? {
            Type::Class(class) => Ok(class),
            Type::Value(kind) => Err(MetadataError::UnresolvedType {
                name: kind.name().to_string(),
            }),
        }
    }

    fn type_ref(&mut self) -> Result<Option<Type>> {
        if !self.bool()? {
            return Ok(None);
        }
        if self.bool()? {
            let namespace = self.string()?;
            let name = self.string()?;
            let nullable = self.bool()?;
            let class = ClassType::new(namespace, name);
            Ok(Some(Type::Class(if nullable { class.nullable() } else { class })))
        } else {
            let name = self.string()?;
            ValueKind::from_name(&name)
                .map(|kind| Some(Type::Value(kind)))
                .ok_or(MetadataError::UnresolvedType { name })
        }
    }

    // === Primitives ===

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(MetadataError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Any non-zero byte reads as `true`, as `BinaryReader` does.
    fn bool(&mut self) -> Result<bool> {
        Ok(self.byte()? != 0)
    }

    fn i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// A non-negative `i32` count.
    fn count(&mut self) -> Result<usize> {
        let offset = self.pos;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| MetadataError::InvalidLength {
            length: i64::from(value),
            offset,
        })
    }

    fn string(&mut self) -> Result<String> {
        let offset = self.pos;
        let mut length: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.byte()?;
            length |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 28 {
                return Err(MetadataError::InvalidLength {
                    length: length as i64,
                    offset,
                });
            }
        }
        let length = usize::try_from(length).map_err(|_| MetadataError::InvalidLength {
            length: length as i64,
            offset,
        })?;
        let start = self.pos;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| MetadataError::InvalidUtf8 { offset: start })
    }
}
