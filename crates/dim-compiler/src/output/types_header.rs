use dim_core::Span;
use dim_registry::{ClassId, ClassRegistry};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::emit::CEmitter;

use super::{ClassLayout, OutputError, class_context};

/// The package types header.
///
/// Imported namespaces that are not compiled here pull in their package's
/// header from `package_headers` (namespace to file name); a namespace with
/// no entry is an error.
#[tracing::instrument(level = "debug", skip_all, fields(package = package_name))]
pub fn types_header(
    registry: &ClassRegistry,
    compiled: &[ClassId],
    package_name: &str,
    imported_namespaces: &[String],
    package_headers: &FxHashMap<String, String>,
) -> Result<String, OutputError> {
    if package_name.trim().is_empty() {
        return Err(OutputError::MissingPackageName);
    }

    let mut out = CEmitter::new();
    out.line("#pragma once");
    out.line("#include \"runtime.h\"");

    let mut included: Vec<&str> = Vec::new();
    for namespace in imported_namespaces {
        let local = compiled
            .iter()
            .any(|id| registry.class(*id).namespace.eq_ignore_ascii_case(namespace));
        if local || included.iter().any(|n| n.eq_ignore_ascii_case(namespace)) {
            continue;
        }
        let header = package_headers
            .get(namespace)
            .ok_or_else(|| OutputError::UnknownNamespace {
                namespace: namespace.clone(),
            })?;
        debug!(namespace = %namespace, header = %header, "including package header");
        out.line(format!("#include \"{header}\""));
        included.push(namespace);
    }

    if !compiled.is_empty() {
        out.blank();
    }
    for id in compiled {
        let c_name = registry.class(*id).c_name();
        out.line(format!("typedef struct {c_name} {c_name};"));
    }

    for id in compiled {
        let ctx = class_context(registry, *id);
        let layout = ClassLayout::new(&ctx, *id)?;
        let qualified = layout.class.qualified_name();
        let c_name = &layout.c_name;

        out.blank();
        out.line(format!("// {qualified}"));
        out.line(format!("struct {c_name}"));
        out.open();
        out.line("Definition *definition;");
        out.line("bool seen;");
        for (i, field) in layout.instance_fields.iter().enumerate() {
            let ty = ctx.c_type(&field.ty, Span::line(field.line))?;
            out.line(format!("{ty} f_{i}; // {qualified}.{}", field.name));
        }
        out.close_with(";");

        if layout.has_statics() {
            out.blank();
            out.line(format!("// {qualified}"));
            out.line(format!("typedef struct static_{c_name}"));
            out.open();
            for (i, field) in layout.class.static_fields.iter().enumerate() {
                let ty = ctx.c_type(&field.ty, Span::line(field.line))?;
                out.line(format!("{ty} f_{i}; // {qualified}.{}", field.name));
            }
            out.close_with(&format!(" static_{c_name};"));
        }
    }
    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{Class, ClassType, Field, ValueKind};

    fn registry() -> (ClassRegistry, Vec<ClassId>) {
        let mut registry = ClassRegistry::new();
        let shape = registry
            .register_class(Class::new("Geo", "Shape", 1).with_instance_field(Field::new("id", ValueKind::Int, 2)))
            .unwrap();
        let circle = registry
            .register_class(
                Class::new("Geo", "Circle", 4)
                    .with_base(ClassType::new("Geo", "Shape"))
                    .with_instance_field(Field::new("next", ClassType::new("Geo", "Circle").nullable(), 5))
                    .with_static_field(Field::new("count", ValueKind::Long, 6)),
            )
            .unwrap();
        (registry, vec![shape, circle])
    }

    #[test]
    fn structs_use_flattened_fields() {
        let (registry, compiled) = registry();
        let header = types_header(&registry, &compiled, "geo", &[], &FxHashMap::default()).unwrap();
        let expected = "\
#pragma once
#include \"runtime.h\"

typedef struct Geo_Shape Geo_Shape;
typedef struct Geo_Circle Geo_Circle;

// Geo::Shape
struct Geo_Shape
{
    Definition *definition;
    bool seen;
    int32_t f_0; // Geo::Shape.id
};

// Geo::Circle
struct Geo_Circle
{
    Definition *definition;
    bool seen;
    int32_t f_0; // Geo::Circle.id
    Geo_Circle* f_1; // Geo::Circle.next
};

// Geo::Circle
typedef struct static_Geo_Circle
{
    int64_t f_0; // Geo::Circle.count
} static_Geo_Circle;
";
        assert_eq!(header, expected);
    }

    #[test]
    fn imported_namespaces_include_their_package_header() {
        let (registry, compiled) = registry();
        let mut headers = FxHashMap::default();
        headers.insert("Std".to_string(), "std_types.h".to_string());
        let imports = vec!["Std".to_string(), "Geo".to_string(), "std".to_string()];
        let header = types_header(&registry, &compiled, "geo", &imports, &headers).unwrap();
        assert_eq!(header.matches("#include \"std_types.h\"").count(), 1);
    }

    #[test]
    fn unknown_import_and_missing_name_fail() {
        let (registry, compiled) = registry();
        let imports = vec!["Net".to_string()];
        match types_header(&registry, &compiled, "geo", &imports, &FxHashMap::default()) {
            Err(OutputError::UnknownNamespace { namespace }) => assert_eq!(namespace, "Net"),
            other => panic!("expected unknown namespace, got {other:?}"),
        }
        assert!(matches!(
            types_header(&registry, &compiled, " ", &[], &FxHashMap::default()),
            Err(OutputError::MissingPackageName)
        ));
    }
}
