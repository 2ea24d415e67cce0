use dim_core::{Class, ClassType, Field, InterfaceDef, Method, MethodBody, Stmt, Type, ValueKind};
use dim_metadata::{
    MetadataError, PackageMetadata, read_classes, read_classes_from, read_package, read_package_from,
    write_classes, write_classes_to, write_package, write_package_to,
};

fn circle() -> Class {
    let mut class = Class::new("Geo", "Circle", 4)
        .with_base(ClassType::new("Geo", "Shape"))
        .with_interface(ClassType::new("Geo", "Drawable"))
        .with_interface(ClassType::new("Geo", "Sized"))
        .with_static_field(Field::new("count", ValueKind::Long, 5))
        .with_static_field(Field::new("unit", ClassType::new("Geo", "Circle").nullable(), 6))
        .with_instance_field(Field::new("radius", ValueKind::Double, 7))
        .with_method(Method::new(
            "Scale",
            vec![Type::class("Geo", "Circle"), ValueKind::Double.into()],
            Some(Type::class("Geo", "Circle")),
            Stmt::empty(9),
            8,
        ))
        .with_method(Method::new("Reset", vec![], None, Stmt::empty(11), 10));
    class.synthesize_boxing().unwrap();
    class
}

#[test]
fn signatures_survive_a_round_trip() {
    let original = circle();
    let bytes = write_classes(&[original.clone(), Class::new("Geo", "Util", 1)]).unwrap();
    let classes = read_classes(&bytes).unwrap();
    assert_eq!(classes.len(), 2);

    let read = &classes[0];
    assert_eq!(read.qualified_name(), original.qualified_name());
    assert_eq!(read.base, original.base);
    assert_eq!(read.interfaces, original.interfaces);
    assert_eq!(read.static_fields[1].ty, original.static_fields[1].ty);
    assert_eq!(read.instance_fields[0].name, "radius");

    let names: Vec<_> = read.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Scale", "Reset", "Box", "Unbox"]);
    for (position, (read, original)) in read.methods.iter().zip(&original.methods).enumerate() {
        assert!(read.same_signature(original), "{} differs", original.name);
        assert_eq!(read.ordinal, position);
        assert!(matches!(read.body, MethodBody::External));
    }

    assert!(classes[1].base.is_none());
    assert!(classes[1].methods.is_empty());
}

#[test]
fn decoded_classes_are_not_boxed_twice() {
    let bytes = write_classes(&[circle()]).unwrap();
    let mut read = read_classes(&bytes).unwrap().remove(0);
    // The pair already exists as external methods; reserved names only
    // apply to source methods.
    read.synthesize_boxing().unwrap();
    assert_eq!(read.methods.len(), 4);
}

#[test]
fn stream_helpers_match_the_byte_api() {
    let mut buffer = Vec::new();
    write_classes_to(&mut buffer, &[circle()]).unwrap();
    assert_eq!(buffer, write_classes(&[circle()]).unwrap());
    let classes = read_classes_from(&mut buffer.as_slice()).unwrap();
    assert_eq!(classes[0].name, "Circle");
}

#[test]
fn unresolved_parameter_type_fails_the_write() {
    let class = Class::new("Geo", "Broken", 1).with_method(Method::new(
        "Take",
        vec![Type::Class(ClassType::unqualified("Mystery"))],
        None,
        Stmt::empty(2),
        2,
    ));
    assert!(matches!(
        write_classes(&[class]),
        Err(MetadataError::UnresolvedType { name }) if name == "Mystery"
    ));
}

#[test]
fn interfaces_survive_a_package_round_trip() {
    let drawable = InterfaceDef::new("Geo", "Drawable", 2)
        .with_method("Draw", vec![Type::class("Geo", "Drawable")], None)
        .with_method(
            "Bounds",
            vec![Type::class("Geo", "Drawable"), ValueKind::Int.into()],
            Some(Type::Class(ClassType::new("Geo", "Circle").nullable())),
        );
    let package = PackageMetadata::new(vec![circle()], vec![drawable.clone(), InterfaceDef::new("Geo", "Sized", 3)]);

    let mut buffer = Vec::new();
    write_package_to(&mut buffer, &package).unwrap();
    let read = read_package_from(&mut buffer.as_slice()).unwrap();

    assert_eq!(read.classes.len(), 1);
    assert_eq!(read.classes[0].interfaces, circle().interfaces);
    assert_eq!(read.interfaces.len(), 2);
    assert_eq!(read.interfaces[0].qualified_name(), drawable.qualified_name());
    for (read, original) in read.interfaces[0].methods.iter().zip(&drawable.methods) {
        assert_eq!(read.name, original.name);
        assert_eq!(read.params, original.params);
        assert_eq!(read.return_type, original.return_type);
    }
    assert!(read.interfaces[1].methods.is_empty());

    // Class-only readers skip the interface section.
    assert_eq!(read_classes(&buffer).unwrap().len(), 1);
}

#[test]
fn class_only_files_read_as_packages() {
    let bytes = write_classes(&[circle()]).unwrap();
    let package = read_package(&bytes).unwrap();
    assert_eq!(package.classes[0].name, "Circle");
    assert!(package.interfaces.is_empty());
    assert_eq!(write_package(&package).unwrap(), bytes);
}

#[test]
fn unresolved_interface_signature_fails_the_write() {
    let package = PackageMetadata::new(
        Vec::new(),
        vec![InterfaceDef::new("Geo", "Drawable", 1).with_method(
            "Draw",
            vec![Type::Class(ClassType::unqualified("Canvas"))],
            None,
        )],
    );
    assert!(matches!(
        write_package(&package),
        Err(MetadataError::UnresolvedType { name }) if name == "Canvas"
    ));
}
