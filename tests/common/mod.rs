//! Shared fixtures for package build tests.

#![allow(dead_code)]

use dim::{BuildError, CompilerConfig, ImportedPackage, Package, PackageOutput};
use dim_core::{BinaryOp, Class, ClassType, Expr, Field, Method, Module, Stmt, Type, ValueKind};

pub fn class_ty(name: &str) -> Type {
    Type::Class(ClassType::unqualified(name))
}

pub fn nullable(name: &str) -> Type {
    Type::Class(ClassType::unqualified(name).nullable())
}

pub fn double() -> Type {
    ValueKind::Double.into()
}

/// The slice of the standard package that lowering depends on.
pub fn std_package() -> ImportedPackage {
    ImportedPackage::new(
        "STD",
        "STD/all_types.h",
        vec![
            Class::new("STD", "STD", 0).with_method(Method::external(
                "Print",
                vec![ValueKind::CStr.into()],
                None,
                0,
            )),
            Class::new("STD", "Any", 0).with_instance_field(Field::new("value", ValueKind::Inst, 0)),
            Class::new("STD", "Error", 0).with_instance_field(Field::new("message", ValueKind::CStr, 0)),
        ],
    )
}

/// `Shape { id; Area }` and `Circle : Shape { radius; Area }`.
pub fn shapes_module() -> Module {
    let shape = Class::new("Geo", "Shape", 1)
        .with_instance_field(Field::new("id", ValueKind::Int, 2))
        .with_method(Method::new(
            "Area",
            vec![class_ty("Shape")],
            Some(double()),
            Stmt::ret(Some(Expr::number("0", 3)), 3),
            3,
        ));

    let circle = Class::new("Geo", "Circle", 5)
        .with_base(ClassType::unqualified("Shape"))
        .with_instance_field(Field::new("radius", ValueKind::Double, 6))
        .with_method(Method::new(
            "Area",
            vec![class_ty("Circle")],
            Some(double()),
            Stmt::ret(Some(Expr::instance_field(Expr::argument(0, 8), "radius", 8)), 8),
            7,
        ));

    Module::new("geo/shapes.dim")
        .with_import("STD")
        .with_class(shape)
        .with_class(circle)
}

/// `Main` with a virtual call and both nil coalesce forms.
pub fn main_module() -> Module {
    let main = Class::new("Geo", "Main", 10)
        .with_method(Method::new(
            "Sum",
            vec![class_ty("Shape")],
            Some(double()),
            Stmt::ret(Some(Expr::call_instance(Expr::argument(0, 12), "Area", vec![], 12)), 12),
            11,
        ))
        .with_method(Method::new(
            "OrFallback",
            vec![class_ty("Circle")],
            Some(class_ty("Circle")),
            Stmt::ret(
                Some(Expr::binary(Expr::nil(15), BinaryOp::Coalesce, Expr::argument(0, 15))),
                15,
            ),
            14,
        ))
        .with_method(Method::new(
            "OrNil",
            vec![nullable("Circle")],
            Some(nullable("Circle")),
            Stmt::ret(
                Some(Expr::binary(Expr::argument(0, 18), BinaryOp::Coalesce, Expr::nil(18))),
                18,
            ),
            17,
        ));
    Module::new("geo/main.dim").with_import("STD").with_class(main)
}

pub fn config() -> CompilerConfig {
    CompilerConfig::new("Geo").with_types_header("geo_types.h")
}

pub fn build(config: CompilerConfig, imports: Vec<ImportedPackage>, modules: Vec<Module>) -> Result<PackageOutput, BuildError> {
    let mut package = Package::new(config);
    for import in imports {
        package.add_import(import)?;
    }
    for module in modules {
        package.add_module(module)?;
    }
    package.build()?;
    Ok(package.into_output().expect("built package has output"))
}
