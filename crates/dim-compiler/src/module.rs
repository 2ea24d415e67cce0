//! Module lowering: one parsed file to one C header/source pair.
//!
//! Per class, in declaration order, the header declares and the source
//! defines:
//!
//! - `new_NS_Name` / `free_NS_Name` when instances have fields
//! - `static_NS_Name_data` when the class has static fields
//! - one C function per method
//!
//! The method tables (`Method NS_Name_methods[]`) are appended to the
//! source after every class, since they reference the functions above.

use std::path::PathBuf;

use dim_core::{CompilationError, Module};
use dim_registry::{ClassId, ClassRegistry};
use tracing::debug;

use crate::context::CompilationContext;
use crate::emit::CEmitter;
use crate::function_compiler::{compile_method, method_c_name, method_signature};
use crate::output::ClassLayout;

type Result<T> = std::result::Result<T, CompilationError>;

/// Generated C for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutput {
    /// Path of the source module.
    pub path: PathBuf,
    pub header: String,
    pub source: String,
}

/// Header names a module refers to.
#[derive(Debug, Clone, Copy)]
pub struct ModuleHeaders<'a> {
    /// Included by the module header.
    pub types_header: &'a str,
    /// Included by the module source.
    pub all_header: &'a str,
}

/// Lower every class of `module`.
///
/// The module's classes must already be registered; the registered entry
/// (with its synthesized `Box`/`Unbox`) is what gets compiled.
#[tracing::instrument(level = "debug", skip_all, fields(path = %module.path.display()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_module(registry: &ClassRegistry, module: &Module, headers: ModuleHeaders<'_>) -> Result<ModuleOutput> {
    let mut ctx = CompilationContext::for_module(registry, module)?;

    let mut header = CEmitter::new();
    header.line("#pragma once");
    header.line(format!("#include \"{}\"", headers.types_header));

    let mut source = CEmitter::new();
    source.line(format!("#include \"{}\"", headers.all_header));

    let mut tables = CEmitter::new();

    for declared in &module.classes {
        let id = registry.class_id(&declared.qualified_name()).ok_or_else(|| {
            CompilationError::internal(format!("class {} is not registered", declared.qualified_name()))
        })?;
        compile_class(&mut ctx, id, &mut header, &mut source, &mut tables)?;
    }

    if !tables.is_empty() {
        source.line(tables.finish().trim_end());
    }
    Ok(ModuleOutput {
        path: module.path.clone(),
        header: header.finish(),
        source: source.finish(),
    })
}

fn compile_class(
    ctx: &mut CompilationContext<'_>,
    id: ClassId,
    header: &mut CEmitter,
    source: &mut CEmitter,
    tables: &mut CEmitter,
) -> Result<()> {
    let layout = ClassLayout::new(ctx, id)?;
    let class = layout.class;
    let qualified = class.qualified_name();
    let c_name = &layout.c_name;
    debug!(class = %qualified, methods = class.methods.len(), "compiling class");

    if layout.instantiable() {
        let ctor = format!("{c_name}* new_{c_name}(void)");
        let dtor = format!("void free_{c_name}({c_name}* instance)");
        for out in [&mut *header, &mut *source] {
            out.blank();
            out.line(format!("// {qualified}"));
        }
        header.line(format!("{ctor};"));
        source.line(ctor);
        source.open();
        source.line(format!("{c_name}* instance = ({c_name}*)malloc(sizeof({c_name}));"));
        for (i, field) in layout.instance_fields.iter().enumerate() {
            let zero = if field.ty.is_class() { "NULL" } else { "0" };
            source.line(format!("instance->f_{i} = {zero};"));
        }
        source.line("return instance;");
        source.close();

        for out in [&mut *header, &mut *source] {
            out.blank();
            out.line(format!("// {qualified}"));
        }
        header.line(format!("{dtor};"));
        source.line(dtor);
        source.open();
        source.line("free(instance);");
        source.close();
    }

    if layout.has_statics() {
        for out in [&mut *header, &mut *source] {
            out.blank();
            out.line(format!("// {qualified}"));
        }
        header.line(format!("extern static_{c_name} static_{c_name}_data;"));
        source.line(format!("static_{c_name} static_{c_name}_data;"));
    }

    if class.methods.is_empty() {
        return Ok(());
    }

    header.blank();
    header.line(format!("extern Method {c_name}_methods[];"));
    tables.blank();
    tables.line(format!("// {qualified}"));
    tables.line(format!("Method {c_name}_methods[] = {{"));
    tables.indent();

    for method in &class.methods {
        header.blank();
        header.line(format!("// {qualified}.{}", method.name));
        header.line(format!("{};", method_signature(ctx, class, method)?));

        source.blank();
        compile_method(ctx, id, method, source)?;

        tables.line(format!("// {qualified}.{}", method.name));
        tables.line(format!(
            "{{ \"{}\", (void*){} }},",
            method.name,
            method_c_name(class, method)
        ));
    }

    tables.dedent();
    tables.line("};");
    ctx.set_current_class(None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::registry;
    use dim_core::Class;

    const HEADERS: ModuleHeaders<'static> = ModuleHeaders {
        types_header: "geo_types.h",
        all_header: "all.h",
    };

    fn module() -> Module {
        Module::new("geo/shapes.dim")
            .with_class(Class::new("Geo", "Circle", 5))
            .with_class(Class::new("Geo", "Main", 12))
    }

    #[test]
    fn header_declares_everything_the_source_defines() {
        let registry = registry();
        let output = compile_module(&registry, &module(), HEADERS).unwrap();
        assert_eq!(output.path, PathBuf::from("geo/shapes.dim"));

        let expected_header = "\
#pragma once
#include \"geo_types.h\"

// Geo::Circle
Geo_Circle* new_Geo_Circle(void);

// Geo::Circle
void free_Geo_Circle(Geo_Circle* instance);

extern Method Geo_Circle_methods[];

// Geo::Circle.Area
double Geo_Circle_Area(Geo_Circle* p_0);

// Geo::Circle.Grow
void Geo_Circle_Grow(Geo_Circle* p_0, double p_1);

// Geo::Main
extern static_Geo_Main static_Geo_Main_data;

extern Method Geo_Main_methods[];

// Geo::Main.Run
void Geo_Main_Run(void);

// Geo::Main.Make
Geo_Circle* Geo_Main_Make(void);
";
        assert_eq!(output.header, expected_header);
    }

    #[test]
    fn constructor_zeroes_flattened_fields() {
        let registry = registry();
        let output = compile_module(&registry, &module(), HEADERS).unwrap();
        let ctor = "\
Geo_Circle* new_Geo_Circle(void)
{
    Geo_Circle* instance = (Geo_Circle*)malloc(sizeof(Geo_Circle));
    instance->f_0 = 0;
    instance->f_1 = 0;
    instance->f_2 = NULL;
    return instance;
}
";
        assert!(output.source.starts_with("#include \"all.h\"\n\n// Geo::Circle\n"));
        assert!(output.source.contains(ctor));
        assert!(output.source.contains("\n// Geo::Main\nstatic_Geo_Main static_Geo_Main_data;\n"));
        assert!(!output.source.contains("new_Geo_Main"));
    }

    #[test]
    fn method_tables_follow_all_bodies() {
        let registry = registry();
        let output = compile_module(&registry, &module(), HEADERS).unwrap();
        let tables = "\
// Geo::Circle
Method Geo_Circle_methods[] = {
    // Geo::Circle.Area
    { \"Area\", (void*)Geo_Circle_Area },
    // Geo::Circle.Grow
    { \"Grow\", (void*)Geo_Circle_Grow },
};

// Geo::Main
Method Geo_Main_methods[] = {
    // Geo::Main.Run
    { \"Run\", (void*)Geo_Main_Run },
    // Geo::Main.Make
    { \"Make\", (void*)Geo_Main_Make },
};
";
        assert!(output.source.ends_with(tables), "{}", output.source);
        let last_body = output.source.rfind("ret_value;").unwrap();
        assert!(last_body < output.source.find("Method Geo_Circle_methods").unwrap());
    }

    #[test]
    fn unregistered_class_is_internal() {
        let registry = registry();
        let module = Module::new("x.dim").with_class(Class::new("Geo", "Ghost", 1));
        assert!(matches!(
            compile_module(&registry, &module, HEADERS),
            Err(CompilationError::Internal { .. })
        ));
    }
}
