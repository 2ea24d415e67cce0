use dim_registry::{ClassId, ClassRegistry};

use crate::emit::CEmitter;

use super::{ClassLayout, OutputError, class_context};

/// Runtime entry points copied out of the loader's `APITable`.
const RUNTIME_ENTRY_POINTS: &[&str] = &[
    "runtime_init",
    "runtime_load_package",
    "runtime_new",
    "runtime_free",
    "runtime_new_reference_local",
    "runtime_gc",
    "runtime_gc_force",
    "runtime_add_alloc",
    "runtime_sub_alloc",
    "runtime_show_instance",
    "runtime_null_coalesce",
    "runtime_unwrap",
    "runtime_try_push",
    "runtime_try_pop",
    "runtime_exception",
    "runtime_throw",
    "runtime_rethrow",
];

/// The definitions unit of a package.
///
/// Accessors cover every class in the registry; GC callbacks and the
/// `Definition` table cover the compiled classes only.
#[tracing::instrument(level = "debug", skip_all, fields(compiled = compiled.len()))]
pub fn definitions(registry: &ClassRegistry, compiled: &[ClassId], all_header: &str) -> Result<String, OutputError> {
    let mut out = CEmitter::new();
    out.line("#define FUNCTION_VAR");
    out.line(format!("#include \"{all_header}\""));
    out.line("RuntimeState *state = NULL;");
    for (_, class) in registry.classes() {
        out.line(format!("Definition *def_{} = NULL;", class.c_name()));
    }
    for (_, class) in registry.classes() {
        let c_name = class.c_name();
        out.line(format!("// {}", class.qualified_name()));
        out.line(format!("Definition *get_{c_name}(void)"));
        out.open();
        out.line(format!(
            "return ensure_definition(&def_{c_name}, \"{}\", \"{}\");",
            class.namespace, class.name
        ));
        out.close();
    }

    let mut layouts = Vec::with_capacity(compiled.len());
    for id in compiled {
        let ctx = class_context(registry, *id);
        layouts.push(ClassLayout::new(&ctx, *id)?);
    }

    for layout in &layouts {
        emit_show_refs(&mut out, layout);
    }

    out.line("static Definition definitions[] = {");
    out.indent();
    for layout in &layouts {
        emit_definition(&mut out, layout);
    }
    out.dedent();
    out.line("};");

    out.line("EXPORT void getDefinitions(APITable *table)");
    out.open();
    out.line(format!("table->count = {};", layouts.len()));
    out.line("table->defs = definitions;");
    out.line("state = table->state;");
    for entry in RUNTIME_ENTRY_POINTS {
        out.line(format!("{entry} = table->{entry};"));
    }
    out.close();
    Ok(out.finish())
}

fn emit_show_refs(out: &mut CEmitter, layout: &ClassLayout<'_>) {
    let qualified = layout.class.qualified_name();
    let c_name = &layout.c_name;
    if layout.has_instance_refs() {
        out.line(format!("// {qualified} instance refs"));
        out.line(format!("static void show_refs_{c_name}(Instance *instance)"));
        out.open();
        out.line(format!("{c_name} *obj = ({c_name}*)instance;"));
        for (i, field) in layout.instance_fields.iter().enumerate() {
            if field.ty.is_class() {
                out.line(format!(
                    "if (obj->f_{i}) runtime_show_instance(state, (Instance*)obj->f_{i});"
                ));
            }
        }
        out.close();
    }
    if layout.has_static_refs() {
        out.line(format!("// {qualified} static refs"));
        out.line(format!("static void show_static_refs_{c_name}(void)"));
        out.open();
        out.line(format!("static_{c_name} *s = &static_{c_name}_data;"));
        for (i, field) in layout.class.static_fields.iter().enumerate() {
            if field.ty.is_class() {
                out.line(format!(
                    "if (s->f_{i}) runtime_show_instance(state, (Instance*)s->f_{i});"
                ));
            }
        }
        out.close();
    }
}

fn emit_definition(out: &mut CEmitter, layout: &ClassLayout<'_>) {
    let class = layout.class;
    let c_name = &layout.c_name;
    out.line(format!("// {}", class.qualified_name()));
    out.open();
    out.line(format!(".namespace_ = \"{}\",", class.namespace));
    out.line(format!(".name = \"{}\",", class.name));
    if layout.instantiable() {
        out.line(format!(".instance_size = sizeof({c_name}),"));
        out.line(format!(".new = (InitFunc)new_{c_name},"));
        out.line(format!(".free = (FreeFunc)free_{c_name},"));
    } else {
        out.line(".instance_size = 0,");
        out.line(".new = NULL,");
        out.line(".free = NULL,");
    }
    if layout.has_instance_refs() {
        out.line(format!(".show_refs = show_refs_{c_name},"));
    } else {
        out.line(".show_refs = NULL,");
    }
    if layout.has_statics() {
        out.line(format!(".static_data = (Instance**)&static_{c_name}_data,"));
    } else {
        out.line(".static_data = NULL,");
    }
    if layout.has_static_refs() {
        out.line(format!(".show_static_refs = show_static_refs_{c_name},"));
    } else {
        out.line(".show_static_refs = NULL,");
    }
    if class.methods.is_empty() {
        out.line(".methods = NULL,");
        out.line(".method_count = 0");
    } else {
        out.line(format!(".methods = {c_name}_methods,"));
        out.line(format!(".method_count = {}", class.methods.len()));
    }
    out.close_with(",");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::{Class, ClassType, Field, Method, Stmt, ValueKind};

    #[test]
    fn table_and_callbacks() {
        let mut registry = ClassRegistry::new();
        registry.register_class(Class::new("STD", "Any", 1)).unwrap();
        let node = registry
            .register_class(
                Class::new("Geo", "Node", 2)
                    .with_instance_field(Field::new("weight", ValueKind::Double, 3))
                    .with_instance_field(Field::new("next", ClassType::new("Geo", "Node").nullable(), 4))
                    .with_static_field(Field::new("count", ValueKind::Int, 5))
                    .with_method(Method::new("Walk", vec![], None, Stmt::empty(6), 6)),
            )
            .unwrap();
        let util = registry.register_class(Class::new("Geo", "Util", 8)).unwrap();

        let unit = definitions(&registry, &[node, util], "all.h").unwrap();

        assert!(unit.starts_with("#define FUNCTION_VAR\n#include \"all.h\"\nRuntimeState *state = NULL;\n"));
        assert!(unit.contains("Definition *def_STD_Any = NULL;\n"));
        assert!(unit.contains("    return ensure_definition(&def_Geo_Util, \"Geo\", \"Util\");\n"));
        assert!(unit.contains("    if (obj->f_1) runtime_show_instance(state, (Instance*)obj->f_1);\n"));
        assert!(!unit.contains("obj->f_0"));
        assert!(!unit.contains("show_static_refs_Geo_Node(void)"));

        let node_entry = "\
    // Geo::Node
    {
        .namespace_ = \"Geo\",
        .name = \"Node\",
        .instance_size = sizeof(Geo_Node),
        .new = (InitFunc)new_Geo_Node,
        .free = (FreeFunc)free_Geo_Node,
        .show_refs = show_refs_Geo_Node,
        .static_data = (Instance**)&static_Geo_Node_data,
        .show_static_refs = NULL,
        .methods = Geo_Node_methods,
        .method_count = 1
    },
";
        assert!(unit.contains(node_entry), "{unit}");
        assert!(unit.contains("        .instance_size = 0,\n        .new = NULL,"));
        assert!(unit.contains("    table->count = 2;\n"));
        assert!(unit.contains("    runtime_rethrow = table->runtime_rethrow;\n"));
    }
}
