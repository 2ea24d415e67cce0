use dim_registry::ClassRegistry;

use crate::emit::CEmitter;

const DEFINITION_LOOKUP: &str = r#"static inline Definition *find_definition(const char *namespace_, const char *name)
{
    if (!state)
        return NULL;
    for (int i = 0; i < arrlen(state->definitions); i++)
    {
        Definition *def = state->definitions[i];
        if (strcmp(def->namespace_, namespace_) == 0 && strcmp(def->name, name) == 0)
            return def;
    }
    return NULL;
}

static inline Definition *ensure_definition(Definition **cache, const char *namespace_, const char *name)
{
    if (*cache)
        return *cache;
    Definition *def = find_definition(namespace_, name);
    if (!def)
    {
        printf("Missing definition %s %s\n", namespace_, name);
        abort();
    }
    *cache = def;
    return def;
}"#;

/// The aggregate header: runtime, types, definition accessors for every
/// known class, then each module header in order.
pub fn all_header(registry: &ClassRegistry, types_header: &str, module_headers: &[&str]) -> String {
    let mut out = CEmitter::new();
    out.line("#pragma once");
    out.line("#define FUNCTION_VAR_EXT");
    out.line("#include <setjmp.h>");
    out.line("#include <string.h>");
    out.line("#include \"runtime.h\"");
    out.line(format!("#include \"{types_header}\""));
    out.line("extern RuntimeState *state;");
    for (_, class) in registry.classes() {
        out.line(format!("extern Definition *def_{};", class.c_name()));
    }
    for (_, class) in registry.classes() {
        out.line(format!("Definition *get_{}(void);", class.c_name()));
    }
    out.blank();
    for line in DEFINITION_LOOKUP.lines() {
        out.line(line);
    }
    for header in module_headers.iter().filter(|h| !h.trim().is_empty()) {
        out.blank();
        for line in header.lines() {
            out.line(line);
        }
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dim_core::Class;

    #[test]
    fn accessors_for_every_class_then_modules() {
        let mut registry = ClassRegistry::new();
        registry.register_class(Class::new("STD", "Any", 1)).unwrap();
        registry.register_class(Class::new("Geo", "Circle", 1)).unwrap();
        let header = all_header(&registry, "geo_types.h", &["#pragma once\nint a;", ""]);

        assert!(header.starts_with("#pragma once\n#define FUNCTION_VAR_EXT\n"));
        assert!(header.contains("#include \"geo_types.h\"\nextern RuntimeState *state;\n"));
        assert!(header.contains(
            "extern Definition *def_STD_Any;\nextern Definition *def_Geo_Circle;\nDefinition *get_STD_Any(void);\n"
        ));
        assert!(header.contains("        printf(\"Missing definition %s %s\\n\", namespace_, name);\n"));
        assert!(header.ends_with("}\n\n#pragma once\nint a;\n"));
    }
}
